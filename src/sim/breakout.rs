//! Paddle-and-ball stage
//!
//! The falling-block board, flipped, becomes the brick wall. The current piece
//! becomes the paddle. Ball motion is swept continuously: each pass finds the
//! earliest edge hit, advances to it, resolves it and recurses on the time left.

use glam::Vec2;
use log::{debug, warn};

use super::collision::{
    CollisionResult, EdgeMask, Segment, Target, check_ball_against, check_ball_against_block,
};
use super::events::{GameEvent, Notice};
use super::piece::PieceKind;
use super::piece::Rotation;
use super::stage::{self, Stage};
use super::state::{ActivePiece, Ball, MatchState};
use super::tetris;
use super::tick::{RepeatAction, TickInput};
use crate::audio::SoundEffect;
use crate::cell_center;
use crate::consts::*;
use crate::net::Message;
use crate::sim::board::Cell;

/// Result of a single sweep pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallStep {
    /// Time the ball actually travelled
    pub consumed: f32,
    /// What stopped it, if anything
    pub hit: Option<CollisionResult>,
}

/// Horizontal range the paddle origin may occupy with its current shape
pub fn paddle_bounds(piece: &ActivePiece) -> (f32, f32) {
    let (lo, hi) = piece.kind.column_range(piece.rotation);
    (lo as f32 * CELL, hi as f32 * CELL)
}

/// Paddle cell centres before the paddle lift is applied
pub fn paddle_cells(state: &MatchState) -> [Vec2; 4] {
    let cells = state.piece.kind.cells(state.piece.rotation);
    cells.map(|(dx, dy)| Vec2::new(state.paddle_x + dx as f32 * CELL, dy as f32 * CELL))
}

fn serve_ball(state: &mut MatchState) {
    state.ball = Ball {
        pos: Vec2::new(state.paddle_x, BALL_SPAWN_Y),
        vel: state.ball_speed(),
    };
}

/// Keep the direction, replace the per-axis speed
fn set_ball_speed(state: &mut MatchState, speed: Vec2) {
    state.ball.vel = speed * state.ball.vel.signum();
}

fn in_field(pos: Vec2) -> bool {
    pos.is_finite()
        && (FIELD_LEFT - 1.0..=FIELD_RIGHT + 1.0).contains(&pos.x)
        && (MISS_LINE_Y - 1.0..=FIELD_TOP + 1.0).contains(&pos.y)
}

/// Paddle stage entry
pub fn init_game(state: &mut MatchState) {
    let (lo, hi) = paddle_bounds(&state.piece);
    state.paddle_x = PADDLE_START_X.clamp(lo, hi);
    serve_ball(state);
    state.fast_ball_timer = 0.0;
    state.survive_timer = state.tuning.survive_seconds;
    state.consecutive_hits = 0;
}

/// Earliest thing the ball would hit within `t`. Walls first, then board
/// cells column by column, then paddle cells.
pub fn earliest_collision(state: &MatchState, t: f32, last: EdgeMask) -> CollisionResult {
    let ball = &state.ball;
    let vel = ball.vel;
    let (x0, x1) = WALL_SPAN_X;
    let (y0, y1) = WALL_SPAN_Y;
    let walls = [
        (EdgeMask::WALL_TOP, vel.y > 0.0, Segment::horizontal(FIELD_TOP, x0, x1)),
        (EdgeMask::WALL_RIGHT, vel.x > 0.0, Segment::vertical(FIELD_RIGHT, y0, y1)),
        (EdgeMask::WALL_LEFT, vel.x < 0.0, Segment::vertical(FIELD_LEFT, y0, y1)),
        (EdgeMask::WALL_BOTTOM, vel.y < 0.0, Segment::horizontal(MISS_LINE_Y, x0, x1)),
    ];

    let mut best = CollisionResult::miss();
    for (bit, approaching, segment) in walls {
        if !approaching || last.intersects(bit) {
            continue;
        }
        let time = check_ball_against(ball, t, &segment);
        if time < t {
            best = best.merge(CollisionResult {
                time,
                mask: bit,
                block: None,
            });
        }
    }

    for (col, row) in state.board.occupied() {
        let target = Target::Block { col, row };
        best = best.merge(check_ball_against_block(
            ball,
            t,
            last,
            cell_center(col, row),
            target,
        ));
    }

    for center in paddle_cells(state) {
        best = best.merge(check_ball_against_block(ball, t, last, center, Target::Paddle));
    }

    best
}

fn resolve_hit(state: &mut MatchState, hit: &CollisionResult, events: &mut Vec<GameEvent>) {
    events.push(GameEvent::Sound(SoundEffect::Bounce));
    let mask = hit.mask;

    if mask.intersects(EdgeMask::BLOCKS | EdgeMask::PADDLE) {
        state.consecutive_hits += 1;
    }
    if mask.intersects(EdgeMask::X_FACING) {
        state.ball.vel.x = -state.ball.vel.x;
    }
    if mask.intersects(EdgeMask::Y_FACING) {
        state.ball.vel.y = -state.ball.vel.y;
    }

    if let (true, Some((col, row))) = (mask.intersects(EdgeMask::BLOCKS), hit.block) {
        state.board.set(col, row, Cell::Empty);
        state.score += BLOCK_SCORE;
        events.push(GameEvent::Send(Message::RemoveBlock {
            col: col as u8,
            row: row as u8,
        }));
        events.push(GameEvent::Send(Message::AppendScore {
            base: SCORE_BASE,
            multiplier: BLOCK_SCORE_MULT,
        }));
    }

    if mask.intersects(EdgeMask::PADDLE) {
        let severity = match state.consecutive_hits {
            7.. => 3,
            5 | 6 => 2,
            4 => 1,
            _ => 0,
        };
        if severity > 0 {
            debug!("{} hits in a row, attacking", state.consecutive_hits);
            events.push(GameEvent::Attack(severity));
            state.consecutive_hits = 0;
        }
    }

    if mask.contains(EdgeMask::WALL_BOTTOM) {
        debug!("Missed the ball");
        state.consecutive_hits = 0;
        tetris::attack(state, 1, events);
    }
}

/// One sweep pass: advance to the earliest hit within `t` and resolve it, or
/// travel the whole of `t` if nothing is in the way.
pub fn step_ball(
    state: &mut MatchState,
    t: f32,
    last: EdgeMask,
    events: &mut Vec<GameEvent>,
) -> BallStep {
    if t <= 0.0 {
        return BallStep {
            consumed: 0.0,
            hit: None,
        };
    }

    let hit = earliest_collision(state, t, last);
    if !hit.is_hit() {
        state.ball.pos += state.ball.vel * t;
        return BallStep {
            consumed: t,
            hit: None,
        };
    }

    state.ball.pos += state.ball.vel * hit.time;
    resolve_hit(state, &hit, events);
    BallStep {
        consumed: hit.time,
        hit: Some(hit),
    }
}

/// Move the ball for `t` seconds, bouncing as needed. Returns the number of
/// sweep passes used.
pub fn move_ball(
    state: &mut MatchState,
    t: f32,
    last: EdgeMask,
    events: &mut Vec<GameEvent>,
) -> u32 {
    sweep(state, t, last, events, 0)
}

fn sweep(
    state: &mut MatchState,
    t: f32,
    last: EdgeMask,
    events: &mut Vec<GameEvent>,
    depth: u32,
) -> u32 {
    if t <= 0.0 {
        return depth;
    }
    if depth >= MAX_BOUNCES_PER_STEP {
        warn!("Ball sweep stopped after {depth} bounces with {t}s left");
        return depth;
    }
    let step = step_ball(state, t, last, events);
    match step.hit {
        Some(hit) => sweep(state, t - step.consumed, hit.mask, events, depth + 1),
        None => depth + 1,
    }
}

/// Rotate the paddle; reverted if the paddle would leave its new bounds
pub fn key_repeat(state: &mut MatchState, action: RepeatAction, events: &mut Vec<GameEvent>) {
    if action != RepeatAction::Rotate {
        return;
    }
    let before = state.piece.rotation;
    state.piece.rotation = state.piece.rotation.next();
    let (lo, hi) = paddle_bounds(&state.piece);
    if !(lo..=hi).contains(&state.paddle_x) {
        state.piece.rotation = before;
    }
    events.push(GameEvent::Send(tetris::piece_message(state)));
}

/// Per-frame update for the paddle-driven stages
pub fn update(state: &mut MatchState, dt: f32, input: &TickInput, events: &mut Vec<GameEvent>) {
    match state.stage {
        Stage::BreakoutTrans => {
            state.flip_angle = (state.flip_angle - state.tuning.transition_speed * dt).max(0.0);
            events.push(GameEvent::Send(Message::RotBoard2 {
                degrees: state.flip_angle,
            }));
            if state.flip_angle <= 0.0 {
                stage::change_state(state, Stage::Tetris, events);
            }
            return;
        }
        Stage::Breakout => {}
        _ => return,
    }

    tetris::update_spin(state, dt, events);

    let dir = match (input.left, input.right) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    };
    if dir != 0.0 {
        let (lo, hi) = paddle_bounds(&state.piece);
        let x = (state.paddle_x + dir * state.tuning.paddle_speed * dt).clamp(lo, hi);
        if x != state.paddle_x {
            state.paddle_x = x;
            events.push(GameEvent::Send(Message::UpdatePaddle { x }));
        }
    }

    state.survive_timer -= dt;
    if state.survive_timer <= 0.0 {
        state.survive_timer = 0.0;
        events.push(GameEvent::Notice(Notice::YouSurvived));
        events.push(GameEvent::Sound(SoundEffect::ChangeView));
        stage::change_state(state, Stage::BreakoutTrans, events);
        state.piece.col = (state.paddle_x / CELL) as i32;
        state.piece.fine = 0.0;
        events.push(GameEvent::Send(tetris::piece_message(state)));
        return;
    }

    if state.fast_ball_timer > 0.0 {
        state.fast_ball_timer -= dt;
        if state.fast_ball_timer <= 0.0 {
            state.fast_ball_timer = 0.0;
            let speed = state.ball_speed();
            set_ball_speed(state, speed);
        }
    }

    move_ball(state, dt, EdgeMask::EMPTY, events);
    if !in_field(state.ball.pos) {
        warn!("Ball escaped the field at {:?}, serving again", state.ball.pos);
        serve_ball(state);
    }
    events.push(GameEvent::Send(Message::UpdateBall {
        x: state.ball.pos.x,
        y: state.ball.pos.y,
    }));
}

/// Paddle-stage attack: 1 swaps the paddle shape, 2 pushes a garbage row,
/// 3 speeds the ball up for a while
pub fn attack(state: &mut MatchState, severity: u8, events: &mut Vec<GameEvent>) {
    debug!("Paddle attack severity {severity}");
    match severity {
        1 => {
            state.piece.kind = PieceKind::random(state.rng());
            state.piece.rotation = Rotation::SPAWN;
            let (lo, hi) = paddle_bounds(&state.piece);
            state.paddle_x = state.paddle_x.clamp(lo, hi);
            events.push(GameEvent::Send(tetris::piece_message(state)));
            events.push(GameEvent::Send(Message::UpdatePaddle {
                x: state.paddle_x,
            }));
        }
        2 => tetris::attack(state, 1, events),
        3 => {
            state.fast_ball_timer = FAST_BALL_SECONDS;
            let speed = state.fast_ball_speed();
            set_ball_speed(state, speed);
        }
        _ => warn!("Ignoring attack with severity {severity}"),
    }
}
