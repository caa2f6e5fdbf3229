//! Falling-block stage
//!
//! Discrete collision against the board, piece commit, line clearing and the
//! block-stage meaning of attacks. Collision always looks one row below the
//! piece: a `true` result means "cannot fall further", not "overlapping".

use log::{debug, warn};
use rand::Rng;

use super::board::Cell;
use super::events::{GameEvent, Notice};
use super::piece::{PieceKind, Rotation};
use super::stage::{self, Stage};
use super::state::{ActivePiece, MatchState};
use super::tick::RepeatAction;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::net::message::{GarbageRow, coord_byte};
use crate::net::Message;
use crate::row_of;
use crate::sim::board::Board;

/// Would `kind` at `rotation`, origin `(col, fine)`, be blocked from falling?
pub fn test_collision_at(
    board: &Board,
    kind: PieceKind,
    rotation: Rotation,
    col: i32,
    fine: f32,
) -> bool {
    // Past the floor
    if (kind.bottom_extent(rotation) + 1) as f32 * CELL + fine > BOARD_DEPTH {
        return true;
    }

    let (min_col, max_col) = kind.column_range(rotation);
    if col < min_col || col > max_col {
        return true;
    }

    kind.cells(rotation).iter().any(|&(dx, dy)| {
        let below = row_of(fine + dy as f32 * CELL) + 1;
        if below < 0 {
            return false;
        }
        below >= BOARD_HEIGHT as i32 || board.is_occupied(col + dx, below)
    })
}

pub fn test_collision(state: &MatchState) -> bool {
    let p = &state.piece;
    test_collision_at(&state.board, p.kind, p.rotation, p.col, p.fine)
}

/// Is a stuck piece still inside the spawn zone?
pub fn test_game_over(state: &MatchState) -> bool {
    let start_row = ((state.piece.fine - SPAWN_FINE) / CELL) as i32;
    start_row < state.piece.kind.spawn_clearance(state.piece.rotation)
}

/// Write the current piece's cells with origin `(col, row)`
pub fn place_piece(state: &mut MatchState, col: i32, row: i32) {
    let kind = state.piece.kind;
    for &(dx, dy) in kind.cells(state.piece.rotation) {
        if !state.board.set(col + dx, row + dy, Cell::Filled(kind as u8)) {
            warn!("Piece cell ({}, {}) outside board", col + dx, row + dy);
        }
    }
}

/// Mirror update describing the current piece
pub fn piece_message(state: &MatchState) -> Message {
    Message::UpdatePiece {
        col: coord_byte(state.piece.col),
        rotation: state.piece.rotation,
        kind: state.piece.kind,
    }
}

/// Commit the falling piece, clear lines, and move on
pub fn add_piece(state: &mut MatchState, events: &mut Vec<GameEvent>) {
    let col = state.piece.col;
    let row = row_of(state.piece.fine);
    place_piece(state, col, row);

    events.push(GameEvent::Send(piece_message(state)));
    events.push(GameEvent::Send(Message::AddPiece {
        col: coord_byte(col),
        row: coord_byte(row),
    }));

    let lines = clear_lines(state, events);
    state.stage_lines += lines;
    state.total_lines += lines;

    get_new_piece(state, events);

    if lines > 1 {
        events.push(GameEvent::Attack((lines - 1).min(3) as u8));
    }

    if state.stage_lines >= state.tuning.lines_to_transition {
        state.stage_lines = 0;
        events.push(GameEvent::Notice(Notice::Transition));
        events.push(GameEvent::Sound(SoundEffect::ChangeView));
        stage::change_state(state, Stage::TetrisTrans, events);
    }
}

/// Remove every complete row. Returns the number removed.
pub fn clear_lines(state: &mut MatchState, events: &mut Vec<GameEvent>) -> u32 {
    let mut lines = 0;
    for row in 0..BOARD_HEIGHT {
        if !state.board.is_row_complete(row) {
            continue;
        }
        lines += 1;
        state.score += LINE_SCORE * lines as u64;
        events.push(GameEvent::Send(Message::AppendScore {
            base: SCORE_BASE,
            multiplier: lines as u8,
        }));
        drop_line(state, row, events);
        events.push(GameEvent::Sound(SoundEffect::Tink));
    }
    if lines > 0 {
        debug!("Cleared {lines} line(s), score {}", state.score);
    }
    lines
}

pub fn drop_line(state: &mut MatchState, row: usize, events: &mut Vec<GameEvent>) {
    state.board.drop_line(row);
    if state.is_local() {
        events.push(GameEvent::Send(Message::DropLine { row: row as u8 }));
    }
}

pub fn get_new_piece(state: &mut MatchState, events: &mut Vec<GameEvent>) {
    let kind = PieceKind::random(state.rng());
    state.piece = ActivePiece::spawn(kind);
    events.push(GameEvent::Send(piece_message(state)));
    events.push(GameEvent::Send(Message::UpdatePieceY {
        fine: state.piece.fine,
    }));
}

/// Where a hard drop would land the current piece
pub fn drop_position(state: &MatchState) -> f32 {
    let p = &state.piece;
    let mut fine = p.fine;
    while !test_collision_at(&state.board, p.kind, p.rotation, p.col, fine) {
        fine += DROP_PROBE_STEP;
    }
    fine - fine % CELL
}

pub fn hard_drop(state: &mut MatchState, events: &mut Vec<GameEvent>) {
    state.piece.fine = drop_position(state);
    events.push(GameEvent::Send(piece_message(state)));
    events.push(GameEvent::Send(Message::UpdatePieceY {
        fine: state.piece.fine,
    }));
    add_piece(state, events);
}

/// Rotate or shift the piece; blocked moves are reverted silently
pub fn key_repeat(state: &mut MatchState, action: RepeatAction, events: &mut Vec<GameEvent>) {
    let before = state.piece;
    match action {
        RepeatAction::Rotate => state.piece.rotation = state.piece.rotation.next(),
        RepeatAction::Left => state.piece.col -= 1,
        RepeatAction::Right => state.piece.col += 1,
    }
    if test_collision(state) {
        state.piece = before;
    }
    events.push(GameEvent::Send(piece_message(state)));
}

/// Advance the severity-3 board spin
pub fn update_spin(state: &mut MatchState, dt: f32, events: &mut Vec<GameEvent>) {
    if !state.spinning {
        return;
    }
    state.spin_angle += state.tuning.spin_speed * dt;
    if state.spin_angle >= SPIN_DEGREES {
        state.spinning = false;
        state.spin_angle = 0.0;
        state.score += SPIN_SURVIVED_SCORE;
        events.push(GameEvent::Send(Message::AppendScore {
            base: SCORE_BASE,
            multiplier: SPIN_SCORE_MULT,
        }));
    }
    events.push(GameEvent::Send(Message::RotBoard {
        degrees: state.spin_angle,
    }));
}

/// Per-frame update for the block-driven stages
pub fn update(state: &mut MatchState, dt: f32, soft_drop: bool, events: &mut Vec<GameEvent>) {
    match state.stage {
        Stage::GameOver => {
            state.gameover_spread += GAMEOVER_SPREAD_SPEED * dt;
            return;
        }
        Stage::TetrisTrans => {
            // Spin holds still until the flip is over
            state.flip_angle =
                (state.flip_angle + state.tuning.transition_speed * dt).min(FLIP_DEGREES);
            events.push(GameEvent::Send(Message::RotBoard2 {
                degrees: state.flip_angle,
            }));
            if state.flip_angle >= FLIP_DEGREES {
                stage::change_state(state, Stage::Breakout, events);
            }
            return;
        }
        Stage::Tetris => {}
        Stage::Breakout | Stage::BreakoutTrans => return,
    }

    update_spin(state, dt, events);

    state.piece.fine += dt * state.fall_speed(soft_drop);
    if test_collision(state) {
        if test_game_over(state) {
            stage::game_over(state, events);
            return;
        }
        add_piece(state, events);
    }
    events.push(GameEvent::Send(Message::UpdatePieceY {
        fine: state.piece.fine,
    }));
}

/// Fill `row` with random garbage that has at least one hole
fn fill_garbage_row(state: &mut MatchState, row: i32) {
    let mut has_hole = false;
    for col in 0..BOARD_WIDTH as i32 {
        let color: u8 = state.rng().random_range(0..7);
        let cell = if color == 6 {
            has_hole = true;
            Cell::Empty
        } else {
            Cell::Filled(color)
        };
        state.board.set(col, row, cell);
    }
    if !has_hole {
        let col = state.rng().random_range(0..BOARD_WIDTH as i32);
        state.board.set(col, row, Cell::Empty);
    }
}

/// Shift the board up by `rows` (1 or 2) garbage rows and announce them
fn push_garbage(state: &mut MatchState, rows: usize, events: &mut Vec<GameEvent>) -> bool {
    let overflow = (0..rows).any(|row| !state.board.is_row_empty(row));

    state.board.push_up(rows);
    events.push(GameEvent::Send(Message::PushUp { lines: rows as u8 }));

    for garbage in [GarbageRow::Bottom, GarbageRow::Second].into_iter().take(rows) {
        fill_garbage_row(state, garbage.board_row());
        for msg in Message::garbage_row(garbage, &state.board) {
            events.push(GameEvent::Send(msg));
        }
    }
    !overflow
}

/// Block-stage attack: 1 and 2 push garbage rows, 3 spins the board
pub fn attack(state: &mut MatchState, severity: u8, events: &mut Vec<GameEvent>) {
    debug!("Block attack severity {severity}");
    events.push(GameEvent::Sound(SoundEffect::AddLine));

    let survived = match severity {
        1 => push_garbage(state, 1, events),
        2 => push_garbage(state, 2, events),
        3 => {
            state.spinning = true;
            state.spin_angle = 0.0;
            true
        }
        _ => {
            warn!("Ignoring attack with severity {severity}");
            true
        }
    };

    if !survived {
        stage::game_over(state, events);
    }
}
