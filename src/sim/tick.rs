//! Fixed timestep simulation tick
//!
//! Turns held keys into repeat actions and runs the active stage's update.

use super::events::GameEvent;
use super::stage::{Stage, StageKind};
use super::state::MatchState;
use super::{breakout, tetris};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub rotate: bool,
    /// Held: fall faster
    pub soft_drop: bool,
    /// Pressed this frame
    pub hard_drop: bool,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

impl TickInput {
    /// Any key held or pressed this frame
    pub fn any_pressed(&self) -> bool {
        self.left || self.right || self.rotate || self.soft_drop || self.hard_drop
    }
}

/// A discrete move produced by key repeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatAction {
    Rotate,
    Left,
    Right,
}

/// Fires once on press, then every `interval` after the initial `delay`.
/// Rotate wins over left, left over right.
#[derive(Debug, Clone)]
pub struct KeyRepeat {
    delay: f32,
    interval: f32,
    held: Option<RepeatAction>,
    timer: f32,
}

impl KeyRepeat {
    pub fn new(delay: f32, interval: f32) -> Self {
        Self {
            delay,
            interval: interval.max(SIM_DT),
            held: None,
            timer: 0.0,
        }
    }

    pub fn update(&mut self, input: &TickInput, dt: f32) -> Option<RepeatAction> {
        let pressed = if input.rotate {
            Some(RepeatAction::Rotate)
        } else if input.left {
            Some(RepeatAction::Left)
        } else if input.right {
            Some(RepeatAction::Right)
        } else {
            None
        };

        match pressed {
            None => {
                self.held = None;
                None
            }
            Some(action) if self.held != Some(action) => {
                self.held = Some(action);
                self.timer = self.delay;
                Some(action)
            }
            Some(action) => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.timer += self.interval;
                    Some(action)
                } else {
                    None
                }
            }
        }
    }
}

/// Column the autopilot aims for: the one where the piece would land deepest
fn autopilot_column(state: &MatchState) -> i32 {
    let p = &state.piece;
    let (lo, hi) = p.kind.column_range(p.rotation);
    let mut best = (p.col, f32::MIN);
    for col in lo..=hi {
        let mut fine = p.fine;
        while !tetris::test_collision_at(&state.board, p.kind, p.rotation, col, fine) {
            fine += DROP_PROBE_STEP;
        }
        if fine > best.1 {
            best = (col, fine);
        }
    }
    best.0
}

fn autopilot(state: &MatchState, input: &TickInput) -> TickInput {
    let mut input = TickInput {
        idle_mode: true,
        ..input.clone()
    };
    match state.stage {
        Stage::Tetris => {
            let target = autopilot_column(state);
            input.left = state.piece.col > target;
            input.right = state.piece.col < target;
            input.soft_drop = state.piece.col == target;
        }
        Stage::Breakout => {
            // Track the ball with a small dead zone
            let offset = state.ball.pos.x - state.paddle_x;
            input.left = offset < -CELL_HALF;
            input.right = offset > CELL_HALF;
        }
        _ => {}
    }
    input
}

/// Advance the local player by one fixed timestep
pub fn tick(
    state: &mut MatchState,
    input: &TickInput,
    repeat: &mut KeyRepeat,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let input = if input.idle_mode {
        autopilot(state, input)
    } else {
        input.clone()
    };

    if let Some(action) = repeat.update(&input, dt) {
        match state.stage {
            Stage::Tetris => tetris::key_repeat(state, action, events),
            Stage::Breakout => breakout::key_repeat(state, action, events),
            _ => {}
        }
    }

    if input.hard_drop && state.stage == Stage::Tetris {
        tetris::hard_drop(state, events);
    }

    match state.stage.kind() {
        StageKind::Block => tetris::update(state, dt, input.soft_drop, events),
        StageKind::Paddle => breakout::update(state, dt, &input, events),
    }

    state.decay_notice(dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::board::Cell;
    use crate::sim::piece::PieceKind;
    use crate::sim::state::ActivePiece;

    fn held(left: bool, right: bool, rotate: bool) -> TickInput {
        TickInput {
            left,
            right,
            rotate,
            ..Default::default()
        }
    }

    #[test]
    fn test_key_repeat_timing() {
        let mut repeat = KeyRepeat::new(0.35, 0.05);
        let left = held(true, false, false);

        assert_eq!(repeat.update(&left, 0.01), Some(RepeatAction::Left));
        // Still inside the initial delay
        for _ in 0..30 {
            assert_eq!(repeat.update(&left, 0.01), None);
        }
        let mut fired = 0;
        for _ in 0..20 {
            if repeat.update(&left, 0.01).is_some() {
                fired += 1;
            }
        }
        // 0.2s past the delay at one repeat every 0.05s
        assert!((3..=5).contains(&fired), "fired {fired}");
    }

    #[test]
    fn test_key_repeat_release_and_priority() {
        let mut repeat = KeyRepeat::new(0.35, 0.05);
        assert_eq!(
            repeat.update(&held(true, true, true), 0.01),
            Some(RepeatAction::Rotate)
        );
        assert_eq!(repeat.update(&held(true, true, true), 0.01), None);

        // Switching keys fires immediately
        assert_eq!(
            repeat.update(&held(false, true, false), 0.01),
            Some(RepeatAction::Right)
        );
        assert_eq!(repeat.update(&TickInput::default(), 0.01), None);
        assert_eq!(
            repeat.update(&held(false, true, false), 0.01),
            Some(RepeatAction::Right)
        );
    }

    #[test]
    fn test_tick_moves_piece() {
        let mut state = MatchState::local(Tuning::default(), 5);
        state.piece = ActivePiece::spawn(PieceKind::O);
        let mut repeat = KeyRepeat::new(0.35, 0.05);
        let mut events = Vec::new();

        tick(&mut state, &held(true, false, false), &mut repeat, SIM_DT, &mut events);
        assert_eq!(state.piece.col, SPAWN_COL - 1);
        assert!(state.piece.fine > SPAWN_FINE);
    }

    #[test]
    fn test_hard_drop_only_in_block_stage() {
        let mut state = MatchState::local(Tuning::default(), 5);
        let mut repeat = KeyRepeat::new(0.35, 0.05);
        let mut events = Vec::new();
        let drop = TickInput {
            hard_drop: true,
            ..Default::default()
        };

        tick(&mut state, &drop, &mut repeat, SIM_DT, &mut events);
        assert_eq!(state.board.occupied_count(), 4);

        let mut state = MatchState::local(Tuning::default(), 5);
        state.stage = Stage::Breakout;
        crate::sim::stage::init_state(&mut state);
        tick(&mut state, &drop, &mut repeat, SIM_DT, &mut events);
        assert_eq!(state.board.occupied_count(), 0);
    }

    #[test]
    fn test_paddle_stage_moves_ball() {
        let mut state = MatchState::local(Tuning::default(), 5);
        state.stage = Stage::Breakout;
        crate::sim::stage::init_state(&mut state);
        let start = state.ball.pos;
        let mut repeat = KeyRepeat::new(0.35, 0.05);
        let mut events = Vec::new();

        tick(&mut state, &TickInput::default(), &mut repeat, SIM_DT, &mut events);
        assert_ne!(state.ball.pos, start);
        assert_eq!(state.piece.fine, SPAWN_FINE);
    }

    #[test]
    fn test_determinism() {
        let mut a = MatchState::local(Tuning::default(), 99999);
        let mut b = MatchState::local(Tuning::default(), 99999);
        let mut ra = KeyRepeat::new(0.35, 0.05);
        let mut rb = KeyRepeat::new(0.35, 0.05);
        let mut events = Vec::new();
        let idle = TickInput {
            idle_mode: true,
            ..Default::default()
        };

        for _ in 0..3000 {
            tick(&mut a, &idle, &mut ra, SIM_DT, &mut events);
            tick(&mut b, &idle, &mut rb, SIM_DT, &mut events);
        }
        assert_eq!(a.board, b.board);
        assert_eq!(a.score, b.score);
        assert_eq!(a.stage, b.stage);
    }

    #[test]
    fn test_autopilot_fills_the_low_side() {
        let mut state = MatchState::local(Tuning::default(), 5);
        state.piece = ActivePiece::spawn(PieceKind::O);
        for col in 2..10 {
            for row in 16..24 {
                state.board.set(col, row, Cell::Filled(1));
            }
        }
        assert_eq!(autopilot_column(&state), 0);
    }

    #[test]
    fn test_autopilot_tracks_ball() {
        let mut state = MatchState::local(Tuning::default(), 5);
        state.stage = Stage::Breakout;
        crate::sim::stage::init_state(&mut state);
        state.ball.pos.x = 4.0;
        let input = autopilot(&state, &TickInput::default());
        assert!(input.right && !input.left);
    }
}
