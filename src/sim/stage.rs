//! Per-player stage state machine
//!
//! ```text
//! Tetris --lines--> TetrisTrans --flip 180--> Breakout
//!   ^                                            |
//!   +--flip 0-- BreakoutTrans <-----timer--------+
//! Tetris --stuck at spawn / push-up overflow--> GameOver
//! ```
//!
//! Only the local side emits CHANGE_STATE and runs stage initialisation; the
//! mirror follows along from messages.

use log::info;

use super::events::{GameEvent, Notice};
use super::state::MatchState;
use super::{breakout, tetris};
use crate::net::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tetris,
    TetrisTrans,
    Breakout,
    BreakoutTrans,
    GameOver,
}

/// Which game's logic drives a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Block,
    Paddle,
}

impl Stage {
    pub fn kind(self) -> StageKind {
        match self {
            Stage::Tetris | Stage::TetrisTrans | Stage::GameOver => StageKind::Block,
            Stage::Breakout | Stage::BreakoutTrans => StageKind::Paddle,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Stage::Tetris => 0,
            Stage::TetrisTrans => 1,
            Stage::Breakout => 2,
            Stage::BreakoutTrans => 3,
            Stage::GameOver => 4,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Stage::Tetris),
            1 => Some(Stage::TetrisTrans),
            2 => Some(Stage::Breakout),
            3 => Some(Stage::BreakoutTrans),
            4 => Some(Stage::GameOver),
            _ => None,
        }
    }
}

/// Move to `stage`. The local side announces it and initialises the stage.
pub fn change_state(state: &mut MatchState, stage: Stage, events: &mut Vec<GameEvent>) {
    if state.is_local() {
        info!("{:?} -> {:?}", state.stage, stage);
        events.push(GameEvent::Send(Message::ChangeState { stage }));
    }
    state.stage = stage;
    if state.is_local() {
        init_state(state);
    }
}

/// Stage entry setup
pub fn init_state(state: &mut MatchState) {
    if state.stage == Stage::Breakout {
        breakout::init_game(state);
    }
}

/// The local player lost
pub fn game_over(state: &mut MatchState, events: &mut Vec<GameEvent>) {
    info!("Game over with score {}", state.score);
    state.stage = Stage::GameOver;
    state.spinning = false;
    events.push(GameEvent::Notice(Notice::YouLose));
    events.push(GameEvent::Send(Message::GameOver));
    events.push(GameEvent::Lost);
}

/// Apply an incoming attack to whichever game the player is in
pub fn perform_attack(state: &mut MatchState, severity: u8, events: &mut Vec<GameEvent>) {
    if state.stage == Stage::GameOver {
        return;
    }
    events.push(GameEvent::Notice(Notice::Attack));
    match state.stage.kind() {
        StageKind::Block => tetris::attack(state, severity, events),
        StageKind::Paddle => breakout::attack(state, severity, events),
    }
}
