//! Side effects produced by the simulation
//!
//! Stage code never talks to the network, speakers or HUD directly; it pushes
//! [`GameEvent`]s and the engine routes them after the step.

use crate::audio::SoundEffect;
use crate::net::Message;

/// On-screen notices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Attack,
    Transition,
    Super,
    Tetris,
    YouLose,
    YouWin,
    YouSurvived,
}

impl Notice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Notice::Attack => "ATTACK",
            Notice::Transition => "TRANSITION",
            Notice::Super => "SUPER",
            Notice::Tetris => "TETRIS",
            Notice::YouLose => "YOU LOSE",
            Notice::YouWin => "YOU WIN",
            Notice::YouSurvived => "YOU SURVIVED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Mirror update for the peer
    Send(Message),
    /// Attack the opponent with the given severity (1..=3)
    Attack(u8),
    Sound(SoundEffect),
    Notice(Notice),
    /// The local player just lost
    Lost,
}

/// Collected events for one step
pub type Events = Vec<GameEvent>;

#[cfg(test)]
pub(crate) fn sent(events: &[GameEvent]) -> Vec<Message> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Send(m) => Some(*m),
            _ => None,
        })
        .collect()
}
