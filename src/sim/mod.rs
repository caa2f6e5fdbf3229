//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (column-major over the board)
//! - No rendering, network or platform dependencies; side effects leave as
//!   [`GameEvent`]s

pub mod board;
pub mod breakout;
pub mod collision;
pub mod events;
pub mod piece;
pub mod stage;
pub mod state;
pub mod tetris;
pub mod tick;

pub use board::{Board, Cell};
pub use collision::{CollisionResult, EdgeMask, Segment, Target};
pub use events::{Events, GameEvent, Notice};
pub use piece::{PieceKind, Rotation};
pub use stage::{Stage, StageKind};
pub use state::{ActivePiece, Ball, MatchState, Side};
pub use tick::{KeyRepeat, RepeatAction, TickInput, tick};
