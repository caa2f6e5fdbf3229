//! Brickfall - a two-mode arcade duel
//!
//! Core modules:
//! - `sim`: Simulation (board, pieces, ball sweep, stage state machine)
//! - `net`: 4-byte wire protocol, transports and mirror sync
//! - `engine`: Per-frame sequencing, event routing, attacks between players
//! - `renderer`: Renderer interface and a text renderer
//! - `audio`: Sound effect ids and playback interface
//! - `settings`: Tunables loaded from JSON

pub mod audio;
pub mod engine;
pub mod net;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use engine::Engine;
pub use settings::{Settings, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed to the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Board dimensions in cells
    pub const BOARD_WIDTH: usize = 10;
    pub const BOARD_HEIGHT: usize = 24;
    /// Side of one cell in world units
    pub const CELL: f32 = 0.5;
    /// Depth of the board in world units (pieces may not pass it)
    pub const BOARD_DEPTH: f32 = BOARD_HEIGHT as f32 * CELL;

    /// Spawn position of a new piece
    pub const SPAWN_COL: i32 = 5;
    pub const SPAWN_FINE: f32 = 1.0;
    /// Hard drop probe step
    pub const DROP_PROBE_STEP: f32 = 0.25;

    /// Ball radius bias applied along the travel axis
    pub const BALL_RADIUS: f32 = 0.125;
    /// Half the side of a cell's collision box
    pub const CELL_HALF: f32 = CELL / 2.0;

    /// Paddle field walls
    pub const FIELD_LEFT: f32 = -0.25;
    pub const FIELD_RIGHT: f32 = 4.75;
    pub const FIELD_TOP: f32 = 11.75;
    /// Bottom boundary; crossing it is a miss
    pub const MISS_LINE_Y: f32 = -1.5;
    /// Extent of the wall segments along their own axis
    pub const WALL_SPAN_X: (f32, f32) = (-5.0, 10.0);
    pub const WALL_SPAN_Y: (f32, f32) = (-5.0, 20.0);

    /// Height of the paddle's reference row above the board origin
    pub const PADDLE_LIFT: f32 = 1.0;
    pub const PADDLE_START_X: f32 = 2.5;
    pub const BALL_SPAWN_Y: f32 = 3.0;
    /// Per-level increase of ball speed on both axes
    pub const BALL_LEVEL_SPEEDUP: f32 = 0.2;
    /// Per-level increase of fall speed
    pub const FALL_LEVEL_SPEEDUP: f32 = 0.3;
    /// Duration of the fast-ball attack (seconds)
    pub const FAST_BALL_SECONDS: f32 = 7.0;
    /// Recursion cap for one ball sweep
    pub const MAX_BOUNCES_PER_STEP: u32 = 64;

    /// Board flip angle at the end of a transition (degrees)
    pub const FLIP_DEGREES: f32 = 180.0;
    /// Full spin of the attack rotation (degrees)
    pub const SPIN_DEGREES: f32 = 360.0;
    /// Rate the game-over spread animation grows at
    pub const GAMEOVER_SPREAD_SPEED: f32 = 3.0;
    /// Spread needed before a restart is accepted
    pub const GAMEOVER_RESTART_SPREAD: f32 = 1.0;

    /// Scoring
    pub const LINE_SCORE: u64 = 100;
    pub const BLOCK_SCORE: u64 = 200;
    pub const SPIN_SURVIVED_SCORE: u64 = 1000;
    /// Multipliers carried in APPENDSCORE (base is always `SCORE_BASE`)
    pub const SCORE_BASE: u8 = 100;
    pub const BLOCK_SCORE_MULT: u8 = 2;
    pub const SPIN_SCORE_MULT: u8 = 10;
}

/// Center of a board cell in world units
#[inline]
pub fn cell_center(col: i32, row: i32) -> Vec2 {
    Vec2::new(col as f32 * consts::CELL, row as f32 * consts::CELL)
}

/// Board row containing world height `y` (truncating toward zero)
#[inline]
pub fn row_of(y: f32) -> i32 {
    (y / consts::CELL) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_center() {
        assert_eq!(cell_center(0, 0), Vec2::ZERO);
        assert_eq!(cell_center(9, 23), Vec2::new(4.5, 11.5));
    }

    #[test]
    fn test_row_of_truncates() {
        assert_eq!(row_of(1.0), 2);
        assert_eq!(row_of(1.24), 2);
        assert_eq!(row_of(-0.3), 0);
        assert_eq!(row_of(-0.5), -1);
    }
}
