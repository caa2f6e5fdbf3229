//! Per-player match state
//!
//! One [`MatchState`] per player: the local one is authoritative and drives
//! messages, the remote one is a mirror rebuilt from inbound messages.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::board::Board;
use super::events::Notice;
use super::piece::{PieceKind, Rotation};
use super::stage::Stage;
use crate::consts::*;
use crate::settings::Tuning;

/// Which copy of a player this state is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Simulated here; emits messages
    Local,
    /// Mirror of the peer; only mutated by inbound messages
    Remote,
}

/// The falling piece (also the paddle shape during the paddle stage)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    /// Origin column
    pub col: i32,
    /// Continuous fall progress in world units (`fine / CELL` is the row)
    pub fine: f32,
}

impl ActivePiece {
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: Rotation::SPAWN,
            col: SPAWN_COL,
            fine: SPAWN_FINE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PADDLE_START_X, BALL_SPAWN_Y),
            vel: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchState {
    pub side: Side,
    pub stage: Stage,
    pub board: Board,
    pub piece: ActivePiece,
    pub score: u64,
    /// Lines cleared since the current falling-block stage began
    pub stage_lines: u32,
    pub total_lines: u32,

    // === Paddle stage ===
    pub paddle_x: f32,
    pub ball: Ball,
    /// Remaining fast-ball time (seconds)
    pub fast_ball_timer: f32,
    /// Remaining paddle-stage time (seconds)
    pub survive_timer: f32,
    /// Block and paddle hits since the last attack or miss
    pub consecutive_hits: u32,

    // === Board animation ===
    /// Severity-3 attack spin in progress
    pub spinning: bool,
    /// Spin angle (degrees, 0..360)
    pub spin_angle: f32,
    /// Stage flip angle (degrees, 0 = falling-block, 180 = paddle)
    pub flip_angle: f32,
    pub gameover_spread: f32,

    // === HUD ===
    pub notice: Option<Notice>,
    pub notice_timer: f32,

    pub tuning: Tuning,
    rng: Pcg32,
}

impl MatchState {
    /// Fresh state for a new match
    pub fn new(side: Side, tuning: Tuning, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let piece = ActivePiece::spawn(PieceKind::random(&mut rng));
        Self {
            side,
            stage: Stage::Tetris,
            board: Board::new(),
            piece,
            score: 0,
            stage_lines: 0,
            total_lines: 0,
            paddle_x: PADDLE_START_X,
            ball: Ball::default(),
            fast_ball_timer: 0.0,
            survive_timer: 0.0,
            consecutive_hits: 0,
            spinning: false,
            spin_angle: 0.0,
            flip_angle: 0.0,
            gameover_spread: 0.0,
            notice: None,
            notice_timer: 0.0,
            tuning,
            rng,
        }
    }

    /// Local, authoritative state
    pub fn local(tuning: Tuning, seed: u64) -> Self {
        Self::new(Side::Local, tuning, seed)
    }

    /// Mirror of the peer
    pub fn remote(tuning: Tuning) -> Self {
        Self::new(Side::Remote, tuning, 0)
    }

    pub fn is_local(&self) -> bool {
        self.side == Side::Local
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Restart with the same side and tuning and a new seed
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(self.side, self.tuning, seed);
    }

    /// Show a notice for `seconds`
    pub fn show_notice(&mut self, notice: Notice, seconds: f32) {
        self.notice = Some(notice);
        self.notice_timer = seconds;
    }

    /// Count down the notice slot
    pub fn decay_notice(&mut self, dt: f32) {
        if self.notice.is_none() {
            return;
        }
        self.notice_timer -= dt;
        if self.notice_timer <= 0.0 {
            self.notice = None;
            self.notice_timer = 0.0;
        }
    }

    /// Fall speed including level scaling
    pub fn fall_speed(&self, soft_drop: bool) -> f32 {
        let mut speed = self.tuning.fall_speed + FALL_LEVEL_SPEEDUP * self.tuning.level as f32;
        if soft_drop {
            speed += self.tuning.soft_drop_bonus;
        }
        speed
    }

    /// Base ball speed per axis including level scaling
    pub fn ball_speed(&self) -> Vec2 {
        let bonus = BALL_LEVEL_SPEEDUP * self.tuning.level as f32;
        Vec2::new(self.tuning.ball_speed.0 + bonus, self.tuning.ball_speed.1 + bonus)
    }

    pub fn fast_ball_speed(&self) -> Vec2 {
        Vec2::new(self.tuning.fast_ball_speed.0, self.tuning.fast_ball_speed.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_spawns_piece() {
        let state = MatchState::local(Tuning::default(), 42);
        assert_eq!(state.stage, Stage::Tetris);
        assert_eq!(state.piece.col, SPAWN_COL);
        assert_eq!(state.piece.fine, SPAWN_FINE);
        assert_eq!(state.piece.rotation, Rotation::SPAWN);
        assert_eq!(state.board.occupied_count(), 0);
        assert!(state.is_local());
    }

    #[test]
    fn test_same_seed_same_pieces() {
        let mut a = MatchState::local(Tuning::default(), 7);
        let mut b = MatchState::local(Tuning::default(), 7);
        for _ in 0..20 {
            assert_eq!(PieceKind::random(a.rng()), PieceKind::random(b.rng()));
        }
    }

    #[test]
    fn test_notice_expires() {
        let mut state = MatchState::remote(Tuning::default());
        state.show_notice(Notice::YouWin, 1.0);
        state.decay_notice(0.5);
        assert!(state.notice.is_some());
        state.decay_notice(0.6);
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_reset_keeps_side() {
        let mut state = MatchState::remote(Tuning::default());
        state.score = 900;
        state.reset(3);
        assert_eq!(state.score, 0);
        assert_eq!(state.side, Side::Remote);
    }
}
