//! Rendering module
//!
//! The game draws through the [`Renderer`] trait. The only backend shipped is
//! [`TextRenderer`], which produces ASCII frames for the headless binary.

pub mod text;

pub use text::TextRenderer;

use crate::sim::{MatchState, PieceKind, Rotation};

pub trait Renderer {
    /// Board cells, plus the ball during the paddle stage
    fn draw_board(&mut self, state: &MatchState);

    /// A piece with its origin at display cell `(x, y)`
    fn draw_piece(&mut self, x: f32, y: f32, kind: PieceKind, rotation: Rotation);
}
