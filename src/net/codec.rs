//! Byte quantization for continuous values on the wire
//!
//! Every float that crosses the network is packed into one byte through one of
//! the [`Quantizer`] constants below. Encoder and decoder share the constant,
//! so the scale can never drift between the two ends.

/// Linear mapping between `[min, max]` and `0..=255`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    pub min: f32,
    pub max: f32,
}

impl Quantizer {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn range(&self) -> f32 {
        self.max - self.min
    }

    /// Largest error a round trip can introduce for in-range values
    pub fn resolution(&self) -> f32 {
        self.range() / 255.0
    }

    /// Pack `value`; out-of-range values clamp to the ends
    pub fn encode(&self, value: f32) -> u8 {
        let scaled = (value - self.min) / self.range() * 255.0;
        if scaled.is_nan() {
            return 0;
        }
        scaled.round().clamp(0.0, 255.0) as u8
    }

    pub fn decode(&self, byte: u8) -> f32 {
        self.min + byte as f32 / 255.0 * self.range()
    }
}

/// Falling piece progress (world units). The last half row before the floor
/// (11.0..=11.5) clamps to 11.0; ADDPIECE carries the exact landing row.
pub const PIECE_FINE: Quantizer = Quantizer::new(0.0, 11.0);
/// Paddle horizontal position (world units)
pub const PADDLE_X: Quantizer = Quantizer::new(0.0, 11.0);
/// Attack spin (degrees)
pub const BOARD_SPIN: Quantizer = Quantizer::new(0.0, 360.0);
/// Stage flip (degrees)
pub const BOARD_FLIP: Quantizer = Quantizer::new(0.0, 180.0);
/// Ball position on either axis (world units). Covers the whole field,
/// including the miss line below the board.
pub const BALL_AXIS: Quantizer = Quantizer::new(-4.0, 16.0);
