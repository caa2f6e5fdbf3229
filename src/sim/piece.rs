//! Piece catalog
//!
//! Seven shapes, four rotations each. Every (shape, rotation) pair carries:
//! - 4 cell offsets `(dx, dy)` relative to the piece origin (`dy` grows downward)
//! - the legal origin column range
//! - the bottom extent (largest `dy`)
//! - the spawn clearance used by the game-over test
//!
//! Rotation 0 is the spawn orientation. The tables are written out
//! explicitly rather than derived so gameplay stays bit-for-bit stable.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Relative cell offset `(dx, dy)`
pub type Offset = (i32, i32);

/// One of the seven tetromino shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PieceKind {
    I = 0,
    Z = 1,
    S = 2,
    O = 3,
    L = 4,
    J = 5,
    T = 6,
}

/// Quarter-turn orientation, always in `0..4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rotation(u8);

impl Rotation {
    pub const SPAWN: Rotation = Rotation(0);

    pub fn new(value: u8) -> Self {
        Self(value % 4)
    }

    /// Next orientation clockwise
    pub fn next(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }
}

const I_FLAT: [Offset; 4] = [(0, 0), (-1, 0), (-2, 0), (1, 0)];
const I_UPRIGHT: [Offset; 4] = [(0, 0), (0, 1), (0, 2), (0, -1)];
const Z_UPRIGHT: [Offset; 4] = [(1, 0), (1, -1), (0, 0), (0, 1)];
const Z_FLAT: [Offset; 4] = [(1, 0), (0, -1), (0, 0), (-1, -1)];
const S_UPRIGHT: [Offset; 4] = [(-1, 0), (0, 1), (0, 0), (-1, -1)];
const S_FLAT: [Offset; 4] = [(-1, 0), (0, -1), (0, 0), (1, -1)];
const O_SQUARE: [Offset; 4] = [(1, 0), (0, 1), (0, 0), (1, 1)];

const CELLS: [[[Offset; 4]; 4]; 7] = [
    [I_FLAT, I_UPRIGHT, I_FLAT, I_UPRIGHT],
    [Z_UPRIGHT, Z_FLAT, Z_UPRIGHT, Z_FLAT],
    [S_UPRIGHT, S_FLAT, S_UPRIGHT, S_FLAT],
    [O_SQUARE, O_SQUARE, O_SQUARE, O_SQUARE],
    // L
    [
        [(0, 0), (1, 0), (-1, 0), (-1, 1)],
        [(0, 0), (0, 1), (0, -1), (-1, -1)],
        [(0, 0), (1, 0), (-1, 0), (1, -1)],
        [(0, 0), (0, 1), (0, -1), (1, 1)],
    ],
    // J
    [
        [(0, 0), (1, 0), (-1, 0), (-1, -1)],
        [(0, 0), (0, 1), (0, -1), (1, -1)],
        [(0, 0), (1, 0), (-1, 0), (1, 1)],
        [(0, 0), (0, 1), (0, -1), (-1, 1)],
    ],
    // T
    [
        [(0, 0), (1, 0), (0, 1), (0, -1)],
        [(0, 0), (1, 0), (-1, 0), (0, 1)],
        [(0, 0), (-1, 0), (0, 1), (0, -1)],
        [(0, 0), (1, 0), (-1, 0), (0, -1)],
    ],
];

/// Legal origin columns `(min, max)`, inclusive
const COLUMN_RANGE: [[(i32, i32); 4]; 7] = [
    [(2, 8), (0, 9), (2, 8), (0, 9)],
    [(0, 8), (1, 8), (0, 8), (1, 8)],
    [(1, 9), (1, 8), (1, 9), (1, 8)],
    [(0, 8), (0, 8), (0, 8), (0, 8)],
    [(1, 8), (1, 9), (1, 8), (0, 8)],
    [(1, 8), (0, 8), (1, 8), (1, 9)],
    [(0, 8), (1, 8), (1, 9), (1, 8)],
];

/// Lowest occupied row relative to the origin
const BOTTOM_EXTENT: [[i32; 4]; 7] = [
    [0, 2, 0, 2],
    [1, 0, 1, 0],
    [1, 0, 1, 0],
    [1, 1, 1, 1],
    [1, 1, 0, 1],
    [0, 1, 1, 1],
    [1, 1, 1, 0],
];

/// Rows of fall a stuck piece needs to have made to not end the game
const SPAWN_CLEARANCE: [[i32; 4]; 7] = [
    [0, 1, 0, 1],
    [1, 0, 1, 0],
    [1, 0, 1, 0],
    [0, 0, 0, 0],
    [0, 1, 1, 1],
    [1, 1, 0, 1],
    [1, 0, 1, 1],
];

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::Z,
        PieceKind::S,
        PieceKind::O,
        PieceKind::L,
        PieceKind::J,
        PieceKind::T,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Uniformly random shape
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Cell offsets for this shape at `rotation`
    pub fn cells(self, rotation: Rotation) -> &'static [Offset; 4] {
        &CELLS[self.index()][rotation.index()]
    }

    /// Inclusive `(min, max)` origin column
    pub fn column_range(self, rotation: Rotation) -> (i32, i32) {
        COLUMN_RANGE[self.index()][rotation.index()]
    }

    pub fn bottom_extent(self, rotation: Rotation) -> i32 {
        BOTTOM_EXTENT[self.index()][rotation.index()]
    }

    pub fn spawn_clearance(self, rotation: Rotation) -> i32 {
        SPAWN_CLEARANCE[self.index()][rotation.index()]
    }
}
