//! Typed peer messages and their 4-byte frames
//!
//! Frame layout: `[type][p1][p2][p3]`. Unused payload bytes are zero.

use std::fmt;

use crate::consts::BOARD_WIDTH;
use crate::sim::board::{Board, Cell};
use crate::sim::piece::{PieceKind, Rotation};
use crate::sim::stage::Stage;

use super::codec::{BALL_AXIS, BOARD_FLIP, BOARD_SPIN, PADDLE_X, PIECE_FINE};

/// Bytes per message
pub const FRAME_LEN: usize = 4;

/// One wire message
pub type Frame = [u8; FRAME_LEN];

/// Columns carried by one ADDBLOCKS message
pub const CELLS_PER_CHUNK: usize = 3;
/// ADDBLOCKS messages needed for a full row
pub const CHUNKS_PER_ROW: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    AddPiece = 1,
    DropLine = 2,
    Attack = 3,
    PushUp = 4,
    AddBlocksA = 5,
    AddBlocksB = 6,
    AddBlocksC = 7,
    AddBlocksD = 8,
    AddBlocks2A = 9,
    AddBlocks2B = 10,
    AddBlocks2C = 11,
    AddBlocks2D = 12,
    UpdatePiece = 13,
    UpdatePieceY = 14,
    RotBoard = 15,
    ChangeState = 16,
    RotBoard2 = 17,
    UpdateBall = 18,
    UpdatePaddle = 19,
    RemoveBlock = 20,
    GameOver = 21,
    AppendScore = 22,
}

impl MessageType {
    const ALL: [MessageType; 22] = [
        MessageType::AddPiece,
        MessageType::DropLine,
        MessageType::Attack,
        MessageType::PushUp,
        MessageType::AddBlocksA,
        MessageType::AddBlocksB,
        MessageType::AddBlocksC,
        MessageType::AddBlocksD,
        MessageType::AddBlocks2A,
        MessageType::AddBlocks2B,
        MessageType::AddBlocks2C,
        MessageType::AddBlocks2D,
        MessageType::UpdatePiece,
        MessageType::UpdatePieceY,
        MessageType::RotBoard,
        MessageType::ChangeState,
        MessageType::RotBoard2,
        MessageType::UpdateBall,
        MessageType::UpdatePaddle,
        MessageType::RemoveBlock,
        MessageType::GameOver,
        MessageType::AppendScore,
    ];

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| *t as u8 == byte)
    }
}

/// Which garbage row an ADDBLOCKS message fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarbageRow {
    /// Row 23
    Bottom,
    /// Row 22
    Second,
}

impl GarbageRow {
    pub fn board_row(self) -> i32 {
        match self {
            GarbageRow::Bottom => 23,
            GarbageRow::Second => 22,
        }
    }

    fn base_type(self) -> u8 {
        match self {
            GarbageRow::Bottom => MessageType::AddBlocksA as u8,
            GarbageRow::Second => MessageType::AddBlocks2A as u8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    /// Commit the mirror's current piece at `(col, row)`
    AddPiece { col: u8, row: u8 },
    DropLine { row: u8 },
    Attack { severity: u8 },
    PushUp { lines: u8 },
    /// Three cells of a garbage row starting at column `chunk * 3`
    AddBlocks {
        row: GarbageRow,
        chunk: u8,
        cells: [Cell; CELLS_PER_CHUNK],
    },
    UpdatePiece {
        col: u8,
        rotation: Rotation,
        kind: PieceKind,
    },
    UpdatePieceY { fine: f32 },
    RotBoard { degrees: f32 },
    ChangeState { stage: Stage },
    RotBoard2 { degrees: f32 },
    UpdateBall { x: f32, y: f32 },
    UpdatePaddle { x: f32 },
    RemoveBlock { col: u8, row: u8 },
    GameOver,
    AppendScore { base: u8, multiplier: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    UnknownMessageType(u8),
    InvalidPayload { kind: MessageType, byte: u8 },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::InvalidPayload { kind, byte } => {
                write!(f, "invalid payload byte 0x{byte:02x} for {kind:?}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

impl Message {
    pub fn kind(&self) -> MessageType {
        match self {
            Message::AddPiece { .. } => MessageType::AddPiece,
            Message::DropLine { .. } => MessageType::DropLine,
            Message::Attack { .. } => MessageType::Attack,
            Message::PushUp { .. } => MessageType::PushUp,
            Message::AddBlocks { row, chunk, .. } => {
                let byte = row.base_type() + (*chunk).min(CHUNKS_PER_ROW - 1);
                MessageType::from_byte(byte).unwrap_or(MessageType::AddBlocksA)
            }
            Message::UpdatePiece { .. } => MessageType::UpdatePiece,
            Message::UpdatePieceY { .. } => MessageType::UpdatePieceY,
            Message::RotBoard { .. } => MessageType::RotBoard,
            Message::ChangeState { .. } => MessageType::ChangeState,
            Message::RotBoard2 { .. } => MessageType::RotBoard2,
            Message::UpdateBall { .. } => MessageType::UpdateBall,
            Message::UpdatePaddle { .. } => MessageType::UpdatePaddle,
            Message::RemoveBlock { .. } => MessageType::RemoveBlock,
            Message::GameOver => MessageType::GameOver,
            Message::AppendScore { .. } => MessageType::AppendScore,
        }
    }

    pub fn encode(&self) -> Frame {
        let payload = match *self {
            Message::AddPiece { col, row } => [col, row, 0],
            Message::DropLine { row } => [row, 0, 0],
            Message::Attack { severity } => [severity, 0, 0],
            Message::PushUp { lines } => [lines, 0, 0],
            Message::AddBlocks { cells, .. } => cells.map(Cell::to_byte),
            Message::UpdatePiece {
                col,
                rotation,
                kind,
            } => [col, rotation.as_u8(), kind as u8],
            Message::UpdatePieceY { fine } => [PIECE_FINE.encode(fine), 0, 0],
            Message::RotBoard { degrees } => [BOARD_SPIN.encode(degrees), 0, 0],
            Message::ChangeState { stage } => [stage.to_byte(), 0, 0],
            Message::RotBoard2 { degrees } => [BOARD_FLIP.encode(degrees), 0, 0],
            Message::UpdateBall { x, y } => [BALL_AXIS.encode(x), BALL_AXIS.encode(y), 0],
            Message::UpdatePaddle { x } => [PADDLE_X.encode(x), 0, 0],
            Message::RemoveBlock { col, row } => [col, row, 0],
            Message::GameOver => [0, 0, 0],
            Message::AppendScore { base, multiplier } => [base, multiplier, 0],
        };
        [self.kind() as u8, payload[0], payload[1], payload[2]]
    }

    pub fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let [type_byte, p1, p2, p3] = *frame;
        let kind =
            MessageType::from_byte(type_byte).ok_or(ProtocolError::UnknownMessageType(type_byte))?;
        let invalid = |byte: u8| ProtocolError::InvalidPayload { kind, byte };

        let msg = match kind {
            MessageType::AddPiece => Message::AddPiece { col: p1, row: p2 },
            MessageType::DropLine => Message::DropLine { row: p1 },
            MessageType::Attack => {
                if !(1..=3).contains(&p1) {
                    return Err(invalid(p1));
                }
                Message::Attack { severity: p1 }
            }
            MessageType::PushUp => Message::PushUp { lines: p1 },
            MessageType::AddBlocksA
            | MessageType::AddBlocksB
            | MessageType::AddBlocksC
            | MessageType::AddBlocksD
            | MessageType::AddBlocks2A
            | MessageType::AddBlocks2B
            | MessageType::AddBlocks2C
            | MessageType::AddBlocks2D => {
                let row = if type_byte >= MessageType::AddBlocks2A as u8 {
                    GarbageRow::Second
                } else {
                    GarbageRow::Bottom
                };
                let cell = |b: u8| Cell::from_byte(b).ok_or(invalid(b));
                Message::AddBlocks {
                    row,
                    chunk: type_byte - row.base_type(),
                    cells: [cell(p1)?, cell(p2)?, cell(p3)?],
                }
            }
            MessageType::UpdatePiece => Message::UpdatePiece {
                col: p1,
                rotation: Rotation::new(p2),
                kind: PieceKind::from_index(p3).ok_or(invalid(p3))?,
            },
            MessageType::UpdatePieceY => Message::UpdatePieceY {
                fine: PIECE_FINE.decode(p1),
            },
            MessageType::RotBoard => Message::RotBoard {
                degrees: BOARD_SPIN.decode(p1),
            },
            MessageType::ChangeState => Message::ChangeState {
                stage: Stage::from_byte(p1).ok_or(invalid(p1))?,
            },
            MessageType::RotBoard2 => Message::RotBoard2 {
                degrees: BOARD_FLIP.decode(p1),
            },
            MessageType::UpdateBall => Message::UpdateBall {
                x: BALL_AXIS.decode(p1),
                y: BALL_AXIS.decode(p2),
            },
            MessageType::UpdatePaddle => Message::UpdatePaddle {
                x: PADDLE_X.decode(p1),
            },
            MessageType::RemoveBlock => Message::RemoveBlock { col: p1, row: p2 },
            MessageType::GameOver => Message::GameOver,
            MessageType::AppendScore => Message::AppendScore {
                base: p1,
                multiplier: p2,
            },
        };
        Ok(msg)
    }

    /// The four ADDBLOCKS messages describing `row` of `board`
    pub fn garbage_row(row: GarbageRow, board: &Board) -> [Message; CHUNKS_PER_ROW as usize] {
        std::array::from_fn(|chunk| {
            let first = (chunk * CELLS_PER_CHUNK) as i32;
            let cells = std::array::from_fn(|i| {
                let col = first + i as i32;
                if col < BOARD_WIDTH as i32 {
                    board.get(col, row.board_row()).unwrap_or_default()
                } else {
                    Cell::Empty
                }
            });
            Message::AddBlocks {
                row,
                chunk: chunk as u8,
                cells,
            }
        })
    }
}

/// Clamp a board coordinate into a payload byte
pub fn coord_byte(value: i32) -> u8 {
    value.clamp(0, u8::MAX as i32) as u8
}
