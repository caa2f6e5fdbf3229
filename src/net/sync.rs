//! Mirror reconstruction from inbound messages

use log::{debug, warn};

use super::message::{CELLS_PER_CHUNK, Message};
use crate::consts::{BOARD_HEIGHT, BOARD_WIDTH};
use crate::sim::board::Cell;
use crate::sim::stage::{self, Stage};
use crate::sim::state::MatchState;
use crate::sim::tetris;

/// What an inbound message asks of the local player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerAction {
    None,
    /// Opponent attacked us
    Attack(u8),
    /// Opponent's game ended
    OpponentLost,
}

/// Apply one peer message to the mirror record
pub fn apply_to_mirror(mirror: &mut MatchState, msg: &Message) -> PeerAction {
    match *msg {
        Message::AddPiece { col, row } => tetris::place_piece(mirror, col as i32, row as i32),
        Message::DropLine { row } => {
            if (row as usize) < BOARD_HEIGHT {
                mirror.board.drop_line(row as usize);
            } else {
                warn!("DROPLINE for row {row} outside the board");
            }
        }
        Message::PushUp { lines } => mirror.board.push_up(lines as usize),
        Message::AddBlocks { row, chunk, cells } => {
            let first = chunk as usize * CELLS_PER_CHUNK;
            for (i, cell) in cells.into_iter().enumerate() {
                let col = first + i;
                if col < BOARD_WIDTH {
                    mirror.board.set(col as i32, row.board_row(), cell);
                }
            }
        }
        Message::UpdatePiece {
            col,
            rotation,
            kind,
        } => {
            mirror.piece.col = col as i32;
            mirror.piece.rotation = rotation;
            mirror.piece.kind = kind;
        }
        Message::UpdatePieceY { fine } => mirror.piece.fine = fine,
        Message::RotBoard { degrees } => mirror.spin_angle = degrees,
        Message::RotBoard2 { degrees } => mirror.flip_angle = degrees,
        Message::UpdateBall { x, y } => {
            mirror.ball.pos.x = x;
            mirror.ball.pos.y = y;
        }
        Message::UpdatePaddle { x } => mirror.paddle_x = x,
        Message::RemoveBlock { col, row } => {
            if !mirror.board.set(col as i32, row as i32, Cell::Empty) {
                warn!("REMOVEBLOCK for ({col}, {row}) outside the board");
            }
        }
        Message::ChangeState { stage: next } => {
            debug!("Opponent {:?} -> {next:?}", mirror.stage);
            let mut silent = Vec::new();
            stage::change_state(mirror, next, &mut silent);
        }
        Message::AppendScore { base, multiplier } => {
            mirror.score += base as u64 * multiplier as u64;
        }
        Message::Attack { severity } => return PeerAction::Attack(severity),
        Message::GameOver => {
            mirror.stage = Stage::GameOver;
            return PeerAction::OpponentLost;
        }
    }
    PeerAction::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FLIP_DEGREES, SIM_DT};
    use crate::settings::Tuning;
    use crate::sim::events::{GameEvent, sent};
    use crate::sim::piece::{PieceKind, Rotation};
    use crate::sim::state::ActivePiece;

    /// Push everything the local side sent through the wire codec into `mirror`
    fn replay(mirror: &mut MatchState, events: &[GameEvent]) -> Vec<PeerAction> {
        sent(events)
            .iter()
            .map(|m| {
                let decoded = Message::decode(&m.encode()).unwrap();
                apply_to_mirror(mirror, &decoded)
            })
            .filter(|a| *a != PeerAction::None)
            .collect()
    }

    #[test]
    fn test_mirror_tracks_board() {
        let mut local = MatchState::local(Tuning::default(), 11);
        let mut mirror = MatchState::remote(Tuning::default());
        let mut events = Vec::new();

        for col in 2..BOARD_WIDTH as i32 {
            local.board.set(col, 23, Cell::Filled(4));
        }
        // Mirror already had the same partial row
        mirror.board = local.board.clone();

        local.piece = ActivePiece {
            kind: PieceKind::O,
            rotation: Rotation::SPAWN,
            col: 0,
            fine: 11.0,
        };
        tetris::add_piece(&mut local, &mut events);
        tetris::attack(&mut local, 2, &mut events);
        tetris::hard_drop(&mut local, &mut events);

        replay(&mut mirror, &events);
        assert_eq!(mirror.board, local.board);
        assert_eq!(mirror.score, local.score);
        assert_eq!(mirror.piece.kind, local.piece.kind);
        assert_eq!(mirror.piece.col, local.piece.col);
    }

    #[test]
    fn test_mirror_follows_stage_without_side_effects() {
        let mut mirror = MatchState::remote(Tuning::default());
        mirror.paddle_x = 0.0;
        let action = apply_to_mirror(
            &mut mirror,
            &Message::ChangeState {
                stage: Stage::Breakout,
            },
        );
        assert_eq!(action, PeerAction::None);
        assert_eq!(mirror.stage, Stage::Breakout);
        assert_eq!(mirror.paddle_x, 0.0);
    }

    #[test]
    fn test_mirror_follows_flip_into_paddle_stage() {
        let mut local = MatchState::local(Tuning::default(), 5);
        let mut mirror = MatchState::remote(Tuning::default());
        let mut events = Vec::new();

        local.stage_lines = local.tuning.lines_to_transition - 1;
        for col in 2..BOARD_WIDTH as i32 {
            local.board.set(col, 23, Cell::Filled(4));
        }
        local.board.set(6, 21, Cell::Filled(1));
        mirror.board = local.board.clone();
        local.piece = ActivePiece {
            kind: PieceKind::O,
            rotation: Rotation::SPAWN,
            col: 0,
            fine: 11.0,
        };
        tetris::add_piece(&mut local, &mut events);
        replay(&mut mirror, &events);
        assert_eq!(mirror.stage, Stage::TetrisTrans);

        let mut last_angle = mirror.flip_angle;
        while local.stage == Stage::TetrisTrans {
            events.clear();
            tetris::update(&mut local, SIM_DT, false, &mut events);
            replay(&mut mirror, &events);
            assert!(mirror.flip_angle >= last_angle);
            last_angle = mirror.flip_angle;
        }

        assert_eq!(local.stage, Stage::Breakout);
        assert_eq!(mirror.stage, Stage::Breakout);
        assert_eq!(mirror.flip_angle, FLIP_DEGREES);
        assert_eq!(mirror.board, local.board);
        assert!(mirror.board.is_occupied(6, 22));
    }

    #[test]
    fn test_attack_and_game_over_become_actions() {
        let mut mirror = MatchState::remote(Tuning::default());
        assert_eq!(
            apply_to_mirror(&mut mirror, &Message::Attack { severity: 3 }),
            PeerAction::Attack(3)
        );
        assert_eq!(
            apply_to_mirror(&mut mirror, &Message::GameOver),
            PeerAction::OpponentLost
        );
        assert_eq!(mirror.stage, Stage::GameOver);
    }

    #[test]
    fn test_paddle_updates() {
        let mut mirror = MatchState::remote(Tuning::default());
        mirror.board.set(3, 7, Cell::Filled(1));
        let msgs = [
            Message::UpdatePaddle { x: 3.0 },
            Message::UpdateBall { x: 1.0, y: 6.0 },
            Message::RemoveBlock { col: 3, row: 7 },
            Message::AppendScore {
                base: 100,
                multiplier: 2,
            },
        ];
        for msg in &msgs {
            apply_to_mirror(&mut mirror, msg);
        }
        assert_eq!(mirror.paddle_x, 3.0);
        assert_eq!(mirror.ball.pos.x, 1.0);
        assert_eq!(mirror.ball.pos.y, 6.0);
        assert!(!mirror.board.is_occupied(3, 7));
        assert_eq!(mirror.score, 200);
    }

    #[test]
    fn test_out_of_range_rows_are_ignored() {
        let mut mirror = MatchState::remote(Tuning::default());
        mirror.board.set(0, 23, Cell::Filled(0));
        apply_to_mirror(&mut mirror, &Message::DropLine { row: 200 });
        apply_to_mirror(&mut mirror, &Message::RemoveBlock { col: 40, row: 2 });
        assert_eq!(mirror.board.occupied_count(), 1);
    }
}
