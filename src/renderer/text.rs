//! ASCII renderer
//!
//! The falling-block stage is drawn with row 0 at the top. The paddle stage is
//! drawn flipped, the way the board looks after the transition, with the
//! paddle near the bottom of the frame.

use super::Renderer;
use crate::consts::*;
use crate::row_of;
use crate::sim::{MatchState, PieceKind, Rotation, Stage, StageKind};

const EMPTY: char = '.';
const BLOCK: char = '#';
const PIECE: char = '@';
const BALL: char = 'o';

pub struct TextRenderer {
    /// `[line][col]`
    grid: [[char; BOARD_WIDTH]; BOARD_HEIGHT],
    flipped: bool,
    header: String,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            grid: [[EMPTY; BOARD_WIDTH]; BOARD_HEIGHT],
            flipped: false,
            header: String::new(),
        }
    }

    fn plot(&mut self, col: i32, line: i32, ch: char) {
        if (0..BOARD_WIDTH as i32).contains(&col) && (0..BOARD_HEIGHT as i32).contains(&line) {
            self.grid[line as usize][col as usize] = ch;
        }
    }

    /// Display line for a board row
    fn line_of(&self, row: i32) -> i32 {
        if self.flipped {
            BOARD_HEIGHT as i32 - 1 - row
        } else {
            row
        }
    }

    /// Board, active piece or paddle, and ball for one player
    pub fn render(&mut self, state: &MatchState) -> String {
        self.draw_board(state);
        let p = &state.piece;
        match state.stage.kind() {
            _ if state.stage == Stage::GameOver => {}
            StageKind::Block => {
                self.draw_piece(p.col as f32, row_of(p.fine) as f32, p.kind, p.rotation)
            }
            StageKind::Paddle => {
                let line = self.line_of((PADDLE_LIFT / CELL) as i32);
                self.draw_piece(state.paddle_x / CELL, line as f32, p.kind, p.rotation);
            }
        }
        self.frame()
    }

    /// Local and mirror side by side
    pub fn render_duel(&mut self, local: &MatchState, remote: &MatchState) -> String {
        let left = self.render(local);
        let right = self.render(remote);
        left.lines()
            .zip(right.lines())
            .map(|(l, r)| format!("{l:<32}|  {r}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The last drawn frame
    pub fn frame(&self) -> String {
        let mut out = String::with_capacity((BOARD_WIDTH + 1) * (BOARD_HEIGHT + 1) + self.header.len());
        out.push_str(&self.header);
        for line in &self.grid {
            out.push('\n');
            out.extend(line.iter());
        }
        out
    }
}

impl Renderer for TextRenderer {
    fn draw_board(&mut self, state: &MatchState) {
        self.flipped = state.stage.kind() == StageKind::Paddle;
        self.grid = [[EMPTY; BOARD_WIDTH]; BOARD_HEIGHT];

        for (col, row) in state.board.occupied() {
            let line = self.line_of(row);
            self.plot(col, line, BLOCK);
        }

        if state.stage == Stage::Breakout {
            let col = (state.ball.pos.x / CELL).round() as i32;
            let line = self.line_of((state.ball.pos.y / CELL).round() as i32);
            self.plot(col, line, BALL);
        }

        self.header = match state.notice {
            Some(notice) => format!("{:>7} {:?} {}", state.score, state.stage, notice.as_str()),
            None => format!("{:>7} {:?}", state.score, state.stage),
        };
    }

    fn draw_piece(&mut self, x: f32, y: f32, kind: PieceKind, rotation: Rotation) {
        let (x, y) = (x.round() as i32, y.round() as i32);
        for &(dx, dy) in kind.cells(rotation) {
            let line = if self.flipped { y - dy } else { y + dy };
            self.plot(x + dx, line, PIECE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::stage;
    use crate::sim::{ActivePiece, Cell, Notice};

    fn grid_lines(frame: &str) -> Vec<&str> {
        frame.lines().skip(1).collect()
    }

    #[test]
    fn test_block_stage_frame() {
        let mut state = MatchState::local(Tuning::default(), 1);
        state.piece = ActivePiece::spawn(PieceKind::O);
        state.board.set(0, 23, Cell::Filled(3));

        let frame = TextRenderer::new().render(&state);
        let lines = grid_lines(&frame);
        assert_eq!(lines.len(), BOARD_HEIGHT);
        assert!(lines.iter().all(|l| l.chars().count() == BOARD_WIDTH));
        assert_eq!(lines[23].chars().next(), Some(BLOCK));
        assert_eq!(frame.matches(PIECE).count(), 4);
        assert!(frame.starts_with("      0 Tetris"));
    }

    #[test]
    fn test_paddle_stage_is_flipped() {
        let mut state = MatchState::local(Tuning::default(), 1);
        state.piece = ActivePiece::spawn(PieceKind::O);
        state.board.set(4, 23, Cell::Filled(3));
        let mut events = Vec::new();
        stage::change_state(&mut state, Stage::Breakout, &mut events);

        let frame = TextRenderer::new().render(&state);
        let lines = grid_lines(&frame);
        // Row 23 is now the top line
        assert_eq!(lines[0].chars().nth(4), Some(BLOCK));
        assert_eq!(frame.matches(BALL).count(), 1);
        assert_eq!(frame.matches(PIECE).count(), 4);
        // Paddle sits below the ball
        let ball_line = lines.iter().position(|l| l.contains(BALL));
        let paddle_line = lines.iter().position(|l| l.contains(PIECE));
        assert!(ball_line < paddle_line);
    }

    #[test]
    fn test_notice_in_header() {
        let mut state = MatchState::local(Tuning::default(), 1);
        state.show_notice(Notice::Attack, 1.0);
        let frame = TextRenderer::new().render(&state);
        assert!(frame.lines().next().is_some_and(|h| h.ends_with("ATTACK")));
    }

    #[test]
    fn test_duel_has_both_boards() {
        let local = MatchState::local(Tuning::default(), 1);
        let remote = MatchState::remote(Tuning::default());
        let frame = TextRenderer::new().render_duel(&local, &remote);
        assert_eq!(frame.lines().count(), BOARD_HEIGHT + 1);
        assert!(frame.lines().all(|l| l.contains('|')));
    }
}
