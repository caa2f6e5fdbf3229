//! Falling-block board
//!
//! A fixed 10x24 grid stored column-major (`cells[col][row]`), row 0 at the top.
//! Rows are dropped and pushed in place; the grid never resizes.

use serde::{Deserialize, Serialize};

use crate::consts::{BOARD_HEIGHT, BOARD_WIDTH};

/// Wire byte for an empty cell
pub const EMPTY_BYTE: u8 = 0xFF;

/// A single board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    /// Colour / piece index in `0..7`
    Filled(u8),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Cell::Empty => EMPTY_BYTE,
            Cell::Filled(color) => color,
        }
    }

    /// Decode a wire byte; `None` for anything that is neither empty nor a colour
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            EMPTY_BYTE => Some(Cell::Empty),
            0..=6 => Some(Cell::Filled(byte)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_HEIGHT]; BOARD_WIDTH],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_HEIGHT]; BOARD_WIDTH],
        }
    }

    pub fn in_bounds(col: i32, row: i32) -> bool {
        (0..BOARD_WIDTH as i32).contains(&col) && (0..BOARD_HEIGHT as i32).contains(&row)
    }

    /// Cell at `(col, row)`, `None` outside the grid
    pub fn get(&self, col: i32, row: i32) -> Option<Cell> {
        Self::in_bounds(col, row).then(|| self.cells[col as usize][row as usize])
    }

    /// Write a cell; returns false (and leaves the board untouched) outside the grid
    pub fn set(&mut self, col: i32, row: i32, cell: Cell) -> bool {
        if !Self::in_bounds(col, row) {
            return false;
        }
        self.cells[col as usize][row as usize] = cell;
        true
    }

    pub fn is_occupied(&self, col: i32, row: i32) -> bool {
        self.get(col, row).is_some_and(|c| !c.is_empty())
    }

    pub fn is_row_complete(&self, row: usize) -> bool {
        (0..BOARD_WIDTH).all(|col| !self.cells[col][row].is_empty())
    }

    pub fn is_row_empty(&self, row: usize) -> bool {
        (0..BOARD_WIDTH).all(|col| self.cells[col][row].is_empty())
    }

    /// Remove `row`, shifting every row above it down by one. Row 0 becomes empty.
    pub fn drop_line(&mut self, row: usize) {
        if row >= BOARD_HEIGHT {
            return;
        }
        for column in self.cells.iter_mut() {
            column.copy_within(0..row, 1);
            column[0] = Cell::Empty;
        }
    }

    /// Shift every row up by `n`, discarding the top `n` rows.
    /// The bottom `n` rows are left empty for the caller to fill.
    pub fn push_up(&mut self, n: usize) {
        let n = n.min(BOARD_HEIGHT);
        for column in self.cells.iter_mut() {
            column.copy_within(n.., 0);
            for cell in &mut column[BOARD_HEIGHT - n..] {
                *cell = Cell::Empty;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Occupied cells as `(col, row)`, column-major
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells.iter().enumerate().flat_map(|(col, column)| {
            column
                .iter()
                .enumerate()
                .filter(|(_, cell)| !cell.is_empty())
                .map(move |(row, _)| (col as i32, row as i32))
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, row: i32) {
        for col in 0..BOARD_WIDTH as i32 {
            board.set(col, row, Cell::Filled(1));
        }
    }

    #[test]
    fn test_cell_bytes() {
        assert_eq!(Cell::Empty.to_byte(), 0xFF);
        assert_eq!(Cell::from_byte(0xFF), Some(Cell::Empty));
        assert_eq!(Cell::from_byte(3), Some(Cell::Filled(3)));
        assert_eq!(Cell::from_byte(7), None);
    }

    #[test]
    fn test_out_of_range_access() {
        let mut board = Board::new();
        assert_eq!(board.get(-1, 0), None);
        assert_eq!(board.get(0, 24), None);
        assert!(!board.set(10, 0, Cell::Filled(0)));
        assert!(!board.is_occupied(10, 0));
    }

    #[test]
    fn test_drop_line_shifts_rows_above() {
        let mut board = Board::new();
        board.set(0, 0, Cell::Filled(2));
        board.set(3, 21, Cell::Filled(4));
        fill_row(&mut board, 22);
        board.drop_line(22);

        assert_eq!(board.get(3, 22), Some(Cell::Filled(4)));
        assert_eq!(board.get(0, 1), Some(Cell::Filled(2)));
        assert!(board.is_row_empty(0));
        assert!(!board.is_row_complete(22));
    }

    #[test]
    fn test_drop_line_row_zero() {
        let mut board = Board::new();
        fill_row(&mut board, 0);
        board.drop_line(0);
        assert_eq!(board.occupied_count(), 0);
    }

    #[test]
    fn test_push_up() {
        let mut board = Board::new();
        board.set(4, 23, Cell::Filled(5));
        board.set(4, 0, Cell::Filled(1));
        board.push_up(2);

        assert_eq!(board.get(4, 21), Some(Cell::Filled(5)));
        assert!(board.is_row_empty(22));
        assert!(board.is_row_empty(23));
        assert_eq!(board.occupied_count(), 1);
    }

    #[test]
    fn test_occupied_is_column_major() {
        let mut board = Board::new();
        board.set(1, 0, Cell::Filled(0));
        board.set(0, 5, Cell::Filled(0));
        let cells: Vec<_> = board.occupied().collect();
        assert_eq!(cells, vec![(0, 5), (1, 0)]);
    }
}
