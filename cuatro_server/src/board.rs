// Connect-Four board engine: pure grid operations, no I/O, no locking.
//
// Row 0 is the top of the grid; a dropped piece lands in the highest-index
// empty row of its column (gravity). All operations work on the explicit
// board value, so the opponent policy can run lookahead on throwaway
// `Clone`s without any hidden state.

use cuatro_protocol::Mark;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

/// The four axis directions through a cell: vertical, horizontal, and the
/// two diagonals. `check_win` scans each together with its opposite.
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Returned by `drop_piece` when the column has no empty cell left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnFull;

/// A 6x7 grid of marks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    cells: [[Mark; COLS]; ROWS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: usize, col: usize) -> Mark {
        self.cells[row][col]
    }

    /// Columns that can still take a piece, in ascending order.
    pub fn valid_columns(&self) -> Vec<usize> {
        (0..COLS).filter(|&c| self.cells[0][c].is_empty()).collect()
    }

    /// Drop `mark` into `col`. The piece lands in the lowest empty cell;
    /// returns the landing row. A full column leaves the board unchanged.
    pub fn drop_piece(&mut self, col: usize, mark: Mark) -> Result<usize, ColumnFull> {
        for row in (0..ROWS).rev() {
            if self.cells[row][col].is_empty() {
                self.cells[row][col] = mark;
                return Ok(row);
            }
        }
        Err(ColumnFull)
    }

    /// Winner through the just-placed cell at `(row, col)`, or `EMPTY`.
    ///
    /// Counts the contiguous same-mark run through the cell along each axis
    /// pair; any run of four or more wins.
    pub fn check_win(&self, row: usize, col: usize) -> Mark {
        let mark = self.cells[row][col];
        if mark.is_empty() {
            return Mark::EMPTY;
        }
        for (dr, dc) in DIRECTIONS {
            let run = self.run_length(row, col, dr, dc, mark)
                + self.run_length(row, col, -dr, -dc, mark)
                - 1;
            if run >= 4 {
                return mark;
            }
        }
        Mark::EMPTY
    }

    /// True iff no column can take another piece.
    pub fn is_full(&self) -> bool {
        (0..COLS).all(|c| !self.cells[0][c].is_empty())
    }

    /// Row-major copy of the grid for the `BOARD` wire payload.
    pub fn rows(&self) -> Vec<Vec<Mark>> {
        self.cells.iter().map(|row| row.to_vec()).collect()
    }

    /// Contiguous cells matching `mark` from `(row, col)` inclusive, walking
    /// in direction `(dr, dc)` until the edge or a different mark.
    fn run_length(&self, row: usize, col: usize, dr: i32, dc: i32, mark: Mark) -> usize {
        let mut count = 0;
        let mut r = row as i32;
        let mut c = col as i32;
        while (0..ROWS as i32).contains(&r)
            && (0..COLS as i32).contains(&c)
            && self.cells[r as usize][c as usize] == mark
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }
}
