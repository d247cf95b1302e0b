// Built-in opponent: a stateless decision function over a board snapshot.
//
// Priority order: take an immediate win, block the opponent's immediate
// win, otherwise prefer the column closest to the center (ties to the lower
// index). The lookahead runs on throwaway clones of the board, so this
// module never mutates live room state.

use cuatro_protocol::Mark;

use crate::board::{Board, COLS};

/// Choose a column for `ai_mark`, or `None` if the board is full. Callers
/// check fullness before invoking, so `None` means they broke the contract.
pub fn choose_column(board: &Board, ai_mark: Mark) -> Option<usize> {
    let valid = board.valid_columns();
    if valid.is_empty() {
        return None;
    }

    // 1. Win now if possible.
    if let Some(col) = winning_column(board, &valid, ai_mark) {
        return Some(col);
    }

    // 2. Block the opponent's win-in-one.
    if let Some(col) = winning_column(board, &valid, ai_mark.other()) {
        return Some(col);
    }

    // 3. Center preference; ties break toward the lower index.
    valid.into_iter().min_by_key(|&c| (c.abs_diff(COLS / 2), c))
}

/// First column (ascending) where dropping `mark` wins immediately.
fn winning_column(board: &Board, valid: &[usize], mark: Mark) -> Option<usize> {
    for &col in valid {
        let mut probe = board.clone();
        if let Ok(row) = probe.drop_piece(col, mark) {
            if probe.check_win(row, col) == mark {
                return Some(col);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ROWS;

    #[test]
    fn opening_move_is_the_center() {
        let board = Board::new();
        assert_eq!(choose_column(&board, Mark::B), Some(3));
    }

    #[test]
    fn center_tie_breaks_to_lower_index() {
        let mut board = Board::new();
        for _ in 0..ROWS {
            board.drop_piece(3, Mark::A).unwrap();
        }
        // Columns 2 and 4 are equidistant from the center; 2 wins the tie.
        assert_eq!(choose_column(&board, Mark::B), Some(2));
    }

    #[test]
    fn takes_an_immediate_win() {
        let mut board = Board::new();
        for _ in 0..3 {
            board.drop_piece(5, Mark::B).unwrap();
        }
        assert_eq!(choose_column(&board, Mark::B), Some(5));
    }

    #[test]
    fn blocks_the_opponents_win() {
        let mut board = Board::new();
        for _ in 0..3 {
            board.drop_piece(6, Mark::A).unwrap();
        }
        assert_eq!(choose_column(&board, Mark::B), Some(6));
    }

    #[test]
    fn winning_beats_blocking() {
        let mut board = Board::new();
        for _ in 0..3 {
            board.drop_piece(0, Mark::A).unwrap();
            board.drop_piece(6, Mark::B).unwrap();
        }
        // Both sides have three in a column; the policy wins instead of blocking.
        assert_eq!(choose_column(&board, Mark::B), Some(6));
    }

    #[test]
    fn no_move_on_a_full_board() {
        let mut board = Board::new();
        for col in 0..7 {
            for row in (0..ROWS).rev() {
                let mark = if ((row / 2) + col) % 2 == 0 {
                    Mark::A
                } else {
                    Mark::B
                };
                board.drop_piece(col, mark).unwrap();
            }
        }
        assert_eq!(choose_column(&board, Mark::B), None);
    }
}
