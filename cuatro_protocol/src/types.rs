// Core wire types for the Cuatro protocol.
//
// `Mark` is the single shared identifier for board cells, player seats, turn
// ownership, and the winner field. It is a newtype over the original wire
// encoding rather than a Rust enum so that it serializes as the bare integer
// every existing client expects: 0 empty, 1 player A, 2 player B. In
// `GAME_OVER` messages, 0 doubles as "draw".

use serde::{Deserialize, Serialize};

/// A cell or seat mark. Bare integer on the wire: 0 empty, 1 A, 2 B.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mark(pub u8);

impl Mark {
    pub const EMPTY: Mark = Mark(0);
    pub const A: Mark = Mark(1);
    pub const B: Mark = Mark(2);

    /// The opposing player's mark. `EMPTY` maps to itself.
    pub fn other(self) -> Mark {
        match self.0 {
            1 => Mark::B,
            2 => Mark::A,
            _ => self,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Mark::EMPTY
    }
}
