// One game room: the authoritative board, seats, spectators, turn, and
// lifecycle flags, plus the broadcast fan-out to its members.
//
// The room is the single point of serialization for a game. Every public
// operation takes the room's mutex for its whole duration, so read-then-
// write sequences (turn check + drop + win check) are atomic and no client
// ever observes a half-applied move. Locks are never nested: room
// operations touch nothing but their own state and the members' `Conn`
// handles, whose sends are best-effort and bounded by the stream's write
// timeout.
//
// The built-in opponent runs inline: when a committed human move hands the
// turn to the automated mark, the reply is computed and committed inside
// the same critical section, so members always see board states with at
// most one pending automated response. It never recurses — after an
// automated move the turn is back with the human.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use rand::seq::SliceRandom;
use tracing::{debug, info};

use cuatro_protocol::Mark;
use cuatro_protocol::message::{BoardSnapshot, Response, RoomSummary};

use crate::board::{Board, COLS};
use crate::conn::Conn;
use crate::policy;

/// Display name the automated opponent signs its moves with.
pub const SERVER_PLAYER: &str = "SERVER_AI";

/// Failure modes of room operations. Each becomes an `ERROR` reply to the
/// offending client; room state is unchanged on every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomError {
    AlreadyPresent,
    RoomFull,
    RoomOccupied,
    NotEnoughPlayers,
    AlreadyStarted,
    NotStarted,
    AlreadyEnded,
    NotAPlayer,
    NotYourTurn,
    InvalidColumn,
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoomError::AlreadyPresent => "already in this room",
            RoomError::RoomFull => "room already has two players",
            RoomError::RoomOccupied => "room is occupied",
            RoomError::NotEnoughPlayers => "not enough players",
            RoomError::AlreadyStarted => "game already started",
            RoomError::NotStarted => "game not started",
            RoomError::AlreadyEnded => "game already ended",
            RoomError::NotAPlayer => "you are not a player in this room",
            RoomError::NotYourTurn => "not your turn",
            RoomError::InvalidColumn => "invalid column",
        })
    }
}

/// A seated player: identity, write handle, and assigned mark.
struct Seat {
    name: String,
    conn: Conn,
    mark: Mark,
}

struct RoomState {
    board: Board,
    /// Player seats in join order; at most two.
    seats: Vec<Seat>,
    spectators: BTreeMap<String, Conn>,
    turn: Mark,
    started: bool,
    ended: bool,
    winner: Mark,
    /// Seat B is occupied by the built-in opponent.
    vs_server: bool,
}

pub struct Room {
    name: String,
    state: Mutex<RoomState>,
}

impl Room {
    pub fn new(name: String) -> Self {
        Self {
            name,
            state: Mutex::new(RoomState {
                board: Board::new(),
                seats: Vec::new(),
                spectators: BTreeMap::new(),
                turn: Mark::A,
                started: false,
                ended: false,
                winner: Mark::EMPTY,
                vs_server: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Take a player seat. The joiner receives `JOINED`, then the whole room
    /// (joiner included) gets an `INFO` notice and a fresh snapshot.
    pub fn join(&self, name: &str, conn: Conn) -> Result<Mark, RoomError> {
        let mut state = self.lock();
        if state.is_present(name) {
            return Err(RoomError::AlreadyPresent);
        }
        // A vs-server room has one human seat; the opponent holds the other.
        let seat_limit = if state.vs_server { 1 } else { 2 };
        if state.seats.len() >= seat_limit {
            return Err(RoomError::RoomFull);
        }
        let mark = if state.seats.iter().any(|s| s.mark == Mark::A) {
            Mark::B
        } else {
            Mark::A
        };
        conn.send(&Response::Joined {
            room: self.name.clone(),
            mark,
        });
        state.seats.push(Seat {
            name: name.to_string(),
            conn,
            mark,
        });
        info!(room = %self.name, player = name, mark = mark.0, "player joined");
        state.broadcast_all(&Response::Info {
            msg: format!("{name} joined as a player."),
        });
        state.broadcast_snapshot(&self.name);
        Ok(mark)
    }

    /// Watch the game. The spectator gets `SPECTATE_OK` and a private
    /// snapshot; the room gets an `INFO` notice.
    pub fn spectate(&self, name: &str, conn: Conn) -> Result<(), RoomError> {
        let mut state = self.lock();
        if state.is_present(name) {
            return Err(RoomError::AlreadyPresent);
        }
        conn.send(&Response::SpectateOk {
            room: self.name.clone(),
        });
        state.spectators.insert(name.to_string(), conn.clone());
        info!(room = %self.name, spectator = name, "spectator joined");
        state.broadcast_all(&Response::Info {
            msg: format!("{name} is spectating."),
        });
        conn.send(&Response::Board(state.snapshot(&self.name)));
        Ok(())
    }

    /// Begin the game: turn goes to A, lifecycle becomes active. Requires
    /// two humans, or at least one in a vs-server room. A finished game
    /// cannot be restarted without a reset.
    pub fn start(&self) -> Result<(), RoomError> {
        let mut state = self.lock();
        if state.started {
            return Err(RoomError::AlreadyStarted);
        }
        let enough = if state.vs_server {
            !state.seats.is_empty()
        } else {
            state.seats.len() == 2
        };
        if !enough {
            return Err(RoomError::NotEnoughPlayers);
        }
        state.begin(&self.name);
        Self::automated_move(&self.name, &mut state);
        Ok(())
    }

    /// Claim an empty room for a game against the built-in opponent: the
    /// caller is seated as A, the room is flagged vs-server, and the game
    /// starts immediately.
    pub fn start_vs_server(&self, name: &str, conn: Conn) -> Result<(), RoomError> {
        let mut state = self.lock();
        if state.started {
            return Err(RoomError::AlreadyStarted);
        }
        if state.spectators.contains_key(name) {
            return Err(RoomError::AlreadyPresent);
        }
        if state.vs_server || !state.seats.is_empty() {
            return Err(RoomError::RoomOccupied);
        }
        state.seats.push(Seat {
            name: name.to_string(),
            conn,
            mark: Mark::A,
        });
        state.vs_server = true;
        info!(room = %self.name, player = name, "vs-server game");
        state.begin(&self.name);
        Self::automated_move(&self.name, &mut state);
        Ok(())
    }

    /// Drop a piece for `name`. On success the move is committed (win, draw,
    /// or turn flip) and, if the turn passed to the automated mark, the
    /// opponent's reply is committed inside the same critical section.
    pub fn make_move(&self, name: &str, col: i64) -> Result<(), RoomError> {
        let mut state = self.lock();
        let mark = state
            .seats
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.mark)
            .ok_or(RoomError::NotAPlayer)?;
        if !state.started {
            return Err(RoomError::NotStarted);
        }
        if state.ended {
            return Err(RoomError::AlreadyEnded);
        }
        if mark != state.turn {
            return Err(RoomError::NotYourTurn);
        }
        let col = usize::try_from(col)
            .ok()
            .filter(|&c| c < COLS)
            .ok_or(RoomError::InvalidColumn)?;
        let row = state
            .board
            .drop_piece(col, mark)
            .map_err(|_| RoomError::InvalidColumn)?;
        debug!(room = %self.name, player = name, col, row, "move");
        Self::commit_move(&self.name, &mut state, name, col, row, mark);
        Self::automated_move(&self.name, &mut state);
        Ok(())
    }

    /// Clear the board and return to the pre-start state, keeping membership
    /// and the vs-server flag. Any member may request this at any time.
    pub fn reset(&self, by: &str) {
        let mut state = self.lock();
        state.board = Board::new();
        state.started = false;
        state.ended = false;
        state.winner = Mark::EMPTY;
        state.turn = Mark::A;
        info!(room = %self.name, by, "room reset");
        state.broadcast_all(&Response::ResetOk { by: by.to_string() });
        state.broadcast_snapshot(&self.name);
    }

    /// Remove `name` from whichever role it holds. A departing player's
    /// seat stays vacant for this room instance; the game is not ended.
    /// Returns true if the identity was a member.
    pub fn leave(&self, name: &str) -> bool {
        let mut state = self.lock();
        let mut removed = false;
        if let Some(i) = state.seats.iter().position(|s| s.name == name) {
            state.seats.remove(i);
            state.broadcast_all(&Response::Info {
                msg: format!("{name} left."),
            });
            removed = true;
        }
        if state.spectators.remove(name).is_some() {
            state.broadcast_all(&Response::Info {
                msg: format!("{name} stopped spectating."),
            });
            removed = true;
        }
        if removed {
            info!(room = %self.name, member = name, "member left");
            state.broadcast_snapshot(&self.name);
        }
        removed
    }

    /// Membership and lifecycle line for the `ROOMS` listing.
    pub fn summary(&self) -> RoomSummary {
        let state = self.lock();
        RoomSummary {
            room: self.name.clone(),
            players: state.seats.iter().map(|s| s.name.clone()).collect(),
            spectators: state.spectators.keys().cloned().collect(),
            started: state.started,
            ended: state.ended,
            vs_server: state.vs_server,
        }
    }

    /// Win/draw/turn-flip bookkeeping and broadcasts for a piece already
    /// placed at `(row, col)` by `mark`.
    fn commit_move(room: &str, state: &mut RoomState, by: &str, col: usize, row: usize, mark: Mark) {
        let winner = state.board.check_win(row, col);
        if !winner.is_empty() {
            state.ended = true;
            state.winner = winner;
            info!(room, winner = winner.0, by, "game over");
            state.broadcast_all(&Response::MoveOk {
                by: by.to_string(),
                col,
                next: None,
            });
            state.broadcast_snapshot(room);
            state.broadcast_all(&Response::GameOver {
                winner,
                by: Some(by.to_string()),
            });
            return;
        }
        if state.board.is_full() {
            state.ended = true;
            state.winner = Mark::EMPTY;
            info!(room, by, "game over (draw)");
            state.broadcast_all(&Response::MoveOk {
                by: by.to_string(),
                col,
                next: None,
            });
            state.broadcast_snapshot(room);
            state.broadcast_all(&Response::GameOver {
                winner: Mark::EMPTY,
                by: None,
            });
            return;
        }
        state.turn = mark.other();
        state.broadcast_all(&Response::MoveOk {
            by: by.to_string(),
            col,
            next: Some(state.turn),
        });
        state.broadcast_snapshot(room);
    }

    /// Run the built-in opponent if it holds the turn. Called with the room
    /// lock already held, right after the operation that handed it the turn.
    fn automated_move(room: &str, state: &mut RoomState) {
        if !state.vs_server || !state.started || state.ended || state.turn != Mark::B {
            return;
        }
        let Some(chosen) = policy::choose_column(&state.board, Mark::B) else {
            return;
        };
        let (col, row) = match state.board.drop_piece(chosen, Mark::B) {
            Ok(row) => (chosen, row),
            Err(_) => {
                // Stale choice: fall back to any remaining playable column.
                let valid = state.board.valid_columns();
                let Some(&fallback) = valid.choose(&mut rand::thread_rng()) else {
                    return;
                };
                match state.board.drop_piece(fallback, Mark::B) {
                    Ok(row) => (fallback, row),
                    Err(_) => return,
                }
            }
        };
        debug!(room, col, row, "automated move");
        Self::commit_move(room, state, SERVER_PLAYER, col, row, Mark::B);
    }

    fn lock(&self) -> MutexGuard<'_, RoomState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl RoomState {
    fn is_present(&self, name: &str) -> bool {
        self.seats.iter().any(|s| s.name == name) || self.spectators.contains_key(name)
    }

    /// Shared tail of `start` and `start_vs_server`.
    fn begin(&mut self, room: &str) {
        self.started = true;
        self.turn = Mark::A;
        info!(room, vs_server = self.vs_server, "game started");
        self.broadcast_all(&Response::Started {
            room: room.to_string(),
            turn: self.turn,
            vs_server: self.vs_server,
        });
        self.broadcast_snapshot(room);
    }

    fn snapshot(&self, room: &str) -> BoardSnapshot {
        BoardSnapshot {
            board: self.board.rows(),
            turn: self.turn,
            players: self
                .seats
                .iter()
                .map(|s| (s.name.clone(), s.mark))
                .collect(),
            spectators: self.spectators.keys().cloned().collect(),
            room: room.to_string(),
            started: self.started,
            ended: self.ended,
            winner: self.winner,
        }
    }

    /// Best-effort fan-out to every player and spectator. A failed send to
    /// one recipient never aborts delivery to the rest.
    fn broadcast_all(&self, response: &Response) {
        for seat in &self.seats {
            seat.conn.send(response);
        }
        for conn in self.spectators.values() {
            conn.send(response);
        }
    }

    fn broadcast_snapshot(&self, room: &str) {
        self.broadcast_all(&Response::Board(self.snapshot(room)));
    }
}
