// Protocol messages for client-server communication.
//
// Two enums define the full protocol vocabulary:
// - `Request`: sent by clients to the server.
// - `Response`: sent by the server to clients.
//
// Both are internally tagged on a `type` field with SCREAMING_SNAKE_CASE
// variant names, so the wire format is one self-describing JSON record per
// line: `{"type":"HELLO","name":"Ana"}`, `{"type":"MOVE","col":3}`, and so
// on. Decoding is strict: a missing field, a wrong field type ("col" not an
// integer), or an unknown `type` all fail at deserialization time and are
// reported back as a structured `ERROR` reply by the dispatcher — there are
// no ad hoc field-presence checks downstream.
//
// Supporting structs (`BoardSnapshot`, `RoomSummary`) are the payloads of
// the `BOARD` and `ROOMS` responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Mark;

/// Requests sent by a client to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Bind a display name to this connection (handshake).
    Hello { name: String },
    /// List all rooms and their membership.
    List,
    /// Create a room (lazily) and take a player seat in it.
    Create { room: String },
    /// Join a room as a player, creating it if absent.
    Join { room: String },
    /// Join a room as a spectator, creating it if absent.
    Spectate { room: String },
    /// Start the game in the caller's current room.
    Start,
    /// Create/claim a room and start a game against the built-in opponent.
    StartVsServer { room: String },
    /// Clear the board and return the current room to its pre-start state.
    Reset,
    /// Drop a piece in the given column.
    Move { col: i64 },
    /// Leave gracefully.
    Quit,
}

/// Responses sent by the server to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// Greeting sent once per connection, before any request.
    Welcome { msg: String },
    /// Handshake accepted.
    HelloOk { name: String },
    /// Any recoverable failure, protocol or room-state.
    Error { error: String },
    /// Reply to LIST.
    Rooms { rooms: Vec<RoomSummary> },
    /// The caller took a player seat.
    Joined { room: String, mark: Mark },
    /// The caller is now spectating.
    SpectateOk { room: String },
    /// Human-readable room event (join/leave/spectate notices).
    Info { msg: String },
    /// The game began; `turn` is always the A mark.
    Started {
        room: String,
        turn: Mark,
        vs_server: bool,
    },
    /// The room was reset by the named member.
    ResetOk { by: String },
    /// A move committed. `next` is absent when the move ended the game.
    MoveOk {
        by: String,
        col: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<Mark>,
    },
    /// Full room snapshot, broadcast after any state-changing operation.
    Board(BoardSnapshot),
    /// The game ended. `winner` 0 means draw; `by` names the final mover.
    GameOver {
        winner: Mark,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        by: Option<String>,
    },
    /// Acknowledges QUIT; the server closes the connection after this.
    Bye,
}

/// Full board state as broadcast in `BOARD` messages. Row 0 is the top of
/// the grid; pieces occupy the highest-index empty row of their column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub board: Vec<Vec<Mark>>,
    pub turn: Mark,
    pub players: BTreeMap<String, Mark>,
    pub spectators: Vec<String>,
    pub room: String,
    pub started: bool,
    pub ended: bool,
    pub winner: Mark,
}

/// One room's line in the `ROOMS` listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room: String,
    pub players: Vec<String>,
    pub spectators: Vec<String>,
    pub started: bool,
    pub ended: bool,
    pub vs_server: bool,
}
