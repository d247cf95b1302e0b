// cuatro_server — multiplayer Connect-Four session server.
//
// This crate implements the game server behind the line-based JSON protocol
// in `cuatro_protocol`. Clients hold one TCP connection each, identify with
// HELLO, and then create, join, or spectate named rooms; a room seats two
// players (or one human against the built-in opponent) and any number of
// spectators.
//
// Module overview:
// - `board.rs`:    Pure Connect-Four grid: gravity drops, win scan through
//                  the placed cell, draw detection. No I/O, no locking.
// - `policy.rs`:   The built-in opponent's decision function (win, block,
//                  center preference).
// - `conn.rs`:     Shared, mutex-guarded write handle to one client stream;
//                  best-effort sends.
// - `room.rs`:     One game room behind one mutex — the authoritative board,
//                  seats, spectators, lifecycle, and broadcast fan-out.
// - `registry.rs`: Process-wide name claims and room lookup, behind its own
//                  independent lock.
// - `server.rs`:   TCP listener and the thread-per-connection dispatcher
//                  loop that ties the layers together.
//
// Dependencies: `cuatro_protocol` (shared message types and framing).
//
// The server can run as a standalone binary (`main.rs`) or be embedded in a
// test harness via the library API (`start_server`).

pub mod board;
pub mod conn;
pub mod policy;
pub mod registry;
pub mod room;
pub mod server;

pub use server::{ServerConfig, ServerHandle, start_server};
