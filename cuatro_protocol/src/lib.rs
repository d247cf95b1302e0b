// cuatro_protocol — wire protocol for the Cuatro game server.
//
// This crate defines the message types, framing, and serialization used by
// the session server (`cuatro_server`) and its clients to communicate over
// TCP. It is shared between both sides and has no dependency on the game
// logic.
//
// Module overview:
// - `types.rs`:    The `Mark` newtype — cell/seat/turn/winner encoding.
// - `message.rs`:  Client-to-server and server-to-client message enums, plus
//                  the `BOARD`/`ROOMS` payload structs.
// - `framing.rs`:  Newline-delimited framing over any `BufRead`/`Write`
//                  stream: one UTF-8 JSON record per line.
//
// Design decisions:
// - **JSON-per-line serialization.** This is the existing wire format the
//   clients speak; every record is self-describing via its `type` field.
// - **Closed tagged enums.** Unknown request types, missing fields, and
//   wrongly-typed fields all fail at decode time, so the server never
//   inspects dynamic payloads.
// - **No async runtime.** Framing works on plain `std::io` traits,
//   compatible with blocking TCP streams and buffered wrappers.

pub mod framing;
pub mod message;
pub mod types;

pub use framing::{MAX_LINE_LEN, read_line, write_line};
pub use message::{BoardSnapshot, Request, Response, RoomSummary};
pub use types::Mark;

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Cursor;

    use serde_json::{Value, json};

    use super::*;

    /// Serialize a Request to JSON, frame it, read it back, deserialize.
    fn request_roundtrip(msg: &Request) {
        let json = serde_json::to_vec(msg).unwrap();
        let mut wire = Vec::new();
        write_line(&mut wire, &json).unwrap();

        let mut cursor = Cursor::new(&wire);
        let recovered_json = read_line(&mut cursor).unwrap();
        let recovered: Request = serde_json::from_slice(&recovered_json).unwrap();
        assert_eq!(&recovered, msg);
    }

    #[test]
    fn roundtrip_requests() {
        request_roundtrip(&Request::Hello { name: "Ana".into() });
        request_roundtrip(&Request::List);
        request_roundtrip(&Request::Join { room: "r1".into() });
        request_roundtrip(&Request::StartVsServer { room: "solo".into() });
        request_roundtrip(&Request::Move { col: 3 });
        request_roundtrip(&Request::Quit);
    }

    #[test]
    fn roundtrip_board_response() {
        let snapshot = BoardSnapshot {
            board: vec![vec![Mark::EMPTY; 7]; 6],
            turn: Mark::A,
            players: BTreeMap::from([("Ana".to_string(), Mark::A)]),
            spectators: vec!["Caro".into()],
            room: "r1".into(),
            started: true,
            ended: false,
            winner: Mark::EMPTY,
        };
        let msg = Response::Board(snapshot);
        let json = serde_json::to_vec(&msg).unwrap();
        let recovered: Response = serde_json::from_slice(&json).unwrap();
        assert_eq!(recovered, msg);
    }

    // The wire shapes below are the original protocol; existing clients
    // depend on these exact field names and tag spellings.

    #[test]
    fn request_wire_shapes() {
        let hello: Request = serde_json::from_str(r#"{"type":"HELLO","name":"Ana"}"#).unwrap();
        assert_eq!(hello, Request::Hello { name: "Ana".into() });

        let mv: Request = serde_json::from_str(r#"{"type":"MOVE","col":3}"#).unwrap();
        assert_eq!(mv, Request::Move { col: 3 });

        let vs: Request = serde_json::from_str(r#"{"type":"START_VS_SERVER","room":"solo"}"#).unwrap();
        assert_eq!(vs, Request::StartVsServer { room: "solo".into() });

        let quit: Request = serde_json::from_str(r#"{"type":"QUIT"}"#).unwrap();
        assert_eq!(quit, Request::Quit);
    }

    #[test]
    fn unknown_request_type_fails_decode() {
        assert!(serde_json::from_str::<Request>(r#"{"type":"FLY"}"#).is_err());
    }

    #[test]
    fn mistyped_field_fails_decode() {
        // "column not an integer" is a protocol error, caught at decode time.
        assert!(serde_json::from_str::<Request>(r#"{"type":"MOVE","col":"three"}"#).is_err());
    }

    #[test]
    fn missing_field_fails_decode() {
        assert!(serde_json::from_str::<Request>(r#"{"type":"HELLO"}"#).is_err());
    }

    #[test]
    fn response_wire_shapes() {
        let started = serde_json::to_value(Response::Started {
            room: "r1".into(),
            turn: Mark::A,
            vs_server: false,
        })
        .unwrap();
        assert_eq!(
            started,
            json!({"type":"STARTED","room":"r1","turn":1,"vs_server":false})
        );

        let move_ok = serde_json::to_value(Response::MoveOk {
            by: "Ana".into(),
            col: 3,
            next: Some(Mark::B),
        })
        .unwrap();
        assert_eq!(move_ok, json!({"type":"MOVE_OK","by":"Ana","col":3,"next":2}));

        let game_over = serde_json::to_value(Response::GameOver {
            winner: Mark::EMPTY,
            by: None,
        })
        .unwrap();
        assert_eq!(game_over, json!({"type":"GAME_OVER","winner":0}));
    }

    #[test]
    fn move_ok_next_omitted_when_game_ends() {
        let value = serde_json::to_value(Response::MoveOk {
            by: "Ana".into(),
            col: 6,
            next: None,
        })
        .unwrap();
        assert!(value.get("next").is_none());
    }

    #[test]
    fn board_snapshot_serializes_marks_as_integers() {
        let snapshot = BoardSnapshot {
            board: vec![vec![Mark::A, Mark::B, Mark::EMPTY]],
            turn: Mark::B,
            players: BTreeMap::new(),
            spectators: Vec::new(),
            room: "r1".into(),
            started: false,
            ended: false,
            winner: Mark::EMPTY,
        };
        let value = serde_json::to_value(Response::Board(snapshot)).unwrap();
        assert_eq!(value["type"], Value::from("BOARD"));
        assert_eq!(value["board"], json!([[1, 2, 0]]));
        assert_eq!(value["turn"], Value::from(2));
    }

    #[test]
    fn mark_other_swaps_players() {
        assert_eq!(Mark::A.other(), Mark::B);
        assert_eq!(Mark::B.other(), Mark::A);
        assert_eq!(Mark::EMPTY.other(), Mark::EMPTY);
    }
}
