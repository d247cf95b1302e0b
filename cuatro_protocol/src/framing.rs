// Newline-delimited message framing.
//
// Provides the wire format for `message.rs` types: one UTF-8 JSON record per
// `\n`-terminated line. Both `write_line` and `read_line` operate on raw
// `&[u8]` / `Vec<u8>` — the caller handles JSON serialization separately,
// keeping this module format-agnostic.
//
// A `MAX_LINE_LEN` constant protects against unbounded allocation from a
// peer that never sends a newline. Board snapshots are the largest expected
// messages and stay well under a kilobyte.

use std::io::{self, BufRead, Write};

/// Maximum accepted line length (64 KB). No legitimate message comes close.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Write one message as a newline-terminated line and flush.
///
/// Fails with `InvalidInput` if the payload embeds a newline (it would be
/// read back as two messages) or exceeds `MAX_LINE_LEN`.
pub fn write_line<W: Write>(writer: &mut W, msg: &[u8]) -> io::Result<()> {
    if msg.len() > MAX_LINE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("message too large: {} bytes (max {MAX_LINE_LEN})", msg.len()),
        ));
    }
    if msg.contains(&b'\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "message contains embedded newline",
        ));
    }
    writer.write_all(msg)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read one newline-terminated line, without the terminator. A trailing
/// `\r` is stripped so CRLF peers work.
///
/// Returns `UnexpectedEof` if the stream closes (cleanly or mid-line) and
/// `InvalidData` if the line exceeds `MAX_LINE_LEN`.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream closed",
            ));
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(newline_at) => {
                line.extend_from_slice(&available[..newline_at]);
                reader.consume(newline_at + 1);
                if line.len() > MAX_LINE_LEN {
                    return Err(line_too_long(line.len()));
                }
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(line);
            }
            None => {
                let taken = available.len();
                line.extend_from_slice(available);
                reader.consume(taken);
                if line.len() > MAX_LINE_LEN {
                    return Err(line_too_long(line.len()));
                }
            }
        }
    }
}

fn line_too_long(len: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("line too long: {len} bytes (max {MAX_LINE_LEN})"),
    )
}
