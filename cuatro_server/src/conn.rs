// Shared write handle for one client connection.
//
// The connection's own dispatcher thread and any room broadcasting to the
// client write through the same TCP stream, so the buffered writer sits
// behind a mutex. Sends are best-effort: a dead or stalled peer must never
// abort a broadcast or fail a room operation, so errors are logged and
// swallowed. The peer's own reader loop notices the broken transport and
// runs the cleanup path. The stream carries an OS write timeout (set at accept
// time) so a blocked send cannot hold a room lock indefinitely.

use std::io::BufWriter;
use std::net::TcpStream;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use cuatro_protocol::framing::write_line;
use cuatro_protocol::message::Response;

/// Cloneable handle to a client's write half.
#[derive(Clone)]
pub struct Conn {
    writer: Arc<Mutex<BufWriter<TcpStream>>>,
    peer: String,
}

impl Conn {
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "<unknown>".into());
        Self {
            writer: Arc::new(Mutex::new(BufWriter::new(stream))),
            peer,
        }
    }

    /// Serialize and send one response line, best-effort.
    pub fn send(&self, response: &Response) {
        let json = match serde_json::to_vec(response) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "unserializable response");
                return;
            }
        };
        let mut writer = self.lock_writer();
        if let Err(e) = write_line(&mut *writer, &json) {
            warn!(peer = %self.peer, error = %e, "dropping response to unreachable peer");
        }
    }

    /// A poisoned writer mutex only means another sender panicked mid-write;
    /// the stream is still the best transport we have for this peer.
    fn lock_writer(&self) -> MutexGuard<'_, BufWriter<TcpStream>> {
        match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
