// TCP listener and per-client dispatcher for the game server.
//
// Architecture: thread-per-connection over shared state.
//
// - **Accept loop** (background thread): accepts TCP connections and spawns
//   one dispatcher thread per client. The listener is non-blocking so the
//   loop can check `keep_running` periodically.
// - **Dispatcher threads** (one per client): greet the client, then call
//   `framing::read_line()` in a loop, deserialize `Request`, and apply it to
//   the shared `Registry`/`Room` state. Each request runs to completion
//   (including every reply and broadcast it causes) before the next line is
//   read.
// - **Shared state**: one `Registry` (names + rooms) and one mutex per room.
//   Writes to a client go through its `Conn` handle, so a dispatcher thread
//   and a broadcasting room never race on the same stream.
//
// Shutdown: the accept loop checks a `keep_running` flag (set to false by
// `ServerHandle::stop`) and exits. Dispatcher threads end when their client
// disconnects.

use std::io::{BufReader, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use cuatro_protocol::framing::read_line;
use cuatro_protocol::message::{Request, Response};

use crate::conn::Conn;
use crate::registry::Registry;
use crate::room::{Room, RoomError};

/// Upper bound on one blocked `send` while a room lock is held.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

const WELCOME_MSG: &str = "Welcome to the Cuatro server. Send HELLO with your name to begin.";

/// Handle returned by `start_server` to control the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Signal the accept loop to stop and wait for it to shut down. Live
    /// client connections are not torn down; their threads exit when the
    /// peers disconnect.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 65432,
        }
    }
}

/// Start the server on a background thread. Returns a handle for stopping
/// it and the actual bound address (useful when port 0 is used to let the
/// OS pick a free port).
pub fn start_server(config: ServerConfig) -> std::io::Result<(ServerHandle, SocketAddr)> {
    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port))?;
    let addr = listener.local_addr()?;
    info!(%addr, "listening");
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::spawn(move || {
        run_server(listener, keep_running_clone);
    });

    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Accept loop. Runs until `keep_running` is set to false.
fn run_server(listener: TcpListener, keep_running: Arc<AtomicBool>) {
    let registry = Arc::new(Registry::new());

    // Non-blocking listener so the loop can check keep_running periodically.
    listener.set_nonblocking(true).ok();

    while keep_running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                stream.set_nonblocking(false).ok();
                stream.set_write_timeout(Some(SEND_TIMEOUT)).ok();
                info!(peer = %addr, "client connected");
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    client_loop(stream, registry);
                });
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                break;
            }
        }
    }
}

/// Dispatcher loop for a single client. Runs in its own thread from greeting
/// to cleanup.
fn client_loop(stream: TcpStream, registry: Arc<Registry>) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });
    let conn = Conn::new(stream);
    conn.send(&Response::Welcome {
        msg: WELCOME_MSG.to_string(),
    });

    let mut session = ClientSession {
        registry,
        conn,
        identity: None,
        current_room: None,
    };

    loop {
        let bytes = match read_line(&mut reader) {
            Ok(bytes) => bytes,
            Err(_) => break,
        };
        let request: Request = match serde_json::from_slice(&bytes) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "malformed request");
                session.error("malformed request");
                continue;
            }
        };
        if !session.dispatch(request) {
            break;
        }
    }

    session.cleanup();
}

/// Per-connection dispatcher state: the claimed identity and the room the
/// client most recently entered, as a player or a spectator.
struct ClientSession {
    registry: Arc<Registry>,
    conn: Conn,
    identity: Option<String>,
    current_room: Option<Arc<Room>>,
}

impl ClientSession {
    /// Apply one request. Returns false when the connection should close.
    fn dispatch(&mut self, request: Request) -> bool {
        match request {
            Request::Hello { name } => {
                self.handle_hello(&name);
                true
            }
            Request::Quit => {
                self.conn.send(&Response::Bye);
                false
            }
            // Everything else requires an identity.
            request => {
                let Some(name) = self.identity.clone() else {
                    self.error("say HELLO first");
                    return true;
                };
                match request {
                    Request::List => self.handle_list(),
                    Request::Create { room } | Request::Join { room } => {
                        self.handle_join(&name, &room);
                    }
                    Request::Spectate { room } => self.handle_spectate(&name, &room),
                    Request::StartVsServer { room } => self.handle_start_vs_server(&name, &room),
                    Request::Start => self.in_current_room(|room| room.start()),
                    Request::Reset => {
                        if let Some(room) = &self.current_room {
                            room.reset(&name);
                        } else {
                            self.error("not in a room");
                        }
                    }
                    Request::Move { col } => {
                        self.in_current_room(|room| room.make_move(&name, col));
                    }
                    Request::Hello { .. } | Request::Quit => unreachable!(),
                }
                true
            }
        }
    }

    fn handle_hello(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.error("name must not be empty");
            return;
        }
        if self.identity.is_some() {
            self.error("already identified");
            return;
        }
        if !self.registry.claim_name(name) {
            self.error("name already in use");
            return;
        }
        info!(player = name, "identified");
        self.identity = Some(name.to_string());
        self.conn.send(&Response::HelloOk {
            name: name.to_string(),
        });
    }

    fn handle_list(&self) {
        let mut rooms: Vec<_> = self
            .registry
            .rooms_snapshot()
            .iter()
            .map(|room| room.summary())
            .collect();
        rooms.sort_by(|a, b| a.room.cmp(&b.room));
        self.conn.send(&Response::Rooms { rooms });
    }

    fn handle_join(&mut self, name: &str, room_name: &str) {
        let room = self.registry.get_or_create_room(room_name);
        match room.join(name, self.conn.clone()) {
            Ok(_) => self.current_room = Some(room),
            Err(e) => self.error(&e.to_string()),
        }
    }

    fn handle_spectate(&mut self, name: &str, room_name: &str) {
        let room = self.registry.get_or_create_room(room_name);
        match room.spectate(name, self.conn.clone()) {
            Ok(()) => self.current_room = Some(room),
            Err(e) => self.error(&e.to_string()),
        }
    }

    fn handle_start_vs_server(&mut self, name: &str, room_name: &str) {
        let room = self.registry.get_or_create_room(room_name);
        match room.start_vs_server(name, self.conn.clone()) {
            Ok(()) => self.current_room = Some(room),
            Err(e) => self.error(&e.to_string()),
        }
    }

    /// Run `op` against the room the client is seated in, reporting failures
    /// as `ERROR` replies.
    fn in_current_room(&self, op: impl FnOnce(&Room) -> Result<(), RoomError>) {
        match &self.current_room {
            Some(room) => {
                if let Err(e) = op(room) {
                    self.error(&e.to_string());
                }
            }
            None => self.error("not in a room"),
        }
    }

    fn error(&self, msg: &str) {
        self.conn.send(&Response::Error {
            error: msg.to_string(),
        });
    }

    /// Disconnect path: leave every room the identity is a member of and
    /// free the name. Safe to run for a client that never said HELLO.
    fn cleanup(&mut self) {
        let Some(name) = self.identity.take() else {
            return;
        };
        for room in self.registry.rooms_snapshot() {
            room.leave(&name);
        }
        self.registry.release_name(&name);
        info!(player = %name, "disconnected");
    }
}
