// CLI entry point for the Cuatro game server.
//
// Starts a standalone server that clients connect to over TCP, one JSON
// record per line. See `server.rs` for the networking architecture and
// `room.rs` for the game rules enforcement.
//
// Usage:
//   cuatro-server [OPTIONS]
//     --host <HOST>    Bind address (default: 0.0.0.0)
//     --port <PORT>    Listen port (default: 65432)

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cuatro_server::server::{ServerConfig, start_server};

fn main() {
    init_logging();
    let config = parse_args();

    // The handle is held for the life of the process; dropping it would not
    // stop the server, but keeping it makes the ownership explicit.
    let (_handle, addr) = match start_server(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            std::process::exit(1);
        }
    };

    println!("Cuatro server listening on {addr}");
    println!("Press Ctrl+C to stop.");

    // The accept loop runs on a background thread; park here until the
    // process is killed. SIGINT/SIGTERM terminate it, which is fine for a
    // stateless game server.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(3600));
    }
}

/// Will panic on error.
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");
}

/// Parse command-line arguments into a `ServerConfig`. Uses simple
/// `std::env::args()` matching — no clap dependency.
fn parse_args() -> ServerConfig {
    let mut config = ServerConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                i += 1;
                config.host = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--host requires a value");
                    std::process::exit(1);
                });
            }
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_usage() {
    println!("Usage: cuatro-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --host <HOST>    Bind address (default: 0.0.0.0)");
    println!("  --port <PORT>    Listen port (default: 65432)");
    println!("  --help, -h       Show this help");
}
