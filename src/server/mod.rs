// Server module entry
// Accept loop, connection handling and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

// Re-export commonly used items
pub use listener::create_listener;
pub use signal::start_signal_handler;

/// Accept connections until the shutdown signal fires
///
/// Must run inside a `LocalSet`: connections are served with `spawn_local`.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(stream, peer_addr, &state);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = state.shutdown_signal.notified() => {
                logger::log_shutdown(state.active_connections.load(Ordering::SeqCst));
                return Ok(());
            }
        }
    }
}
