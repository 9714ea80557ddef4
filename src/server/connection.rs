// Connection handling module
// Accepts a TCP connection and serves it with hyper on the local task set

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::api;
use crate::config::AppState;
use crate::logger;

/// Claim a connection slot, respecting the optional limit
///
/// Increments first, then checks, rolling back when over the limit.
pub fn reserve_slot(counter: &AtomicUsize, max_connections: Option<u64>) -> bool {
    let prev_count = counter.fetch_add(1, Ordering::SeqCst);
    match max_connections {
        Some(max) if prev_count >= usize::try_from(max).unwrap_or(usize::MAX) => {
            counter.fetch_sub(1, Ordering::SeqCst);
            false
        }
        _ => true,
    }
}

/// Accept a connection, enforcing the connection limit
pub fn accept_connection(stream: TcpStream, peer_addr: SocketAddr, state: &Arc<AppState>) {
    let max_connections = state.config.performance.max_connections;
    if !reserve_slot(&state.active_connections, max_connections) {
        logger::log_warning(&format!(
            "Max connections reached ({}). Connection from {peer_addr} rejected.",
            max_connections.unwrap_or_default()
        ));
        drop(stream);
        return;
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Serve one connection in a spawned local task.
///
/// The whole connection, keep-alive requests included, is bounded by the
/// larger of the read and write timeouts.
fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);
        let perf = &state.config.performance;
        let timeout_duration =
            Duration::from_secs(std::cmp::max(perf.read_timeout, perf.write_timeout));

        let mut builder = http1::Builder::new();
        builder.keep_alive(perf.keep_alive);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                api::handle_request(req, Arc::clone(&service_state), peer_addr)
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}
