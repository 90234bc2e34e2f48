// Connection handling module
// Accepts a TCP connection and serves it with the request router

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;

use super::signal::SignalHandler;
use crate::config::{AppState, PerformanceConfig};
use crate::handler;

/// Accept and process a connection, enforcing the connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
/// * `signals` - Shutdown coordination
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    signals: &Arc<SignalHandler>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            );
            drop(stream);
            return;
        }
    }

    tracing::trace!("Accepted connection from {peer_addr}");

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        Arc::clone(signals),
    );
}

/// Serve one connection in a spawned task.
///
/// HTTP/1.1 with optional keep-alive. The whole connection is bounded by
/// `max(read_timeout, write_timeout)`; on shutdown in-flight requests finish
/// and the connection is closed. The counter is decremented when done.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    signals: Arc<SignalHandler>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let perf = &state.config.performance;
        let timeout_duration = Duration::from_secs(perf.read_timeout.max(perf.write_timeout));
        let mut builder = http1::Builder::new();
        match idle_timeout(perf) {
            Some(idle) => {
                builder
                    .keep_alive(true)
                    .timer(TokioTimer::new())
                    .header_read_timeout(idle);
            }
            None => {
                builder.keep_alive(false);
            }
        }

        let svc_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&svc_state), peer_addr)),
        );
        let shutdown = signals.shutdown.notified();
        tokio::pin!(conn, shutdown);

        // Shutdown may have fired before this task first ran
        shutdown.as_mut().enable();
        if signals.is_shutdown_requested() {
            conn.as_mut().graceful_shutdown();
        }

        let served = tokio::time::timeout(timeout_duration, async {
            tokio::select! {
                res = conn.as_mut() => res,
                () = &mut shutdown => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            }
        })
        .await;

        match served {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::debug!("Failed to serve connection from {peer_addr}: {err:?}"),
            Err(_) => tracing::warn!(
                "Connection from {peer_addr} timed out after {} seconds",
                timeout_duration.as_secs()
            ),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// How long a keep-alive connection may wait for the next request head
///
/// `keep_alive_timeout = 0` turns keep-alive off.
fn idle_timeout(perf: &PerformanceConfig) -> Option<Duration> {
    (perf.keep_alive_timeout > 0).then(|| Duration::from_secs(perf.keep_alive_timeout))
}
