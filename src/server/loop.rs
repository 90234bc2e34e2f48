// Server loop module
// Accepts connections until shutdown, then drains in-flight connections

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::SignalHandler;
use crate::config::AppState;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop on `listener` until `signals` requests shutdown
///
/// Returns once every connection has finished or `shutdown_timeout` elapsed.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    signals: Arc<SignalHandler>,
) -> std::io::Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let shutdown = signals.shutdown.notified();
    tokio::pin!(shutdown);

    if !signals.is_shutdown_requested() {
        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            accept_connection(stream, peer_addr, &state, &active_connections, &signals);
                        }
                        Err(e) => tracing::error!("Failed to accept connection: {e}"),
                    }
                }
                () = &mut shutdown => break,
            }
        }
    }

    let local_addr = listener.local_addr()?;
    drop(listener);
    tracing::info!("Stopped accepting on {local_addr}, draining connections");

    let timeout = Duration::from_secs(state.config.performance.shutdown_timeout);
    if drain_connections(&active_connections, timeout).await {
        tracing::info!("All connections closed");
    } else {
        tracing::warn!(
            "Shutdown timeout after {}s with {} connections still open",
            timeout.as_secs(),
            active_connections.load(Ordering::SeqCst)
        );
    }
    Ok(())
}

/// Wait until the active connection count reaches zero or `timeout` passes
async fn drain_connections(active: &AtomicUsize, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while active.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
    true
}
