// Server loop module
// Accepts connections until a shutdown notification arrives

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Run the accept loop until `shutdown` is notified.
///
/// Each accepted connection is handed to `accept_connection`, which serves
/// it in its own task; accept errors are logged and the loop continues.
/// Returns `Ok(())` on shutdown so the process can exit with status 0.
pub async fn run(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> Result<(), Box<dyn std::error::Error>> {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                logger::log_shutdown();
                return Ok(());
            }
        }
    }
}
