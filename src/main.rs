use std::sync::Arc;

use wasmserve::config::{AppState, Config};
use wasmserve::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    // Build the Tokio runtime, sizing the thread pool from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let addr = cfg.socket_addr()?;
    let state = Arc::new(
        AppState::new(cfg)
            .map_err(|e| format!("Server root is not accessible: {e}"))?,
    );

    // A bind failure (port in use, insufficient privilege) is fatal: the
    // error propagates out of main with a non-zero exit status.
    let listener =
        server::bind(addr).map_err(|e| format!("Failed to bind {addr}: {e}"))?;

    logger::log_server_start(&addr, &state.config, &state.root);

    let signals = Arc::new(server::signal::SignalHandler::new());
    server::signal::start_signal_handler(Arc::clone(&signals));

    server::run(listener, state, Arc::clone(&signals.shutdown)).await
}
