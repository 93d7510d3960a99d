// Server module entry point
// Listener setup, connection handling, accept loop, and signal handling

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module file keeps the short name on disk
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use listener::bind;
pub use server_loop::run;
