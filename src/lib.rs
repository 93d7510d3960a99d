//! wasmserve - a static file HTTP server with WebAssembly support
//!
//! Serves files from a configured root directory, resolving Content-Type
//! from file extensions with `.wasm` mapped to `application/wasm`.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
