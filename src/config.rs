use crate::http::mime::MimeRegistry;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served as the document root.
    pub root: String,
    pub workers: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub access_log_format: String,
    pub access_log_file: Option<String>,
    pub error_log_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Files probed in order when a directory is requested.
    pub index_files: Vec<String>,
    /// Generate an HTML listing for directories without an index file.
    pub directory_listing: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            // Double underscore separates nested keys so single underscores
            // inside field names (access_log) stay intact:
            // WASMSERVE_SERVER__PORT -> server.port
            .add_source(config::Environment::with_prefix("WASMSERVE").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 9000)?
            .set_default("server.root", ".")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.index_files", vec!["index.html", "index.htm"])?
            .set_default("http.directory_listing", true)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Immutable per-process state shared by all connection handlers.
///
/// Built once at startup and never mutated afterwards, so it can be shared
/// across tasks without synchronization.
pub struct AppState {
    pub config: Config,
    /// Canonicalized document root; all served paths must stay under it.
    pub root: PathBuf,
    pub mime: MimeRegistry,
}

impl AppState {
    /// Canonicalize the configured root and build the MIME registry.
    ///
    /// Fails if the root directory does not exist or is not accessible,
    /// which is a fatal startup error.
    pub fn new(config: Config) -> std::io::Result<Self> {
        let root = PathBuf::from(&config.server.root).canonicalize()?;

        let mut mime = MimeRegistry::with_defaults();
        // The one bespoke mapping: browsers require the exact type
        // for WebAssembly.instantiateStreaming.
        mime.register("wasm", "application/wasm");

        Ok(Self { config, root, mime })
    }
}
