//! Integration tests for the static file server
//!
//! Each test builds a temporary document root, starts the real accept loop
//! on an ephemeral port, and talks to it over raw TCP so the full
//! request/response cycle is exercised.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;

use wasmserve::config::{AppState, Config};
use wasmserve::server;

const WASM_CONTENT: [u8; 17] = [
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03,
    0x04, 0x05,
];
const HTML_CONTENT: &str = "<html><body>hello</body></html>";

struct TestServer {
    addr: SocketAddr,
    root: PathBuf,
    shutdown: Arc<Notify>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.notify_waiters();
        let _ = fs::remove_dir_all(&self.root);
    }
}

/// Create a document root with test content and start the server on an
/// ephemeral port.
async fn start_server(tag: &str) -> TestServer {
    start_server_with(tag, |_| {}).await
}

/// Like `start_server`, with a hook to adjust the config before startup.
async fn start_server_with(tag: &str, configure: impl FnOnce(&mut Config)) -> TestServer {
    let root = std::env::temp_dir().join(format!("wasmserve-it-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&root);
    fs::create_dir_all(root.join("sub")).expect("create test root");
    fs::create_dir_all(root.join("docs")).expect("create docs dir");
    fs::write(root.join("index.wasm"), WASM_CONTENT).expect("write wasm");
    fs::write(root.join("page.html"), HTML_CONTENT).expect("write html");
    fs::write(root.join("sub/notes.txt"), "notes").expect("write txt");
    fs::write(root.join("docs/index.html"), "<h1>docs</h1>").expect("write index");

    let mut config = Config::load().expect("default config");
    config.server.root = root.to_string_lossy().into_owned();
    config.logging.access_log = false;
    configure(&mut config);

    let state = Arc::new(AppState::new(config).expect("app state"));
    let listener = server::bind("127.0.0.1:0".parse().expect("loopback addr")).expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let shutdown = Arc::new(Notify::new());
    let loop_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        let _ = server::run(listener, state, loop_shutdown).await;
    });

    TestServer {
        addr,
        root,
        shutdown,
    }
}

/// Send a raw HTTP/1.1 request and return the full response bytes.
async fn send_request(addr: SocketAddr, method: &str, path: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    response
}

fn status_code(response: &[u8]) -> u16 {
    let head = String::from_utf8_lossy(response);
    head.split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status line present")
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

/// Split a response into (headers, body).
fn split_response(response: &[u8]) -> (String, Vec<u8>) {
    let sep = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header/body separator");
    let head = String::from_utf8_lossy(&response[..sep]).into_owned();
    (head, response[sep + 4..].to_vec())
}

#[tokio::test]
async fn test_wasm_content_type_and_body() {
    let srv = start_server("wasm").await;
    let response = send_request(srv.addr, "GET", "/index.wasm").await;
    let (head, body) = split_response(&response);

    assert_eq!(status_code(&response), 200);
    assert_eq!(header(&head, "content-type"), Some("application/wasm"));
    assert_eq!(header(&head, "content-length"), Some("17"));
    assert_eq!(body, WASM_CONTENT);
}

#[tokio::test]
async fn test_html_served_with_standard_type() {
    let srv = start_server("html").await;
    let response = send_request(srv.addr, "GET", "/page.html").await;
    let (head, body) = split_response(&response);

    assert_eq!(status_code(&response), 200);
    assert_eq!(
        header(&head, "content-type"),
        Some("text/html; charset=utf-8")
    );
    assert_eq!(body, HTML_CONTENT.as_bytes());
}

#[tokio::test]
async fn test_missing_file_then_server_keeps_serving() {
    let srv = start_server("missing").await;

    let response = send_request(srv.addr, "GET", "/missing.txt").await;
    assert_eq!(status_code(&response), 404);

    // The process must keep serving after a 404
    let response = send_request(srv.addr, "GET", "/page.html").await;
    assert_eq!(status_code(&response), 200);
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let srv = start_server("traversal").await;
    let response = send_request(srv.addr, "GET", "/../../etc/passwd").await;
    let (_, body) = split_response(&response);

    assert_eq!(status_code(&response), 403);
    assert!(!body.windows(5).any(|w| w == b"root:"));
}

#[tokio::test]
async fn test_head_returns_headers_only() {
    let srv = start_server("head").await;
    let response = send_request(srv.addr, "HEAD", "/index.wasm").await;
    let (head, body) = split_response(&response);

    assert_eq!(status_code(&response), 200);
    assert_eq!(header(&head, "content-length"), Some("17"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_post_is_not_allowed() {
    let srv = start_server("post").await;
    let response = send_request(srv.addr, "POST", "/page.html").await;
    let (head, _) = split_response(&response);

    assert_eq!(status_code(&response), 405);
    assert_eq!(header(&head, "allow"), Some("GET, HEAD, OPTIONS"));
}

#[tokio::test]
async fn test_directory_listing_generated() {
    let srv = start_server("listing").await;
    let response = send_request(srv.addr, "GET", "/sub/").await;
    let (head, body) = split_response(&response);

    assert_eq!(status_code(&response), 200);
    assert_eq!(
        header(&head, "content-type"),
        Some("text/html; charset=utf-8")
    );
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("notes.txt"));
    assert!(html.contains("Directory listing for /sub/"));
}

#[tokio::test]
async fn test_directory_index_file_served() {
    let srv = start_server("index").await;
    let response = send_request(srv.addr, "GET", "/docs/").await;
    let (_, body) = split_response(&response);

    assert_eq!(status_code(&response), 200);
    assert_eq!(body, b"<h1>docs</h1>");
}

#[tokio::test]
async fn test_directory_without_slash_redirects() {
    let srv = start_server("redirect").await;
    let response = send_request(srv.addr, "GET", "/docs").await;
    let (head, _) = split_response(&response);

    assert_eq!(status_code(&response), 301);
    assert_eq!(header(&head, "location"), Some("/docs/"));
}

#[tokio::test]
async fn test_keep_alive_zero_closes_after_response() {
    let srv = start_server_with("nokeepalive", |config| {
        config.performance.keep_alive_timeout = 0;
    })
    .await;

    // No "Connection: close" here: with keep-alive disabled the server must
    // close the connection itself after one exchange, well before the
    // 30-second connection timeout
    let mut stream = TcpStream::connect(srv.addr).await.expect("connect");
    stream
        .write_all(b"GET /page.html HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .expect("write request");

    let mut response = Vec::new();
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        stream.read_to_end(&mut response),
    )
    .await
    .expect("server closed the connection")
    .expect("read response");

    assert_eq!(status_code(&response), 200);
}

#[tokio::test]
async fn test_unknown_extension_falls_back() {
    let srv = start_server("fallback").await;
    fs::write(srv.root.join("data.xyz"), [9, 9, 9]).expect("write file");

    let response = send_request(srv.addr, "GET", "/data.xyz").await;
    let (head, _) = split_response(&response);

    assert_eq!(status_code(&response), 200);
    assert_eq!(
        header(&head, "content-type"),
        Some("application/octet-stream")
    );
}
