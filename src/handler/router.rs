//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, static file
//! dispatch, and access logging.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger;
use crate::logger::AccessLogEntry;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context passed through the serving pipeline
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method();
    let path = req.uri().path();
    let is_head = *method == Method::HEAD;

    let ctx = RequestContext { path, is_head };

    let response = match check_http_method(method) {
        Some(resp) => resp,
        None => static_files::serve(&ctx, &state).await,
    };

    if state.config.logging.access_log {
        let entry = build_log_entry(&req, &response, remote_addr, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Check HTTP method and return an early response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Assemble the access log entry for a completed request
fn build_log_entry(
    req: &Request<hyper::body::Incoming>,
    response: &Response<Full<Bytes>>,
    remote_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = http_version_str(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response_body_len(response);
    entry.referer = header_value(req, "referer");
    entry.user_agent = header_value(req, "user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

/// Body size as it will go on the wire.
///
/// `Full` bodies have an exact size hint, so this covers the error
/// responses too, which set no Content-Length header themselves.
fn response_body_len(response: &Response<Full<Bytes>>) -> usize {
    response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

fn header_value(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn http_version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_head_pass_through() {
        assert!(check_http_method(&Method::GET).is_none());
        assert!(check_http_method(&Method::HEAD).is_none());
    }

    #[test]
    fn test_options_gets_allow_header() {
        let resp = check_http_method(&Method::OPTIONS).expect("OPTIONS handled early");
        assert_eq!(resp.status(), 204);
        assert_eq!(resp.headers()["Allow"], "GET, HEAD, OPTIONS");
    }

    #[test]
    fn test_other_methods_rejected() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let resp = check_http_method(&method).expect("method rejected");
            assert_eq!(resp.status(), 405);
        }
    }

    #[test]
    fn test_body_len_counts_error_bodies() {
        assert_eq!(
            response_body_len(&http::build_404_response()),
            "404 Not Found".len()
        );
        assert_eq!(
            response_body_len(&http::build_405_response()),
            "405 Method Not Allowed".len()
        );
        assert_eq!(response_body_len(&http::build_options_response()), 0);
    }

    #[test]
    fn test_http_version_str() {
        assert_eq!(http_version_str(Version::HTTP_10), "1.0");
        assert_eq!(http_version_str(Version::HTTP_11), "1.1");
        assert_eq!(http_version_str(Version::HTTP_2), "2");
    }
}
