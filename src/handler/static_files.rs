//! Static file serving module
//!
//! Resolves request paths against the server root, enforces root
//! containment, and serves files, index documents, and directory listings.

use crate::config::AppState;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http;
use crate::http::response::{build_file_response, build_html_response};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Serve the request path from the configured root.
pub async fn serve(ctx: &RequestContext<'_>, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let Some(relative) = sanitize_request_path(ctx.path) else {
        logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
        return http::build_403_response();
    };

    // Canonicalize before touching the filesystem so symlink escapes are
    // caught by the same containment check as lexical ones.
    let joined = state.root.join(relative);
    let Ok(resolved) = joined.canonicalize() else {
        return http::build_404_response();
    };
    if !resolved.starts_with(&state.root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            ctx.path,
            resolved.display()
        ));
        return http::build_403_response();
    }

    let metadata = match fs::metadata(&resolved).await {
        Ok(m) => m,
        Err(_) => return http::build_404_response(),
    };

    if metadata.is_dir() {
        serve_directory(ctx, state, &resolved).await
    } else {
        read_file_response(state, &resolved, ctx.is_head).await
    }
}

/// Serve a resolved directory: redirect to the slashed path, probe index
/// files, then fall back to a generated listing.
async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &Arc<AppState>,
    dir: &Path,
) -> Response<Full<Bytes>> {
    if !ctx.path.ends_with('/') {
        return http::build_redirect_response(&format!("{}/", ctx.path));
    }

    for index_file in &state.config.http.index_files {
        let index_path = dir.join(index_file);
        if index_path.is_file() {
            return read_file_response(state, &index_path, ctx.is_head).await;
        }
    }

    if !state.config.http.directory_listing {
        return http::build_404_response();
    }

    match listing::render_listing(dir, ctx.path).await {
        Ok(html) => build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to list directory '{}': {e}",
                dir.display()
            ));
            http::build_500_response()
        }
    }
}

/// Read a file and build the 200 response with its MIME type.
async fn read_file_response(
    state: &Arc<AppState>,
    path: &Path,
    is_head: bool,
) -> Response<Full<Bytes>> {
    match fs::read(path).await {
        Ok(content) => {
            let content_type = state.mime.content_type_for_path(path);
            build_file_response(content, content_type, is_head)
        }
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            http::build_404_response()
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            http::build_500_response()
        }
    }
}

/// Normalize a request path into a relative filesystem path.
///
/// Empty and `.` segments are dropped. Returns `None` for paths that must
/// be rejected: any `..` segment or embedded NUL byte.
#[must_use]
pub fn sanitize_request_path(path: &str) -> Option<PathBuf> {
    if path.contains('\0') {
        return None;
    }

    let mut relative = PathBuf::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            name => relative.push(name),
        }
    }
    Some(relative)
}
