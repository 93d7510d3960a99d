//! Directory listing module
//!
//! Generates the HTML index document returned for directories without an
//! index file: one link per entry, sorted, directories suffixed with `/`.

use std::io;
use std::path::Path;
use tokio::fs;

/// Render the listing for a resolved directory.
///
/// `request_path` is the original request path (with trailing slash) used
/// for the page title and heading.
pub async fn render_listing(dir: &Path, request_path: &str) -> io::Result<String> {
    let mut read_dir = fs::read_dir(dir).await?;
    let mut entries: Vec<String> = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        entries.push(name);
    }

    entries.sort();
    Ok(render_html(request_path, &entries))
}

/// Build the listing document from sorted entry names.
fn render_html(request_path: &str, entries: &[String]) -> String {
    let title = format!("Directory listing for {}", escape_html(request_path));

    let mut items = String::new();
    for name in entries {
        let escaped = escape_html(name);
        items.push_str(&format!("<li><a href=\"{escaped}\">{escaped}</a></li>\n"));
    }

    format!(
        r"<!DOCTYPE html>
<html>
<head>
    <meta charset=utf-8>
    <title>{title}</title>
</head>
<body>
<h1>{title}</h1>
<hr>
<ul>
{items}</ul>
<hr>
</body>
</html>
"
    )
}

/// Escape characters with special meaning in HTML.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
