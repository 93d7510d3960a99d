//! MIME type registry
//!
//! Maps file extensions to Content-Type values. The registry is built once
//! at startup from a default table plus explicit overrides, then shared
//! read-only by every connection handler.

use std::collections::HashMap;
use std::path::Path;

/// Content-Type used when the extension is unknown or absent.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Built-in extension table. Extensions are stored without the leading dot,
/// matching what `Path::extension` yields.
const DEFAULT_TYPES: &[(&str, &str)] = &[
    // Text
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css"),
    ("txt", "text/plain; charset=utf-8"),
    ("md", "text/plain; charset=utf-8"),
    ("xml", "application/xml"),
    // JavaScript
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    // Images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    // Video
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "video/ogg"),
    ("ogv", "video/ogg"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("m4a", "audio/mp4"),
    // Fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("eot", "application/vnd.ms-fontobject"),
    // Documents / archives
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("gzip", "application/gzip"),
    ("tar", "application/x-tar"),
];

/// Extension to Content-Type mapping.
///
/// Lookup is case-sensitive on the extension exactly as extracted from the
/// request path.
///
/// # Examples
/// ```
/// use wasmserve::http::mime::MimeRegistry;
///
/// let mut registry = MimeRegistry::with_defaults();
/// registry.register("wasm", "application/wasm");
/// assert_eq!(registry.content_type_for(Some("html")), "text/html; charset=utf-8");
/// assert_eq!(registry.content_type_for(Some("wasm")), "application/wasm");
/// assert_eq!(registry.content_type_for(None), "application/octet-stream");
/// ```
#[derive(Debug, Clone)]
pub struct MimeRegistry {
    types: HashMap<String, String>,
}

impl MimeRegistry {
    /// Create a registry populated with the built-in default table.
    #[must_use]
    pub fn with_defaults() -> Self {
        let types = DEFAULT_TYPES
            .iter()
            .map(|&(ext, ty)| (ext.to_string(), ty.to_string()))
            .collect();
        Self { types }
    }

    /// Register (or replace) the Content-Type for an extension.
    ///
    /// `ext` is the bare extension without a leading dot.
    pub fn register(&mut self, ext: impl Into<String>, content_type: impl Into<String>) {
        self.types.insert(ext.into(), content_type.into());
    }

    /// Look up the Content-Type for an extension.
    #[must_use]
    pub fn content_type_for(&self, ext: Option<&str>) -> &str {
        ext.and_then(|e| self.types.get(e))
            .map_or(FALLBACK_CONTENT_TYPE, String::as_str)
    }

    /// Look up the Content-Type for a file path by its extension.
    #[must_use]
    pub fn content_type_for_path(&self, path: &Path) -> &str {
        self.content_type_for(path.extension().and_then(|e| e.to_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MimeRegistry {
        let mut r = MimeRegistry::with_defaults();
        r.register("wasm", "application/wasm");
        r
    }

    #[test]
    fn test_common_types() {
        let r = registry();
        assert_eq!(r.content_type_for(Some("html")), "text/html; charset=utf-8");
        assert_eq!(r.content_type_for(Some("css")), "text/css");
        assert_eq!(r.content_type_for(Some("js")), "application/javascript");
        assert_eq!(r.content_type_for(Some("json")), "application/json");
        assert_eq!(r.content_type_for(Some("png")), "image/png");
        assert_eq!(r.content_type_for(Some("mp4")), "video/mp4");
    }

    #[test]
    fn test_wasm_override() {
        let r = registry();
        assert_eq!(r.content_type_for(Some("wasm")), "application/wasm");
        // The override is not part of the default table
        let defaults = MimeRegistry::with_defaults();
        assert_eq!(defaults.content_type_for(Some("wasm")), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_unknown_extension() {
        let r = registry();
        assert_eq!(r.content_type_for(Some("xyz")), FALLBACK_CONTENT_TYPE);
        assert_eq!(r.content_type_for(None), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let r = registry();
        assert_eq!(r.content_type_for(Some("WASM")), FALLBACK_CONTENT_TYPE);
        assert_eq!(r.content_type_for(Some("Html")), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_path_lookup() {
        let r = registry();
        assert_eq!(
            r.content_type_for_path(Path::new("app/index.wasm")),
            "application/wasm"
        );
        assert_eq!(
            r.content_type_for_path(Path::new("README")),
            FALLBACK_CONTENT_TYPE
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut r = registry();
        r.register("js", "text/javascript");
        assert_eq!(r.content_type_for(Some("js")), "text/javascript");
    }
}
