//! MIME type detection module
//!
//! Returns the Content-Type for a file extension, or `None` when the
//! extension is unknown so the response can go out without one.

/// Get MIME Content-Type based on file extension
///
/// Common web types come from a fixed table (text types carry a charset);
/// everything else falls back to the `mime_guess` database.
///
/// # Examples
/// ```
/// use filer::http::mime::content_type;
/// assert_eq!(content_type(Some("html")), Some("text/html; charset=utf-8"));
/// assert_eq!(content_type(Some("JS")), Some("text/javascript; charset=utf-8"));
/// assert_eq!(content_type(None), None);
/// ```
pub fn content_type(extension: Option<&str>) -> Option<&'static str> {
    let ext = extension?.to_ascii_lowercase();
    let known = match ext.as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",

        _ => return mime_guess::from_ext(&ext).first_raw(),
    };
    Some(known)
}
