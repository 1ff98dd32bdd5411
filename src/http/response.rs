//! HTTP response building module
//!
//! Builders for the non-success responses the filer emits. Every body is a
//! short plain-text message.

use super::body::AssetBody;
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::{Response, StatusCode};

/// Methods the filer answers
pub const ALLOWED_METHODS: &str = "GET, HEAD";

/// Build a plain-text error response, e.g. `404 Not Found`
pub fn build_error_response(status: StatusCode) -> Response<AssetBody> {
    let message = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(AssetBody::full(message.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback(status, message)
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<AssetBody> {
    let status = StatusCode::METHOD_NOT_ALLOWED;
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(ALLOW, ALLOWED_METHODS)
        .body(AssetBody::full("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback(status, "405 Method Not Allowed".to_string())
        })
}

fn fallback(status: StatusCode, message: String) -> Response<AssetBody> {
    let mut response = Response::new(AssetBody::full(message));
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    log::error!("Failed to build {status} response: {error}");
}
