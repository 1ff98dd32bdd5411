//! HTTP protocol layer module
//!
//! Response bodies, MIME detection and status responses shared by the
//! delivery layer and the server.

pub mod body;
pub mod mime;
pub mod response;

pub use body::{AssetBody, DEFAULT_CHUNK_SIZE};
pub use response::{build_405_response, build_error_response};
