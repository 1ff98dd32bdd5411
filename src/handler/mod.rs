//! Request handler module
//!
//! Delivery layer between HTTP requests and asset sources.

pub mod filer;

pub use filer::{status_for, Filer, DEFAULT_INDEX_FILE};
