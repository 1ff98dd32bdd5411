//! Static asset server
//!
//! Resolves request paths against a pluggable [`asset::AssetSource`], confining
//! every lookup to the source's root, and streams the result over HTTP through
//! [`handler::Filer`].

pub mod asset;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use asset::{Asset, AssetError, AssetSource, FileSystemSource, MemorySource};
pub use handler::Filer;
pub use http::AssetBody;
