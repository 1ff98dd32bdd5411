// Application state module
// Immutable state shared by every connection

use std::io;

use super::types::Config;
use crate::asset::FileSystemSource;
use crate::handler::Filer;
use crate::logger::AccessLogFormat;

/// Application state
pub struct AppState {
    pub config: Config,
    pub filer: Filer<FileSystemSource>,
    pub access_log_format: AccessLogFormat,
}

impl AppState {
    /// Build the state, resolving the asset root against the working directory
    pub fn new(config: &Config) -> io::Result<Self> {
        let filer = Filer::from_dir(&config.assets.root)?
            .with_index_file(config.assets.index_file.clone())
            .with_chunk_size(config.assets.chunk_size);

        Ok(Self {
            config: config.clone(),
            filer,
            access_log_format: AccessLogFormat::parse(&config.logging.access_log_format),
        })
    }
}
