//! Error types for a carving session.
//!
//! Fatal errors raised before the scan starts abort the session. Once a scan is
//! running, read failures are handled per cluster by the carver and never
//! surface here.

use thiserror::Error;

use crate::filesystem::fat_error::FATError;
use crate::volume::volume_error::VolumeError;

/// Errors that can occur while setting up or running a carving session.
#[derive(Error, Debug)]
pub enum CarveError {
    /// The requested scan cannot run with the given options or metadata.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The volume could not be resolved, opened or read.
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// The FAT32 metadata could not be parsed.
    #[error(transparent)]
    FAT(#[from] FATError),
}
