//! Error types for raw volume access.
//!
//! These errors cover everything between a volume identifier and the bytes of
//! the volume: resolving the identifier, checking the reported filesystem type,
//! opening the device and reading from it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, opening or reading a raw volume.
#[derive(Error, Debug)]
pub enum VolumeError {
    /// The raw device or image could not be opened.
    #[error("Cannot open `{}`: {source}", path.display())]
    Device {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The volume identifier does not name any device or image.
    #[error("Couldn't find the volume `{0}`")]
    NotFound(String),

    /// The volume reports a filesystem other than FAT32.
    #[error("Volume is not FAT32 (reported filesystem type: `{0}`)")]
    WrongFilesystemType(String),

    /// A bounded read ended before the requested length: the end of the volume was reached.
    #[error("Read of {expected} bytes at offset {offset} returned only {read} bytes")]
    Truncated {
        offset: u64,
        expected: usize,
        read: usize,
    },

    /// Underlying I/O errors that occur while reading an opened volume.
    #[error("IO Error: `{0}`")]
    Io(io::Error),
}

/// Converts standard I/O errors into VolumeError.
impl From<io::Error> for VolumeError {
    fn from(err: io::Error) -> Self {
        VolumeError::Io(err)
    }
}
