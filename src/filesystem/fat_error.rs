//! Error types for FAT32 metadata parsing.
//!
//! The boot sector describes the geometry every later offset computation relies
//! on, so any error raised while parsing it is fatal for the session. A missing
//! FSInfo sector is reported through [`FATError::MissingFsInfo`] and only becomes
//! fatal when a scan depends on its counters.

use thiserror::Error;

use crate::volume::volume_error::VolumeError;

/// Errors that can occur while decoding FAT32 metadata sectors.
#[derive(Error, Debug)]
pub enum FATError {
    /// The boot sector signature at offset 0x1FE must be 0x55AA.
    #[error("Invalid boot sector signature: `0x{0:04X}`. Expected signature: 0x55AA")]
    InvalidSignature(u16),

    /// Bytes per sector must be greater than 0; every byte offset is a multiple of it.
    #[error("Invalid count of bytes per sector: `{0}`. Any value greater than 0 is valid.")]
    InvalidBytesPerSec(u16),

    /// Sectors per cluster must be greater than 0.
    #[error("Invalid number of sectors per cluster: `{0}`. Any value greater than 0 is valid.")]
    InvalidSecPerClus(u8),

    /// Metadata sectors are decoded from exactly 512 bytes.
    #[error("Invalid sector length: `{0}` bytes. Expected 512 bytes.")]
    InvalidSectorLength(usize),

    /// The FSInfo lead signature must be 0x41615252.
    #[error("Invalid FSInfo signature: `0x{0:08X}`. Expected signature: 0x41615252")]
    MissingFsInfo(u32),

    /// Parsing error occurred during structure initialization.
    #[error("BinRead Error: `{0}`")]
    BinReadError(binread::Error),

    /// The metadata sector could not be read from the volume.
    #[error(transparent)]
    Volume(#[from] VolumeError),
}

/// Converts BinRead errors into FATError.
impl From<binread::Error> for FATError {
    fn from(err: binread::Error) -> Self {
        FATError::BinReadError(err)
    }
}
