//! Resolution of a volume identifier into a raw device path.
//!
//! The carving core only needs a raw path and the filesystem type reported for
//! it. Platform-specific enumeration of mounted volumes lives behind the
//! [`VolumeResolver`] trait.

use getset::Getters;
use log::debug;
use std::path::{Path, PathBuf};

use super::reader::VolumeReader;
use super::volume_error::VolumeError;
use crate::utils::fixed_text;

/// Offset of the 8-byte filesystem type tag in a FAT32 boot sector.
const FS_TYPE_TAG_OFFSET: u64 = 0x52;

/// A volume identifier resolved to a raw device and its reported filesystem type.
#[derive(Debug, Clone, Getters)]
pub struct ResolvedVolume {
    /// Raw device or image path.
    #[get = "pub"]
    device_path: PathBuf,
    /// Filesystem type reported for the volume (e.g. "FAT32").
    #[get = "pub"]
    fs_type: String,
}

impl ResolvedVolume {
    pub fn new(device_path: impl Into<PathBuf>, fs_type: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
            fs_type: fs_type.into(),
        }
    }
}

/// Maps a user-facing volume identifier to a raw device path.
pub trait VolumeResolver {
    fn resolve(&self, identifier: &str) -> Result<ResolvedVolume, VolumeError>;
}

/// Resolver for drive letters and raw device or image paths.
///
/// The reported filesystem type is the boot sector's type tag with its padding
/// removed.
#[derive(Debug, Default)]
pub struct ImageResolver;

impl VolumeResolver for ImageResolver {
    fn resolve(&self, identifier: &str) -> Result<ResolvedVolume, VolumeError> {
        let device_path = match drive_letter(identifier) {
            Some(letter) => drive_device_path(letter),
            None => {
                let path = PathBuf::from(identifier);
                if !path.exists() {
                    return Err(VolumeError::NotFound(identifier.to_string()));
                }
                path
            }
        };

        let fs_type = read_fs_type_tag(&device_path)?;
        debug!(
            "Resolved `{identifier}` to {} ({fs_type})",
            device_path.display()
        );

        Ok(ResolvedVolume {
            device_path,
            fs_type,
        })
    }
}

/// Extracts the drive letter from identifiers such as `E:` or `E:\`.
fn drive_letter(identifier: &str) -> Option<char> {
    let mut chars = identifier.chars();
    let letter = chars.next().filter(char::is_ascii_alphabetic)?;
    if chars.next() != Some(':') {
        return None;
    }
    match chars.as_str() {
        "" | "\\" | "/" => Some(letter.to_ascii_uppercase()),
        _ => None,
    }
}

#[cfg(windows)]
fn drive_device_path(letter: char) -> PathBuf {
    PathBuf::from(format!(r"\\.\{letter}:"))
}

#[cfg(not(windows))]
fn drive_device_path(letter: char) -> PathBuf {
    PathBuf::from(format!("{letter}:"))
}

fn read_fs_type_tag(path: &Path) -> Result<String, VolumeError> {
    let mut reader = VolumeReader::open(path)?;
    let tag = reader.read_at(FS_TYPE_TAG_OFFSET, 8)?;
    Ok(fixed_text(&tag))
}
