//! Random-access reads over a raw volume.
//!
//! [`VolumeReader`] owns the only handle to the volume for the lifetime of a
//! session. The handle is released when the reader is dropped, which covers
//! every early return through `?`.
//!
//! Raw devices only accept reads that start on a sector boundary and span whole
//! sectors. Every request is widened to the enclosing sectors and the requested
//! bytes are sliced out of the result.

use log::{debug, trace};
use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use super::volume_error::VolumeError;

/// Sector size assumed until the boot sector has been decoded.
pub const DEFAULT_SECTOR_SIZE: u64 = 512;

/// Exclusive, bounded random-access reader over a raw FAT32 volume or image.
#[derive(Debug)]
pub struct VolumeReader<R = File> {
    inner: R,
    sector_size: u64,
}

impl VolumeReader<File> {
    /// Opens a raw device or image file for reading.
    ///
    /// Other processes keep their access to the device: a mounted volume holds
    /// write handles of its own, so the open would fail otherwise.
    ///
    /// # Parameters
    /// - `path`: Path to the raw device (e.g. `\\.\E:` or `/dev/sdb1`) or image file
    ///
    /// # Errors
    /// - Returns `VolumeError::Device` if the path cannot be opened
    pub fn open(path: &Path) -> Result<Self, VolumeError> {
        let inner = File::open(path).map_err(|source| VolumeError::Device {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened volume {}", path.display());

        Ok(Self::new(inner))
    }
}

impl<R: Read + Seek> VolumeReader<R> {
    /// Wraps an already opened byte source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            sector_size: DEFAULT_SECTOR_SIZE,
        }
    }

    /// Sets the sector size reads are aligned to. Zero is ignored.
    pub fn set_sector_size(&mut self, sector_size: u16) {
        if sector_size != 0 {
            self.sector_size = sector_size.into();
        }
    }

    /// Reads up to `length` bytes starting at `offset`.
    ///
    /// The returned buffer is shorter than `length` when the end of the volume
    /// is reached; reading entirely past the end yields an empty buffer.
    ///
    /// # Errors
    /// - Returns `VolumeError::Io` if seeking or reading fails
    pub fn read_at(&mut self, offset: u64, length: usize) -> Result<Vec<u8>, VolumeError> {
        if length == 0 {
            return Ok(Vec::new());
        }

        let head = offset % self.sector_size;
        let start = offset - head;
        let end = (offset + length as u64).div_ceil(self.sector_size) * self.sector_size;
        trace!("Reading {length} bytes at offset {offset} as the sector span {start}..{end}");

        let mut buf = vec![0u8; (end - start) as usize];
        let filled = self.read_sectors(start, &mut buf).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Failed to read {length} bytes at offset {offset}: {err}"),
            )
        })?;

        let head = head as usize;
        if filled <= head {
            return Ok(Vec::new());
        }
        buf.truncate(filled.min(head + length));
        buf.drain(..head);

        Ok(buf)
    }

    /// Fills `buf` with whole sectors from `start`, returning how many bytes
    /// were read before the end of the volume.
    fn read_sectors(&mut self, start: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.seek(SeekFrom::Start(start))?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }

        Ok(filled)
    }

    /// Reads exactly `length` bytes starting at `offset`.
    ///
    /// # Errors
    /// - Returns `VolumeError::Truncated` if the volume ends before `length` bytes were read
    /// - Returns `VolumeError::Io` if seeking or reading fails
    pub fn read_exact_at(&mut self, offset: u64, length: usize) -> Result<Vec<u8>, VolumeError> {
        let buf = self.read_at(offset, length)?;

        if buf.len() < length {
            return Err(VolumeError::Truncated {
                offset,
                expected: length,
                read: buf.len(),
            });
        }

        Ok(buf)
    }
}
