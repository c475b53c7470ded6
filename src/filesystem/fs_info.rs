//! FAT32 FSInfo sector parsing.
//!
//! The FSInfo sector caches the free cluster count and a hint for the next free
//! cluster. Both are advisory on a real volume, but the unallocated scan uses
//! them to approximate where unallocated space begins and ends.

use binread::{BinRead, BinReaderExt};
use getset::CopyGetters;
use log::warn;
use std::fmt;
use std::io;

use super::fat_error::FATError;

/// Length in bytes of the FSInfo structure.
pub const FS_INFO_LEN: usize = 512;

/// Lead signature of the FSInfo sector ("RRaA"), read little-endian.
const LEAD_SIGNATURE: u32 = 0x41615252;

/// Raw FSInfo fields at their on-disk offsets.
#[derive(BinRead, Debug)]
#[br(little)]
struct RawFsInfo {
    /// Lead signature (0x000)
    lead_sig: u32,
    /// Last known free cluster count (0x1E8)
    #[br(pad_before = 0x1E4)]
    free_count: u32,
    /// Hint for the next free cluster (0x1EC)
    nxt_free: u32,
}

/// Free cluster counters cached in the FSInfo sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct FsInfo {
    /// Last known number of free clusters
    #[getset(get_copy = "pub")]
    free_cluster_count: u32,
    /// FAT cluster index where the search for a free cluster should start
    #[getset(get_copy = "pub")]
    next_free_cluster: u32,
}

impl FsInfo {
    /// Decodes an FSInfo sector, treating a bad signature as absence.
    ///
    /// # Parameters
    /// - `bytes`: The 512 bytes of the FSInfo sector
    ///
    /// # Returns
    /// - `Some(FsInfo)`: If the lead signature is 0x41615252
    /// - `None`: If the sector is not a valid FSInfo sector
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        match Self::try_parse(bytes) {
            Ok(fs_info) => Some(fs_info),
            Err(err) => {
                warn!("{err}");
                None
            }
        }
    }

    /// Decodes an FSInfo sector.
    ///
    /// # Errors
    /// - `FATError::InvalidSectorLength`: If `bytes` is not exactly 512 bytes long
    /// - `FATError::MissingFsInfo`: If the lead signature is not 0x41615252
    pub fn try_parse(bytes: &[u8]) -> Result<Self, FATError> {
        if bytes.len() != FS_INFO_LEN {
            return Err(FATError::InvalidSectorLength(bytes.len()));
        }

        let mut reader = io::Cursor::new(bytes);
        let raw: RawFsInfo = reader.read_le()?;

        if raw.lead_sig != LEAD_SIGNATURE {
            return Err(FATError::MissingFsInfo(raw.lead_sig));
        }

        Ok(Self {
            free_cluster_count: raw.free_count,
            next_free_cluster: raw.nxt_free,
        })
    }
}

impl fmt::Display for FsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FSInfo Information:")?;
        writeln!(f, "  {:<32} {}", "Free Cluster Count", self.free_cluster_count)?;
        writeln!(f, "  {:<32} {}", "Next Free Cluster", self.next_free_cluster)
    }
}
