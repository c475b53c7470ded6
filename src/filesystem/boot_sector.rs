//! FAT32 boot sector parsing.
//!
//! This module implements:
//! - Decoding of the fixed-offset BIOS Parameter Block fields the carver relies on
//! - Validation of the 0x55AA boot sector signature
//! - The derived geometry used to turn cluster numbers into byte offsets

use binread::{BinRead, BinReaderExt};
use getset::CopyGetters;
use std::fmt::{self, Write as FmtWrite};
use std::io;

use super::fat_error::FATError;
use crate::traits::LayoutDisplay;
use crate::utils::fixed_text;

/// Length in bytes of the boot sector structure.
pub const BOOT_SECTOR_LEN: usize = 512;

/// Expected boot sector signature, compared big-endian.
const BOOT_SIGNATURE: u16 = 0x55AA;

/// Raw boot sector fields, read at their on-disk offsets.
///
/// Everything not needed to locate clusters is skipped with padding.
#[derive(BinRead, Debug)]
#[br(little)]
struct BootSector {
    /// Number of bytes per sector (0x0B)
    #[br(pad_before = 0x0B)]
    bytes_per_sec: u16,
    /// Number of sectors per cluster (0x0D)
    sec_per_clus: u8,
    /// Number of reserved sectors from start of volume (0x0E)
    rsvd_sec_cnt: u16,
    /// Number of FAT copies (0x10)
    num_fat: u8,
    /// Media descriptor (0x15)
    #[br(pad_before = 0x04)]
    media: u8,
    /// Sectors per FAT (0x24)
    #[br(pad_before = 0x0E)]
    fat_sz_32: u32,
    /// First cluster of root directory (0x2C)
    #[br(pad_before = 0x04)]
    root_clus: u32,
    /// Sector number of the FSInfo structure (0x30)
    fs_info: u16,
    /// Volume label (0x47)
    #[br(pad_before = 0x15)]
    vol_lab: [u8; 10],
    /// Filesystem type label, "FAT32   " (0x52)
    #[br(pad_before = 0x01)]
    fil_sys_type: [u8; 8],
    /// Boot sector signature (0x1FE), stored as the byte pair 0x55 0xAA
    #[br(big, pad_before = 0x1A4)]
    sig: u16,
}

/// Geometry of a FAT32 volume, decoded once from its boot sector.
///
/// All byte offsets computed by the carver derive from these values. The
/// structure is immutable after [`VolumeGeometry::parse`] returns.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
pub struct VolumeGeometry {
    /// Number of bytes per sector, greater than 0
    #[getset(get_copy = "pub")]
    bytes_per_sector: u16,
    /// Number of sectors per cluster, greater than 0
    #[getset(get_copy = "pub")]
    sectors_per_cluster: u8,
    /// Number of sectors before the first FAT
    #[getset(get_copy = "pub")]
    reserved_sectors: u16,
    /// Number of FAT copies recorded in the boot sector
    #[getset(get_copy = "pub")]
    fat_copy_count: u8,
    /// Media descriptor byte
    #[getset(get_copy = "pub")]
    media_type: u8,
    /// Size of one FAT in sectors
    #[getset(get_copy = "pub")]
    fat_size_sectors: u32,
    /// First cluster of the root directory
    #[getset(get_copy = "pub")]
    root_dir_cluster: u32,
    /// Sector number of the FSInfo structure
    #[getset(get_copy = "pub")]
    fsinfo_sector: u16,
    volume_label: [u8; 10],
    fs_type_tag: [u8; 8],
}

impl VolumeGeometry {
    /// Decodes and validates a 512-byte boot sector.
    ///
    /// # Parameters
    /// - `bytes`: The first 512 bytes of the volume
    ///
    /// # Returns
    /// - `Ok(VolumeGeometry)`: The decoded geometry
    /// - `Err(FATError)`: If the sector is not a usable FAT32 boot sector
    ///
    /// # Errors
    /// - `FATError::InvalidSectorLength`: If `bytes` is not exactly 512 bytes long
    /// - `FATError::InvalidSignature`: If the signature at 0x1FE is not 0x55AA
    /// - `FATError::InvalidBytesPerSec`: If bytes per sector is 0
    /// - `FATError::InvalidSecPerClus`: If sectors per cluster is 0
    pub fn parse(bytes: &[u8]) -> Result<Self, FATError> {
        if bytes.len() != BOOT_SECTOR_LEN {
            return Err(FATError::InvalidSectorLength(bytes.len()));
        }

        let mut reader = io::Cursor::new(bytes);
        let raw: BootSector = reader.read_le()?;

        if raw.sig != BOOT_SIGNATURE {
            return Err(FATError::InvalidSignature(raw.sig));
        }
        if raw.bytes_per_sec == 0 {
            return Err(FATError::InvalidBytesPerSec(raw.bytes_per_sec));
        }
        if raw.sec_per_clus == 0 {
            return Err(FATError::InvalidSecPerClus(raw.sec_per_clus));
        }

        Ok(Self {
            bytes_per_sector: raw.bytes_per_sec,
            sectors_per_cluster: raw.sec_per_clus,
            reserved_sectors: raw.rsvd_sec_cnt,
            fat_copy_count: raw.num_fat,
            media_type: raw.media,
            fat_size_sectors: raw.fat_sz_32,
            root_dir_cluster: raw.root_clus,
            fsinfo_sector: raw.fs_info,
            volume_label: raw.vol_lab,
            fs_type_tag: raw.fil_sys_type,
        })
    }

    /// Volume label with its padding removed.
    pub fn volume_label(&self) -> String {
        fixed_text(&self.volume_label)
    }

    /// Filesystem type tag with its padding removed.
    pub fn fs_type_tag(&self) -> String {
        fixed_text(&self.fs_type_tag)
    }

    /// Size of one FAT in bytes.
    pub fn fat_size_bytes(&self) -> u64 {
        self.bytes_per_sector as u64 * self.fat_size_sectors as u64
    }

    /// Number of 32-bit entries in one FAT.
    pub fn cluster_count(&self) -> u32 {
        u32::try_from(self.fat_size_bytes() / 4).unwrap_or(u32::MAX)
    }

    /// Number of FAT entries describing data clusters (entries 0 and 1 are reserved).
    pub fn data_cluster_count(&self) -> u32 {
        self.cluster_count().saturating_sub(2)
    }

    /// Size of a cluster in bytes.
    pub fn cluster_size(&self) -> u64 {
        self.bytes_per_sector as u64 * self.sectors_per_cluster as u64
    }

    /// Converts a sector number to its byte offset.
    pub fn sector_to_byte(&self, sector: u64) -> u64 {
        self.bytes_per_sector as u64 * sector
    }

    /// Returns the byte offset of the first FAT.
    pub fn fat_start(&self) -> u64 {
        self.sector_to_byte(self.reserved_sectors as u64)
    }

    /// Returns the byte offset of the data region, assuming `fat_copies` FATs precede it.
    pub fn data_start(&self, fat_copies: u8) -> u64 {
        self.sector_to_byte(
            self.reserved_sectors as u64 + self.fat_size_sectors as u64 * fat_copies as u64,
        )
    }

    /// Returns the byte offset of the cluster at scan cursor `cursor`.
    ///
    /// Cursor 0 is the first cluster of the data region.
    pub fn cluster_offset(&self, cursor: u64, fat_copies: u8) -> u64 {
        self.data_start(fat_copies) + self.cluster_size() * cursor
    }
}

/// Implements the Display trait for VolumeGeometry
impl fmt::Display for VolumeGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! field {
            ($name:expr, $val:expr) => {{
                writeln!(f, "  {:<32} {}", $name, $val)?;
            }};
        }

        writeln!(f, "Boot Sector Information:")?;

        field!("Bytes per Sector", self.bytes_per_sector);
        field!("Sectors per Cluster", self.sectors_per_cluster);
        field!("Reserved Sector Count", self.reserved_sectors);
        field!("Number of FAT Tables", self.fat_copy_count);
        field!("Media Type", format!("0x{:X}", self.media_type));
        field!("FAT Size (sectors)", self.fat_size_sectors);
        field!("Root Directory Cluster", self.root_dir_cluster);
        field!("FSInfo Sector", self.fsinfo_sector);
        field!("Volume Label", format!("{:?}", self.volume_label()));
        field!("Filesystem Type", format!("{:?}", self.fs_type_tag()));
        field!("Cluster Count", self.cluster_count());

        Ok(())
    }
}

/// Implements the LayoutDisplay trait for VolumeGeometry.
///
/// Regions are given in sectors from the start of the volume.
impl LayoutDisplay for VolumeGeometry {
    fn display_layout(&self, indent: u8) -> Result<String, fmt::Error> {
        let mut out = String::from("");
        let indent = " ".repeat(indent.into());

        let fat_start = self.reserved_sectors as u64;
        let data_start = fat_start + self.fat_size_sectors as u64 * self.fat_copy_count as u64;
        let data_end =
            data_start + self.data_cluster_count() as u64 * self.sectors_per_cluster as u64;

        writeln!(out, "{}┌{:─^55}┐", indent, " FAT32 Volume Layout ")?;
        writeln!(
            out,
            "{}├{:^12}┬{:^12}┬{:^12}┬{:^16}┤",
            indent, "Region", "Start", "End", "Description"
        )?;
        writeln!(
            out,
            "{}├{:─<12}┼{:─<12}┼{:─<12}┼{:─<16}┤",
            indent, "", "", "", ""
        )?;
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent, "Reserved", 0, fat_start, "Boot + FSInfo"
        )?;
        for i in 0..self.fat_copy_count {
            let fat_i_start = fat_start + i as u64 * self.fat_size_sectors as u64;
            let fat_i_end = fat_i_start + self.fat_size_sectors as u64;
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                format!("FAT #{i}"),
                fat_i_start,
                fat_i_end,
                "FAT Tables"
            )?;
        }
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent, "Data", data_start, data_end, "Cluster Data"
        )?;
        writeln!(
            out,
            "{}└{:─<12}┴{:─<12}┴{:─<12}┴{:─<16}┘",
            indent, "", "", "", ""
        )?;

        Ok(out)
    }
}
