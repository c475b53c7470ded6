//! Leading entries of the first FAT.
//!
//! FAT entries 0 and 1 do not describe clusters: entry 0 echoes the media
//! descriptor and entry 1 holds the end-of-chain marker along with the
//! clean-shutdown and hard-error status bits. They are decoded for reporting only.

use binread::{BinRead, BinReaderExt};
use getset::CopyGetters;
use std::fmt;
use std::io::{self, Read, Seek};

use super::boot_sector::VolumeGeometry;
use super::fat_error::FATError;
use crate::volume::reader::VolumeReader;

/// Number of bytes decoded at the start of the FAT region.
pub const FAT_HEADER_LEN: usize = 8;

/// The first two 32-bit entries of the FAT.
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[br(little)]
pub struct FatHeaderInfo {
    /// FAT entry 0: media descriptor in the low byte, remaining bits set
    #[getset(get_copy = "pub")]
    media_type_dword: u32,
    /// FAT entry 1: end-of-chain marker and volume status bits
    #[getset(get_copy = "pub")]
    partition_status_dword: u32,
}

impl FatHeaderInfo {
    /// Reads the FAT header located right after the reserved sectors.
    ///
    /// # Errors
    /// - `FATError::Volume`: If the 8 bytes cannot be read
    pub fn read<R: Read + Seek>(
        reader: &mut VolumeReader<R>,
        geometry: &VolumeGeometry,
    ) -> Result<Self, FATError> {
        let buf = reader.read_exact_at(geometry.fat_start(), FAT_HEADER_LEN)?;
        let mut cursor = io::Cursor::new(buf);
        Ok(cursor.read_le()?)
    }
}

impl fmt::Display for FatHeaderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FAT Information:")?;
        writeln!(f, "  {:<32} 0x{:X}", "Media Type", self.media_type_dword)?;
        writeln!(
            f,
            "  {:<32} 0x{:X}",
            "Partition Status", self.partition_status_dword
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::boot_sector::tests::boot_sector;
    use crate::volume::volume_error::VolumeError;
    use std::io::Cursor;

    #[test]
    fn reads_entries_at_fat_start() {
        let geometry = VolumeGeometry::parse(&boot_sector(512, 1, 4, 2, 8)).unwrap();
        let mut image = vec![0u8; 512 * 8];
        image[2048..2056].copy_from_slice(&[0xF8, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF, 0xFF, 0x0F]);

        let mut reader = VolumeReader::new(Cursor::new(image));
        let header = FatHeaderInfo::read(&mut reader, &geometry).unwrap();

        assert_eq!(header.media_type_dword(), 0x0FFFFFF8);
        assert_eq!(header.partition_status_dword(), 0x0FFFFFFF);
    }

    #[test]
    fn missing_fat_region_is_an_error() {
        let geometry = VolumeGeometry::parse(&boot_sector(512, 1, 4, 2, 8)).unwrap();
        let mut reader = VolumeReader::new(Cursor::new(vec![0u8; 1024]));

        assert!(matches!(
            FatHeaderInfo::read(&mut reader, &geometry),
            Err(FATError::Volume(VolumeError::Truncated { .. }))
        ));
    }
}
