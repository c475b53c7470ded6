//! A carving session over one FAT32 volume.
//!
//! The session owns the volume reader and the metadata decoded from it. The
//! boot sector, FSInfo sector and FAT header are read exactly once, when the
//! session is opened. A failure at any of these steps drops the reader, which
//! closes the volume.

use log::{info, warn};
use std::fs::File;
use std::io::{Read, Seek};

use crate::carving::carve_error::CarveError;
use crate::carving::carver::ClusterCarver;
use crate::carving::options::CarveOptions;
use crate::filesystem::boot_sector::{BOOT_SECTOR_LEN, VolumeGeometry};
use crate::filesystem::fat_header::FatHeaderInfo;
use crate::filesystem::fs_info::{FS_INFO_LEN, FsInfo};
use crate::volume::reader::VolumeReader;
use crate::volume::resolver::ResolvedVolume;
use crate::volume::volume_error::VolumeError;

/// Filesystem type a volume must report to be carved.
pub const SUPPORTED_FS_TYPE: &str = "FAT32";

/// An opened FAT32 volume with its decoded metadata.
pub struct Session<R = File> {
    reader: VolumeReader<R>,
    geometry: VolumeGeometry,
    fs_info: Option<FsInfo>,
    fat_header: FatHeaderInfo,
}

impl Session<File> {
    /// Opens a resolved volume and decodes its metadata.
    ///
    /// # Errors
    /// - `VolumeError::WrongFilesystemType` if the volume does not report FAT32; nothing is opened
    /// - `VolumeError::Device` if the device cannot be opened
    /// - `FATError` variants if the boot sector is invalid or the FAT header cannot be read
    pub fn open(volume: &ResolvedVolume) -> Result<Self, CarveError> {
        if volume.fs_type() != SUPPORTED_FS_TYPE {
            return Err(VolumeError::WrongFilesystemType(volume.fs_type().clone()).into());
        }

        let reader = VolumeReader::open(volume.device_path())?;
        Self::from_reader(reader)
    }
}

impl<R: Read + Seek> Session<R> {
    /// Decodes the metadata of the volume behind `reader`.
    ///
    /// # Errors
    /// - `FATError::InvalidSignature` and other boot sector errors are fatal
    /// - `FATError::Volume` if the FAT header cannot be read
    pub fn from_reader(mut reader: VolumeReader<R>) -> Result<Self, CarveError> {
        let boot_sector = reader.read_at(0, BOOT_SECTOR_LEN)?;
        let geometry = VolumeGeometry::parse(&boot_sector)?;
        reader.set_sector_size(geometry.bytes_per_sector());
        info!(
            "FAT32 volume {:?}: {} clusters of {} bytes",
            geometry.volume_label(),
            geometry.cluster_count(),
            geometry.cluster_size()
        );

        let fs_info = Self::read_fs_info(&mut reader, &geometry)?;
        let fat_header = FatHeaderInfo::read(&mut reader, &geometry)?;

        Ok(Self {
            reader,
            geometry,
            fs_info,
            fat_header,
        })
    }

    fn read_fs_info(
        reader: &mut VolumeReader<R>,
        geometry: &VolumeGeometry,
    ) -> Result<Option<FsInfo>, CarveError> {
        let sector = match geometry.fsinfo_sector() {
            0 | 0xFFFF => {
                warn!("Boot sector does not reference an FSInfo sector");
                return Ok(None);
            }
            sector => sector,
        };

        let buf = reader.read_at(geometry.sector_to_byte(sector.into()), FS_INFO_LEN)?;
        Ok(FsInfo::parse(&buf))
    }

    /// Geometry decoded from the boot sector.
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// FSInfo counters, absent if the FSInfo sector is missing or invalid.
    pub fn fs_info(&self) -> Option<&FsInfo> {
        self.fs_info.as_ref()
    }

    /// First two FAT entries.
    pub fn fat_header(&self) -> &FatHeaderInfo {
        &self.fat_header
    }

    /// Prepares a scan of this volume.
    ///
    /// # Errors
    /// - `CarveError::Configuration` if the options cannot be satisfied, e.g. an
    ///   unallocated scan on a volume without FSInfo
    pub fn carver(&mut self, options: &CarveOptions) -> Result<ClusterCarver<'_, R>, CarveError> {
        ClusterCarver::new(
            &mut self.reader,
            &self.geometry,
            self.fs_info.as_ref(),
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::boot_sector::tests::boot_sector;
    use crate::filesystem::fat_error::FATError;
    use crate::filesystem::fs_info::tests::fs_info_sector;
    use crate::volume::reader::tests::SectorDevice;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn volume(fs_info: Option<Vec<u8>>) -> Vec<u8> {
        let mut image = vec![0u8; 512 * 16];
        image[..512].copy_from_slice(&boot_sector(512, 1, 4, 2, 2));
        if let Some(sector) = fs_info {
            image[512..1024].copy_from_slice(&sector);
        }
        image[2048..2056].copy_from_slice(&[0xF8, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF, 0xFF, 0x07]);
        image
    }

    #[test]
    fn from_reader_decodes_all_metadata() {
        let image = volume(Some(fs_info_sector(10, 3)));
        let session = Session::from_reader(VolumeReader::new(Cursor::new(image))).unwrap();

        assert_eq!(session.geometry().reserved_sectors(), 4);
        assert_eq!(session.fs_info().unwrap().free_cluster_count(), 10);
        assert_eq!(session.fs_info().unwrap().next_free_cluster(), 3);
        assert_eq!(session.fat_header().partition_status_dword(), 0x07FFFFFF);
    }

    #[test]
    fn missing_fs_info_is_not_fatal() {
        let session = Session::from_reader(VolumeReader::new(Cursor::new(volume(None)))).unwrap();
        assert!(session.fs_info().is_none());
    }

    fn with_fsinfo_sector(mut image: Vec<u8>, sector: u16) -> Vec<u8> {
        image[0x30..0x32].copy_from_slice(&sector.to_le_bytes());
        image
    }

    #[test]
    fn fsinfo_sector_zero_means_no_fs_info() {
        let image = with_fsinfo_sector(volume(Some(fs_info_sector(10, 3))), 0);
        let session = Session::from_reader(VolumeReader::new(Cursor::new(image))).unwrap();
        assert!(session.fs_info().is_none());
    }

    #[test]
    fn fsinfo_sector_ffff_means_no_fs_info() {
        let image = with_fsinfo_sector(volume(Some(fs_info_sector(10, 3))), 0xFFFF);
        let session = Session::from_reader(VolumeReader::new(Cursor::new(image))).unwrap();
        assert!(session.fs_info().is_none());
    }

    #[test]
    fn fsinfo_sector_past_the_end_is_not_fatal() {
        let image = with_fsinfo_sector(volume(Some(fs_info_sector(10, 3))), 100);
        let session = Session::from_reader(VolumeReader::new(Cursor::new(image))).unwrap();
        assert!(session.fs_info().is_none());
    }

    #[test]
    fn fsinfo_sector_is_read_where_the_boot_sector_points() {
        let mut image = with_fsinfo_sector(volume(None), 6);
        image[6 * 512..7 * 512].copy_from_slice(&fs_info_sector(42, 9));

        let session = Session::from_reader(VolumeReader::new(Cursor::new(image))).unwrap();
        assert_eq!(session.fs_info().unwrap().free_cluster_count(), 42);
    }

    #[test]
    fn opens_and_carves_a_sector_addressed_device() {
        let mut image = volume(Some(fs_info_sector(10, 3)));
        // Data region starts at sector 8; cursor 4 is sector 12.
        image[12 * 512..12 * 512 + 4].copy_from_slice(b"%PDF");

        let mut session =
            Session::from_reader(VolumeReader::new(SectorDevice::new(image))).unwrap();
        assert_eq!(session.fat_header().media_type_dword(), 0x0FFFFFF8);
        assert_eq!(session.fs_info().unwrap().next_free_cluster(), 3);

        let hits: Vec<_> = session.carver(&CarveOptions::default()).unwrap().collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].to_string(), "5 - pdf");
    }

    #[test]
    fn unallocated_scan_requires_fs_info() {
        let mut session =
            Session::from_reader(VolumeReader::new(Cursor::new(volume(None)))).unwrap();
        assert!(matches!(
            session.carver(&CarveOptions::default()),
            Err(CarveError::Configuration(_))
        ));
    }

    #[test]
    fn invalid_boot_sector_is_fatal() {
        let mut image = volume(Some(fs_info_sector(10, 3)));
        image[0x1FF] = 0;

        assert!(matches!(
            Session::from_reader(VolumeReader::new(Cursor::new(image))),
            Err(CarveError::FAT(FATError::InvalidSignature(0x5500)))
        ));
    }

    #[test]
    fn empty_volume_has_no_boot_sector() {
        assert!(matches!(
            Session::from_reader(VolumeReader::new(Cursor::new(Vec::new()))),
            Err(CarveError::FAT(FATError::InvalidSectorLength(0)))
        ));
    }

    #[test]
    fn wrong_filesystem_type_is_rejected_before_opening() {
        let volume = ResolvedVolume::new("/nonexistent/ntfs.img", "NTFS");
        assert!(matches!(
            Session::open(&volume),
            Err(CarveError::Volume(VolumeError::WrongFilesystemType(fs))) if fs == "NTFS"
        ));
    }

    #[test]
    fn filesystem_type_check_is_case_sensitive() {
        let volume = ResolvedVolume::new("/nonexistent/fat.img", "fat32");
        assert!(matches!(
            Session::open(&volume),
            Err(CarveError::Volume(VolumeError::WrongFilesystemType(_)))
        ));
    }

    #[test]
    fn unopenable_device_is_a_device_error() {
        let volume = ResolvedVolume::new("/nonexistent/fat.img", "FAT32");
        assert!(matches!(
            Session::open(&volume),
            Err(CarveError::Volume(VolumeError::Device { .. }))
        ));
    }

    #[test]
    fn open_reads_image_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&volume(Some(fs_info_sector(10, 3)))).unwrap();
        file.flush().unwrap();

        let session = Session::open(&ResolvedVolume::new(file.path(), "FAT32")).unwrap();
        assert_eq!(session.geometry().fs_type_tag(), "FAT32");
    }
}
