//! Cluster-by-cluster signature carving.
//!
//! The carver walks cluster-aligned offsets of the data region, reads the first
//! bytes of each cluster and reports the clusters that start with a known file
//! magic. Allocation state is approximated from the FSInfo counters: the FAT
//! itself is never walked.
//!
//! Cluster positions are expressed as a scan cursor where cursor 0 is the first
//! cluster of the data region. Results report `cursor + 1`.

use getset::{CopyGetters, Getters};
use log::{debug, info, warn};
use std::fmt;
use std::io::{Read, Seek};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::carve_error::CarveError;
use super::options::{CarveMode, CarveOptions};
use super::signature::{FileKind, PREFIX_LEN, classify};
use super::zip::ZipSubclassifier;
use crate::filesystem::boot_sector::VolumeGeometry;
use crate::filesystem::fs_info::FsInfo;
use crate::volume::reader::VolumeReader;
use crate::volume::volume_error::VolumeError;

/// FSInfo value meaning the next free cluster is unknown.
const UNKNOWN_NEXT_FREE: u32 = 0xFFFF_FFFF;

/// A cluster whose leading bytes match a known file magic.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct CarveResult {
    /// 1-based cluster number: the scan cursor plus one
    #[getset(get_copy = "pub")]
    cluster_number: u32,
    /// Guessed type of the file starting in this cluster
    #[getset(get = "pub")]
    kind: FileKind,
}

impl CarveResult {
    pub fn new(cluster_number: u32, kind: FileKind) -> Self {
        Self {
            cluster_number,
            kind,
        }
    }
}

impl fmt::Display for CarveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.cluster_number, self.kind)
    }
}

/// Progress of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// No cluster read yet.
    Idle,
    /// `cursor` is the next cluster to read, located at byte `offset`.
    Scanning { cursor: u64, offset: u64 },
    /// The bound, the end of the volume or a cancellation was reached.
    Done,
}

/// Signature scan over the clusters of a FAT32 volume.
///
/// The carver is an iterator: each call to `next` reads clusters until one
/// yields a [`CarveResult`] or the scan ends.
pub struct ClusterCarver<'a, R> {
    reader: &'a mut VolumeReader<R>,
    geometry: &'a VolumeGeometry,
    zip: ZipSubclassifier,
    fat_copies: u8,
    /// First cursor value to scan.
    start: u64,
    /// Exclusive upper bound of the cursor.
    end: u64,
    running: Option<Arc<AtomicBool>>,
    state: ScanState,
}

impl<'a, R: Read + Seek> ClusterCarver<'a, R> {
    /// Prepares a scan. No data is read until the first call to `next`.
    ///
    /// # Parameters
    /// - `reader`: The volume to scan
    /// - `geometry`: The geometry decoded from the volume's boot sector
    /// - `fs_info`: The FSInfo counters, if the volume has a valid FSInfo sector
    /// - `options`: Scan mode, FAT copy count, charset and cancellation flag
    ///
    /// # Errors
    /// - `CarveError::Configuration` if `CarveMode::UnallocatedOnly` is requested without FSInfo
    pub fn new(
        reader: &'a mut VolumeReader<R>,
        geometry: &'a VolumeGeometry,
        fs_info: Option<&FsInfo>,
        options: &CarveOptions,
    ) -> Result<Self, CarveError> {
        let (start, end) = match options.mode {
            // Cursor `data_cluster_count` would already lie past the last data cluster.
            CarveMode::AllClusters => (1, geometry.data_cluster_count() as u64),
            CarveMode::UnallocatedOnly => {
                let fs_info = fs_info.ok_or_else(|| {
                    CarveError::Configuration(String::from(
                        "Carving unallocated clusters requires a valid FSInfo sector.",
                    ))
                })?;
                if fs_info.next_free_cluster() == UNKNOWN_NEXT_FREE {
                    warn!("FSInfo does not know the next free cluster");
                }
                (
                    fs_info.next_free_cluster() as u64,
                    fs_info.free_cluster_count() as u64 + 1,
                )
            }
        };
        // Keeps every reported cluster number (`cursor + 1`) within u32.
        let end = end.min(u32::MAX as u64);

        Ok(Self {
            reader,
            geometry,
            zip: ZipSubclassifier::new(options.charset)?,
            fat_copies: options.fat_copies.count(geometry),
            start,
            end,
            running: options.running.clone(),
            state: ScanState::Idle,
        })
    }

    /// Starts the scan from a checkpointed cursor instead of the mode's start.
    ///
    /// Has no effect once the scan has started.
    pub fn resume(mut self, cursor: u32) -> Self {
        if self.state == ScanState::Idle {
            self.start = cursor as u64;
        }
        self
    }

    /// Returns the cursor of the next cluster to scan, or `None` once the scan is done.
    pub fn cursor(&self) -> Option<u32> {
        match self.state {
            ScanState::Idle => u32::try_from(self.start).ok(),
            ScanState::Scanning { cursor, .. } => u32::try_from(cursor).ok(),
            ScanState::Done => None,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.load(Ordering::SeqCst))
    }

    /// Reads and classifies the cluster at `offset`.
    fn classify_cluster(&mut self, offset: u64) -> Result<Option<FileKind>, VolumeError> {
        let prefix = self.reader.read_exact_at(offset, PREFIX_LEN)?;

        let Some(signature) = classify(&prefix) else {
            return Ok(None);
        };

        match signature.file_kind() {
            Some(kind) => Ok(Some(kind)),
            None => {
                let zip = self.zip.classify_at(&mut *self.reader, offset)?;
                debug!("ZIP container at offset {offset} classified as {zip}");
                Ok(Some(FileKind::Zip(zip)))
            }
        }
    }
}

impl<R: Read + Seek> Iterator for ClusterCarver<'_, R> {
    type Item = CarveResult;

    fn next(&mut self) -> Option<CarveResult> {
        loop {
            let (cursor, offset) = match self.state {
                ScanState::Idle => {
                    info!(
                        "Scanning clusters {} to {} ({} FAT copies skipped)",
                        self.start + 1,
                        self.end,
                        self.fat_copies
                    );
                    self.state = ScanState::Scanning {
                        cursor: self.start,
                        offset: self.geometry.cluster_offset(self.start, self.fat_copies),
                    };
                    continue;
                }
                ScanState::Scanning { cursor, offset } => (cursor, offset),
                ScanState::Done => return None,
            };

            if cursor >= self.end {
                info!("Scan complete at cluster {cursor}");
                self.state = ScanState::Done;
                return None;
            }
            if self.is_cancelled() {
                info!("Scan cancelled before cluster {}", cursor + 1);
                self.state = ScanState::Done;
                return None;
            }

            self.state = ScanState::Scanning {
                cursor: cursor + 1,
                offset: offset + self.geometry.cluster_size(),
            };

            let cluster_number = (cursor + 1) as u32;
            match self.classify_cluster(offset) {
                Ok(Some(kind)) => {
                    debug!("Cluster {cluster_number} at offset {offset}: {kind}");
                    return Some(CarveResult::new(cluster_number, kind));
                }
                Ok(None) => {}
                Err(VolumeError::Truncated { .. }) => {
                    info!("Reached the end of the volume at offset {offset}");
                    self.state = ScanState::Done;
                    return None;
                }
                Err(err) => warn!("Skipping cluster {cluster_number}: {err}"),
            }
        }
    }
}
