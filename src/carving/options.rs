//! Carving configuration.

use encoding_rs::{EUC_KR, Encoding};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use super::carve_error::CarveError;
use crate::filesystem::boot_sector::VolumeGeometry;

/// Which clusters a scan visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarveMode {
    /// Every data cluster, starting at scan cursor 1.
    AllClusters,
    /// The clusters from the FSInfo next-free hint up to the free cluster count.
    #[default]
    UnallocatedOnly,
}

/// Number of FAT copies assumed to precede the data region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FatCopies {
    /// Use the boot sector's FAT count.
    #[default]
    FromBootSector,
    /// Use a fixed count regardless of the boot sector. `Fixed(2)` matches
    /// tools that hardcode two FATs.
    Fixed(u8),
}

impl FatCopies {
    /// Returns the number of FAT copies to skip for `geometry`.
    pub fn count(self, geometry: &VolumeGeometry) -> u8 {
        match self {
            FatCopies::FromBootSector => geometry.fat_copy_count(),
            FatCopies::Fixed(count) => count,
        }
    }
}

/// Options of a carving scan.
#[derive(Debug, Clone)]
pub struct CarveOptions {
    /// Clusters to visit
    pub mode: CarveMode,
    /// FAT copies skipped when locating the data region
    pub fat_copies: FatCopies,
    /// Charset of the member names of plain ZIP archives
    pub charset: &'static Encoding,
    /// The scan stops at the next cluster once this flag is `false`
    pub running: Option<Arc<AtomicBool>>,
}

impl Default for CarveOptions {
    fn default() -> Self {
        Self {
            mode: CarveMode::default(),
            fat_copies: FatCopies::default(),
            charset: EUC_KR,
            running: None,
        }
    }
}

impl CarveOptions {
    /// Selects the ZIP member name charset by its WHATWG label (e.g. "euc-kr", "cp437").
    ///
    /// # Errors
    /// - `CarveError::Configuration` if the label names no known encoding
    pub fn with_charset_label(mut self, label: &str) -> Result<Self, CarveError> {
        self.charset = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| CarveError::Configuration(format!("Unknown charset `{label}`")))?;
        Ok(self)
    }
}
