//!
//! FATCarver: A library and CLI for signature-based file carving on FAT32 volumes.
//!
//! This crate provides tools for:
//! - Decoding the FAT32 boot sector, FSInfo sector and FAT header from raw sectors
//! - Scanning cluster-aligned offsets for known file magics
//! - Refining ZIP hits into Office Open XML subtypes or archive member names
//! - Printing volume metadata and carve results
//!
//! A scan visits either every data cluster or only the clusters the FSInfo
//! counters describe as unallocated. Allocation is never read from the FAT.
//!
//! # Re-exports
//! - [`Session`]: An opened volume with its decoded metadata
//! - [`ClusterCarver`]: The cluster scan, as an iterator of [`CarveResult`]
//! - [`CarveOptions`]: Scan mode, FAT copy count, charset and cancellation

pub mod carving;
pub mod filesystem;
pub mod session;
pub mod traits;
pub mod utils;
pub mod volume;

/// Error of a carving session (see [`carving::carve_error::CarveError`]).
pub use crate::carving::carve_error::CarveError;
/// The cluster scan and its hits (see [`carving::carver`]).
pub use crate::carving::carver::{CarveResult, ClusterCarver};
/// Scan configuration (see [`carving::options`]).
pub use crate::carving::options::{CarveMode, CarveOptions, FatCopies};
/// Guessed file types (see [`carving::signature`] and [`carving::zip`]).
pub use crate::carving::signature::FileKind;
pub use crate::carving::zip::ZipKind;
/// An opened volume (see [`session::Session`]).
pub use crate::session::Session;
