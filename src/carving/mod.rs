//! Signature carving over the clusters of a FAT32 volume.

pub mod carve_error;
pub mod carver;
pub mod options;
pub mod signature;
pub mod zip;
