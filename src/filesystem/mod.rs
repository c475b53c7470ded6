//! FAT32 metadata: boot sector geometry, FSInfo counters and the FAT header.

pub mod boot_sector;
pub mod fat_error;
pub mod fat_header;
pub mod fs_info;
