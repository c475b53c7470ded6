//! Raw volume access: identifier resolution and bounded random-access reads.

pub mod reader;
pub mod resolver;
pub mod volume_error;
