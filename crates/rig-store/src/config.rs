//! `StoreConfig`: where and how to open the persistence connection.
//!
//! Mirrors this codebase's local-storage config shape — a small struct with
//! a constructor per common case rather than a builder, since there are
//! only ever two: an on-disk path and an in-memory database for tests.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
}

impl StoreConfig {
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self {
            location: StoreLocation::File(path.as_ref().to_path_buf()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
        }
    }
}
