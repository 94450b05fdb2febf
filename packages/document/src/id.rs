//! Stable identifiers for blocks and documents.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a block: an index into the tree's arena.
///
/// Slots are never reused, so a handle stays meaningful for the lifetime of
/// the document and can be persisted as a bookmark or comment anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Document identifier used as the storage key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic id derived from a project-relative key (CRC32, hex)
    pub fn from_key(key: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(key.as_bytes());
        Self(format!("{:08x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
