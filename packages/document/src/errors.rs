//! Error types for the document model

use crate::id::{BlockId, DocumentId};
use scriptory_templates::BlockKind;
use std::ops::Range;
use thiserror::Error;

/// Structural errors. A failed operation leaves the tree untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Block not found: {0}")]
    NotFound(BlockId),

    #[error("{parent_kind} cannot contain {child_kind} (parent {parent})")]
    InvalidParent {
        parent: BlockId,
        parent_kind: BlockKind,
        child_kind: BlockKind,
    },

    #[error("Moving {block} under {new_parent} would create a cycle")]
    CycleRejected { block: BlockId, new_parent: BlockId },

    #[error("Range {range:?} is outside the text of {block} ({len} chars)")]
    InvalidRange {
        block: BlockId,
        range: Range<usize>,
        len: usize,
    },

    #[error("The root block cannot be deleted, moved or retyped")]
    RootImmutable,

    #[error("Block {0} is not deleted")]
    NotDeleted(BlockId),

    #[error("Corrupt tree: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported schema version {found} (newest supported is {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("Malformed stored document: {0}")]
    Malformed(String),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}
