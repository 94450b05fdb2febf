//! Error types for the editor

use scriptory_document::{BlockId, TreeError};
use scriptory_layout::LayoutError;
use scriptory_templates::{BlockKind, NumberingClass};
use thiserror::Error;

/// A command that could not be applied. The document is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("{block} is not numbered in class {class}")]
    NotNumbered { block: BlockId, class: NumberingClass },

    #[error("{first} comes after {last} in document order")]
    InvertedRange { first: BlockId, last: BlockId },

    #[error("Import rejected: {parent_kind} cannot contain {child_kind}")]
    ImportRejected {
        parent_kind: BlockKind,
        child_kind: BlockKind,
    },
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("History is corrupt: {0}")]
    History(String),
}

impl From<TreeError> for EditorError {
    fn from(e: TreeError) -> Self {
        EditorError::Command(CommandError::Tree(e))
    }
}
