//! # Scriptory Document
//!
//! The structured document model: a tree of typed blocks with formatted text
//! runs, plus the numbering, revision and continuity state that travels with
//! a document, and versioned JSON storage.
//!
//! All tree mutations go through [`BlockTree`], which validates before it
//! changes anything. Readers that must not observe in-flight edits (layout,
//! export) take a [`TreeSnapshot`], which shares structure with the tree and
//! costs one reference-count increment.

mod block;
mod continuity;
mod document;
mod errors;
pub mod grammar;
mod id;
mod numbering;
mod revisions;
mod source;
pub mod storage;
mod subtree;
mod tree;

pub use block::{
    format_at, normalize_runs, runs_char_len, runs_text, splice_runs, Block, CommentId, Format,
    NumberLabel, Numbering, RevisionId, Run,
};
pub use continuity::{ContinuityLedger, SplitMarker};
pub use document::Document;
pub use errors::{StorageError, TreeError};
pub use id::{BlockId, DocumentId};
pub use numbering::{suffix_index, suffix_letters, LockState, NumberingState};
pub use revisions::{Revision, RevisionMarks};
pub use source::{BlockSource, Slot, TreeSnapshot};
pub use storage::{DocumentStore, FileStore, MemoryStore};
pub use subtree::{DetachedBlock, DetachedSubtree};
pub use tree::{BlockTree, Placement};
