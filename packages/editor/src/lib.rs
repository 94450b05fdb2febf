//! # Scriptory Editor
//!
//! Editing engine for Scriptory documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: block tree + numbering state      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: commands + continuity + history     │
//! │  - Apply commands with eager inverses       │
//! │  - Renumber after structural changes        │
//! │  - Undo/redo in strict LIFO order           │
//! │  - Drive incremental pagination             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ layout: block tree → PageLayout             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the source of truth**: pages and markers are derived views
//! 2. **Exact undo**: follow-up renumbering is recorded with the edit that
//!    caused it and replayed, never recomputed
//! 3. **Stale work is dropped**: every edit bumps a generation, and layouts
//!    computed for an older generation are never shown
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scriptory_editor::{Command, Editor};
//!
//! let mut editor = Editor::new(document, registry);
//! let result = editor.apply(Command::InsertBlock {
//!     parent: editor.document().root(),
//!     index: 0,
//!     kind: BlockKind::SceneHeading,
//!     runs: vec![Run::plain("INT. KITCHEN - DAY")],
//! })?;
//!
//! for event in &result.events {
//!     println!("{:?}", event);
//! }
//!
//! editor.undo()?;
//! ```

mod commands;
mod continuity;
mod editor;
mod errors;
mod events;
mod pipeline;
mod undo_stack;

pub use commands::{type_text, Applied, Command};
pub use continuity::{
    correct_numbering, eligible, markers_in, plan_numbers, reconcile_markers, Effect,
    FreezeLockedNumbers, NumberPlan, PostEffect, PostEffectEngine, Renumber,
};
pub use editor::{Editor, EditorConfig, ImportReport};
pub use errors::{CommandError, EditorError};
pub use events::{CommandResult, EditorEvent, EventBus, RenumberReason};
pub use pipeline::LayoutPipeline;
pub use undo_stack::{CommandBatch, UndoStack};
