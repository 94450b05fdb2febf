//! # Commands
//!
//! Every change to a document goes through a [`Command`].
//!
//! ## Design Principles
//!
//! 1. **Intent-preserving**: each command is one editing operation a writer
//!    would recognise (type, delete, retype, lock numbering).
//! 2. **Validated**: the tree checks grammar, cycles and ranges before it
//!    mutates, so a failed command leaves the document untouched.
//! 3. **Eager inverses**: applying a command returns the commands that undo
//!    it, captured at the moment of application instead of diffed later.
//!
//! ## Replay
//!
//! Redo replays the *replay form* of a command. For inserts that is a
//! `RestoreBlock` of the handle the insert allocated, so redo brings back the
//! same handle instead of allocating a new one.

use crate::errors::CommandError;
use scriptory_document::{
    runs_char_len, BlockId, BlockSource, DetachedSubtree, Document, LockState, Numbering, Run,
};
use scriptory_templates::{BlockKind, NumberingClass, Template};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Insert a new block under `parent` at `index`
    InsertBlock {
        parent: BlockId,
        index: usize,
        kind: BlockKind,
        runs: Vec<Run>,
    },

    /// Tombstone a block and its descendants
    DeleteBlock { block: BlockId },

    /// Bring a tombstoned block back
    RestoreBlock {
        block: BlockId,
        parent: BlockId,
        index: usize,
    },

    MoveBlock {
        block: BlockId,
        new_parent: BlockId,
        index: usize,
    },

    /// Replace the chars in `range` with `runs`
    EditText {
        block: BlockId,
        range: Range<usize>,
        runs: Vec<Run>,
    },

    SetKind { block: BlockId, kind: BlockKind },

    /// Assign (or clear) a block's number explicitly
    SetNumber {
        block: BlockId,
        numbering: Option<Numbering>,
    },

    /// Paste a detached subtree with fresh handles
    InsertSubtree {
        parent: BlockId,
        index: usize,
        subtree: DetachedSubtree,
    },

    /// Freeze every current number of a class
    LockNumbering { class: NumberingClass },

    /// Freeze the numbers from `first` to `last` (document order)
    LockRange {
        class: NumberingClass,
        first: BlockId,
        last: BlockId,
    },

    UnlockNumbering { class: NumberingClass },

    /// Put a class back into an earlier lock state (undo of the lock commands)
    RestoreNumbering {
        class: NumberingClass,
        state: LockState,
    },
}

/// Outcome of applying one command
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// What redo replays
    pub replay: Command,

    /// Commands that undo this one, in the order they must run
    pub inverse: Vec<Command>,

    /// Blocks whose content, kind or position changed
    pub touched: Vec<BlockId>,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::InsertBlock { .. } => "insert_block",
            Command::DeleteBlock { .. } => "delete_block",
            Command::RestoreBlock { .. } => "restore_block",
            Command::MoveBlock { .. } => "move_block",
            Command::EditText { .. } => "edit_text",
            Command::SetKind { .. } => "set_kind",
            Command::SetNumber { .. } => "set_number",
            Command::InsertSubtree { .. } => "insert_subtree",
            Command::LockNumbering { .. } => "lock_numbering",
            Command::LockRange { .. } => "lock_range",
            Command::UnlockNumbering { .. } => "unlock_numbering",
            Command::RestoreNumbering { .. } => "restore_numbering",
        }
    }

    /// Changes which blocks exist, where they sit or what kind they are
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Command::InsertBlock { .. }
                | Command::DeleteBlock { .. }
                | Command::RestoreBlock { .. }
                | Command::MoveBlock { .. }
                | Command::SetKind { .. }
                | Command::InsertSubtree { .. }
        )
    }

    /// Whether numbering must be re-checked after this command
    pub fn affects_numbering(&self) -> bool {
        self.is_structural()
            || matches!(
                self,
                Command::SetNumber { .. }
                    | Command::LockNumbering { .. }
                    | Command::LockRange { .. }
                    | Command::UnlockNumbering { .. }
                    | Command::RestoreNumbering { .. }
            )
    }

    /// Validate without applying.
    ///
    /// Only checks what the tree itself cannot: lock ranges must name two
    /// live numbered blocks in document order.
    pub fn validate(&self, document: &Document, template: &Template) -> Result<(), CommandError> {
        if let Command::LockRange { class, first, last } = self {
            let tree = &document.tree;
            for block in [*first, *last] {
                let kind = tree
                    .get(block)
                    .map(|b| b.kind)
                    .ok_or(scriptory_document::TreeError::NotFound(block))?;
                if template.numbering_class(kind) != Some(*class) {
                    return Err(CommandError::NotNumbered {
                        block,
                        class: *class,
                    });
                }
            }
            let order = tree.document_order();
            let position = |id: BlockId| order.iter().position(|b| *b == id);
            if position(*first) > position(*last) {
                return Err(CommandError::InvertedRange {
                    first: *first,
                    last: *last,
                });
            }
        }
        Ok(())
    }

    /// Apply to the document, returning the inverse captured on the way.
    pub fn apply(&self, document: &mut Document, template: &Template) -> Result<Applied, CommandError> {
        self.validate(document, template)?;
        let tree = &mut document.tree;

        let applied = match self {
            Command::InsertBlock {
                parent,
                index,
                kind,
                runs,
            } => {
                let block = tree.insert_block(*parent, *index, *kind, runs.clone())?;
                inserted(tree, block, *parent, *index)
            }

            Command::InsertSubtree {
                parent,
                index,
                subtree,
            } => {
                let block = tree.import_subtree(*parent, *index, subtree)?;
                inserted(tree, block, *parent, *index)
            }

            Command::DeleteBlock { block } => {
                let placement = tree.delete_block(*block)?;
                Applied {
                    replay: self.clone(),
                    inverse: vec![Command::RestoreBlock {
                        block: *block,
                        parent: placement.parent,
                        index: placement.index,
                    }],
                    touched: vec![*block],
                }
            }

            Command::RestoreBlock {
                block,
                parent,
                index,
            } => {
                tree.restore_block(*block, *parent, *index)?;
                Applied {
                    replay: self.clone(),
                    inverse: vec![Command::DeleteBlock { block: *block }],
                    touched: vec![*block],
                }
            }

            Command::MoveBlock {
                block,
                new_parent,
                index,
            } => {
                let old = tree.move_block(*block, *new_parent, *index)?;
                Applied {
                    replay: self.clone(),
                    inverse: vec![Command::MoveBlock {
                        block: *block,
                        new_parent: old.parent,
                        index: old.index,
                    }],
                    touched: vec![*block],
                }
            }

            Command::EditText { block, range, runs } => {
                let removed = tree.edit_text(*block, range.clone(), runs.clone())?;
                let inserted_len = runs_char_len(runs);
                Applied {
                    replay: self.clone(),
                    inverse: vec![Command::EditText {
                        block: *block,
                        range: range.start..range.start + inserted_len,
                        runs: removed,
                    }],
                    touched: vec![*block],
                }
            }

            Command::SetKind { block, kind } => {
                let numbering = tree.get(*block).and_then(|b| b.numbering.clone());
                let old = tree.set_kind(*block, *kind)?;
                // Retyping clears the number; put it back after the kind
                let mut inverse = vec![Command::SetKind {
                    block: *block,
                    kind: old,
                }];
                if old != *kind && numbering.is_some() {
                    inverse.push(Command::SetNumber {
                        block: *block,
                        numbering,
                    });
                }
                Applied {
                    replay: self.clone(),
                    inverse,
                    touched: vec![*block],
                }
            }

            Command::SetNumber { block, numbering } => {
                let old = tree.set_numbering(*block, numbering.clone())?;
                Applied {
                    replay: self.clone(),
                    inverse: vec![Command::SetNumber {
                        block: *block,
                        numbering: old,
                    }],
                    touched: vec![*block],
                }
            }

            Command::LockNumbering { class } => {
                set_state(document, self, *class, LockState::Locked)
            }

            Command::LockRange { class, first, last } => set_state(
                document,
                self,
                *class,
                LockState::PartiallyLocked {
                    first: *first,
                    last: *last,
                },
            ),

            Command::UnlockNumbering { class } => {
                set_state(document, self, *class, LockState::Unlocked)
            }

            Command::RestoreNumbering { class, state } => set_state(document, self, *class, *state),
        };

        Ok(applied)
    }
}

fn inserted(
    tree: &scriptory_document::BlockTree,
    block: BlockId,
    parent: BlockId,
    requested: usize,
) -> Applied {
    let index = tree
        .position(block)
        .map(|(_, index)| index)
        .unwrap_or(requested);
    Applied {
        replay: Command::RestoreBlock {
            block,
            parent,
            index,
        },
        inverse: vec![Command::DeleteBlock { block }],
        touched: vec![block],
    }
}

fn set_state(document: &mut Document, command: &Command, class: NumberingClass, state: LockState) -> Applied {
    let previous = document.numbering.set(class, state);
    Applied {
        replay: command.clone(),
        inverse: vec![Command::RestoreNumbering {
            class,
            state: previous,
        }],
        touched: Vec::new(),
    }
}

/// Insert text at `offset`, inheriting the format there
pub fn type_text(document: &Document, block: BlockId, offset: usize, text: &str) -> Command {
    let format = document
        .tree
        .get(block)
        .map(|b| scriptory_document::format_at(&b.runs, offset))
        .unwrap_or_default();
    Command::EditText {
        block,
        range: offset..offset,
        runs: vec![Run::new(text, format)],
    }
}
