//! # Undo/Redo Stack
//!
//! Tracks command history and enables undo/redo operations.
//!
//! ## Design
//!
//! - Each command records its inverse when it is applied
//! - Undo applies the inverses and moves the batch to the redo stack
//! - Redo replays the recorded commands (inserts replay as restores)
//! - New commands clear the redo stack
//! - Explicit groups and consecutive typing in one block become one step
//!
//! The stack only stores commands; the coordinator owns the document and
//! runs them.

use crate::commands::{Applied, Command};
use scriptory_document::BlockId;

/// A group of commands that should be undone/redone together
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBatch {
    /// Replay forms of the commands (in application order)
    pub commands: Vec<Command>,

    /// The inverse commands (in undo order)
    pub inverses: Vec<Command>,

    /// Optional description of this batch
    pub description: Option<String>,
}

impl CommandBatch {
    fn empty() -> Self {
        Self {
            commands: Vec::new(),
            inverses: Vec::new(),
            description: None,
        }
    }

    fn push(&mut self, applied: Applied) {
        self.commands.push(applied.replay);
        // Inverses go in reverse order
        self.inverses.splice(0..0, applied.inverse);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Caret position after the last typing step, used to extend it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Typing {
    block: BlockId,
    caret: usize,
}

impl Typing {
    /// Where the caret ends up if `command` is a keystroke, or `None`
    fn after(command: &Command) -> Option<Typing> {
        let Command::EditText { block, range, runs } = command else {
            return None;
        };
        let inserted: usize = runs.iter().map(|run| run.char_len()).sum();
        let keystroke = match (range.is_empty(), inserted) {
            // Typing (a paste of a whole line is not a keystroke)
            (true, 1..=8) => !runs.iter().any(|run| run.text.contains('\n')),
            // Backspace / delete of one char
            (false, 0) => range.len() == 1,
            _ => false,
        };
        keystroke.then_some(Typing {
            block: *block,
            caret: range.start + inserted,
        })
    }

    /// Whether `command` continues typing at this caret
    fn continues(&self, command: &Command) -> bool {
        match command {
            Command::EditText { block, range, .. } if *block == self.block => {
                if range.is_empty() {
                    range.start == self.caret
                } else {
                    range.end == self.caret || range.start == self.caret
                }
            }
            _ => false,
        }
    }
}

/// Undo/redo stack for document editing
#[derive(Debug)]
pub struct UndoStack {
    /// Stack of applied batches (most recent last)
    undo_stack: Vec<CommandBatch>,

    /// Stack of undone batches (most recent last)
    redo_stack: Vec<CommandBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Currently building an explicit group
    current_batch: Option<CommandBatch>,

    /// The top of the undo stack is a typing run that may be extended
    typing: Option<Typing>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
            typing: None,
        }
    }

    /// Record one user command together with the secondary commands its
    /// post-effects produced.
    pub fn record(&mut self, primary: Applied, secondary: Vec<Applied>) {
        let typing = Typing::after(&primary.replay);
        let extends = secondary.is_empty()
            && self.current_batch.is_none()
            && self.redo_stack.is_empty()
            && matches!((self.typing, typing), (Some(t), Some(_)) if t.continues(&primary.replay));

        if let Some(batch) = &mut self.current_batch {
            batch.push(primary);
            secondary.into_iter().for_each(|applied| batch.push(applied));
            return;
        }

        if extends {
            if let Some(top) = self.undo_stack.last_mut() {
                top.push(primary);
                self.typing = typing;
                return;
            }
        }

        let mut batch = CommandBatch::empty();
        batch.push(primary);
        secondary.into_iter().for_each(|applied| batch.push(applied));
        self.push_batch(batch);
        self.typing = if self.undo_stack.last().map(|b| b.commands.len()) == Some(1) {
            typing
        } else {
            None
        };
    }

    /// Start a group of commands (will be undone/redone together)
    pub fn begin_batch(&mut self) {
        if self.current_batch.is_none() {
            self.current_batch = Some(CommandBatch::empty());
        }
        self.typing = None;
    }

    /// End the current group and push it to the undo stack
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.is_empty() {
                self.push_batch(batch);
            }
        }
        self.typing = None;
    }

    pub fn in_batch(&self) -> bool {
        self.current_batch.is_some()
    }

    /// Set description for current group (if grouping)
    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    /// Stop extending the current typing run
    pub fn break_coalescing(&mut self) {
        self.typing = None;
    }

    /// Push a batch to the undo stack
    fn push_batch(&mut self, batch: CommandBatch) {
        self.undo_stack.push(batch);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // Clear redo stack (new action invalidates future)
        self.redo_stack.clear();
    }

    /// Take the most recent batch for undoing
    pub fn pop_undo(&mut self) -> Option<CommandBatch> {
        self.typing = None;
        self.undo_stack.pop()
    }

    /// File a batch that was just undone
    pub fn push_redo(&mut self, batch: CommandBatch) {
        self.redo_stack.push(batch);
    }

    /// Take the most recently undone batch for redoing
    pub fn pop_redo(&mut self) -> Option<CommandBatch> {
        self.typing = None;
        self.redo_stack.pop()
    }

    /// File a batch that was just redone
    pub fn push_undo(&mut self, batch: CommandBatch) {
        self.undo_stack.push(batch);
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
        self.typing = None;
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptory_document::Run;

    fn typed(block: u32, at: usize, text: &str) -> Applied {
        let len = text.chars().count();
        Applied {
            replay: Command::EditText {
                block: BlockId(block),
                range: at..at,
                runs: vec![Run::plain(text)],
            },
            inverse: vec![Command::EditText {
                block: BlockId(block),
                range: at..at + len,
                runs: Vec::new(),
            }],
            touched: vec![BlockId(block)],
        }
    }

    fn deleted(block: u32) -> Applied {
        Applied {
            replay: Command::DeleteBlock { block: BlockId(block) },
            inverse: vec![Command::RestoreBlock {
                block: BlockId(block),
                parent: BlockId(0),
                index: 0,
            }],
            touched: vec![BlockId(block)],
        }
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_typing_coalesces() {
        let mut stack = UndoStack::new();
        stack.record(typed(1, 0, "H"), Vec::new());
        stack.record(typed(1, 1, "i"), Vec::new());
        stack.record(typed(1, 2, "!"), Vec::new());

        assert_eq!(stack.undo_levels(), 1);
        let batch = stack.pop_undo().unwrap();
        assert_eq!(batch.commands.len(), 3);
        // Most recent keystroke is undone first
        assert_eq!(
            batch.inverses[0],
            Command::EditText {
                block: BlockId(1),
                range: 2..3,
                runs: Vec::new()
            }
        );
    }

    #[test]
    fn test_typing_elsewhere_starts_new_step() {
        let mut stack = UndoStack::new();
        stack.record(typed(1, 0, "a"), Vec::new());
        stack.record(typed(1, 5, "b"), Vec::new());
        stack.record(typed(2, 6, "c"), Vec::new());
        assert_eq!(stack.undo_levels(), 3);

        stack.record(deleted(3), Vec::new());
        stack.record(typed(2, 7, "d"), Vec::new());
        assert_eq!(stack.undo_levels(), 5);
    }

    #[test]
    fn test_batched_commands() {
        let mut stack = UndoStack::new();

        stack.begin_batch();
        stack.set_batch_description("Cut scene");
        stack.record(deleted(4), Vec::new());
        stack.record(deleted(5), Vec::new());
        stack.end_batch();

        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.undo_description(), Some("Cut scene"));

        let batch = stack.pop_undo().unwrap();
        assert_eq!(
            batch.inverses[0],
            Command::RestoreBlock {
                block: BlockId(5),
                parent: BlockId(0),
                index: 0
            }
        );
    }

    #[test]
    fn test_secondary_commands_share_the_step() {
        let mut stack = UndoStack::new();
        let renumber = Applied {
            replay: Command::SetNumber {
                block: BlockId(9),
                numbering: None,
            },
            inverse: vec![Command::SetNumber {
                block: BlockId(9),
                numbering: None,
            }],
            touched: Vec::new(),
        };
        stack.record(deleted(2), vec![renumber]);

        let batch = stack.pop_undo().unwrap();
        assert_eq!(batch.commands.len(), 2);
        assert!(matches!(batch.inverses[0], Command::SetNumber { .. }));
        assert!(matches!(batch.inverses[1], Command::RestoreBlock { .. }));
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut stack = UndoStack::new();
        stack.record(deleted(1), Vec::new());
        let batch = stack.pop_undo().unwrap();
        stack.push_redo(batch);
        assert_eq!(stack.redo_levels(), 1);

        stack.record(deleted(2), Vec::new());
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut stack = UndoStack::with_max_levels(2);
        for block in 0..3 {
            stack.record(deleted(block), Vec::new());
        }
        assert_eq!(stack.undo_levels(), 2);
    }
}
