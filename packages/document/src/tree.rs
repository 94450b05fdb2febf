//! # Block Tree
//!
//! The canonical, mutable representation of document content and structure.
//!
//! ## Design
//!
//! - Blocks live in an arena of `Arc`-wrapped slots addressed by [`BlockId`].
//!   Parent and child links are handles, never references, so reparenting and
//!   deletion cannot leave dangling pointers.
//! - Every structural operation validates before it mutates. A rejected
//!   operation leaves the tree exactly as it was.
//! - Deletion tombstones the subtree instead of freeing it; undo resurrects
//!   the same handles with [`BlockTree::restore_block`].
//! - Mutations record the earliest affected block so pagination can restart
//!   from there instead of from page one.

use crate::block::{format_at, runs_char_len, splice_runs, Block, Numbering, Run};
use crate::errors::TreeError;
use crate::grammar;
use crate::id::BlockId;
use crate::source::{BlockSource, Slot, TreeSnapshot};
use crate::subtree::{DetachedBlock, DetachedSubtree};
use scriptory_templates::{BlockKind, DocumentType};
use std::collections::{BTreeSet, HashSet};
use std::ops::Range;
use std::sync::Arc;

/// Purged slots a stored arena may carry per live block
const SPARE_SLOTS_PER_BLOCK: usize = 64;

/// Largest arena a document with `live` blocks may load into. Guards
/// against sizes in a corrupt file that would exhaust memory.
pub fn slot_limit(live: usize) -> usize {
    live.saturating_mul(SPARE_SLOTS_PER_BLOCK).saturating_add(4096)
}
use tracing::debug;

/// Where a removed block used to sit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub parent: BlockId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct BlockTree {
    document_type: DocumentType,
    root: BlockId,
    slots: Arc<Vec<Slot>>,
    dirty: BTreeSet<BlockId>,
}

impl BlockTree {
    /// Empty tree holding just the root block
    pub fn new(document_type: DocumentType) -> Self {
        let root = BlockId(0);
        let block = Block::new(root, BlockKind::Root, Vec::new());
        Self {
            document_type,
            root,
            slots: Arc::new(vec![Slot::Live(Arc::new(block))]),
            dirty: BTreeSet::new(),
        }
    }

    /// Rebuild a tree from stored blocks, checking every link.
    pub fn from_blocks(
        document_type: DocumentType,
        root: BlockId,
        blocks: Vec<Block>,
    ) -> Result<Self, TreeError> {
        let slot_count = blocks.iter().map(|b| b.id.index() + 1).max().unwrap_or(0);
        if slot_count > slot_limit(blocks.len()) {
            return Err(TreeError::Corrupt(format!(
                "{} blocks use handles up to {}",
                blocks.len(),
                slot_count
            )));
        }
        let mut slots = vec![Slot::Vacant; slot_count];
        for block in blocks {
            let index = block.id.index();
            if !matches!(slots[index], Slot::Vacant) {
                return Err(TreeError::Corrupt(format!("duplicate block {}", block.id)));
            }
            slots[index] = Slot::Live(Arc::new(block));
        }

        let tree = Self {
            document_type,
            root,
            slots: Arc::new(slots),
            dirty: BTreeSet::new(),
        };
        tree.check_links()?;
        Ok(tree)
    }

    /// Grow the arena to at least `count` slots so stale handles stay unused.
    pub fn reserve_slots(&mut self, count: usize) {
        if count > self.slots.len() {
            Arc::make_mut(&mut self.slots).resize(count, Slot::Vacant);
        }
    }

    fn check_links(&self) -> Result<(), TreeError> {
        let root = self
            .get(self.root)
            .ok_or_else(|| TreeError::Corrupt("missing root".to_string()))?;
        if root.kind != BlockKind::Root || root.parent.is_some() {
            return Err(TreeError::Corrupt("root block is not a root".to_string()));
        }

        let mut seen = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(TreeError::Corrupt(format!("{} reachable twice", id)));
            }
            for child in self.children(id) {
                let block = self
                    .get(*child)
                    .ok_or_else(|| TreeError::Corrupt(format!("dangling child {}", child)))?;
                if block.parent != Some(id) {
                    return Err(TreeError::Corrupt(format!("{} has wrong parent", child)));
                }
                stack.push(*child);
            }
        }

        let live = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count();
        if live != seen.len() {
            return Err(TreeError::Corrupt(format!(
                "{} blocks unreachable from the root",
                live - seen.len()
            )));
        }
        Ok(())
    }

    /// O(1) immutable view for layout and export
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            document_type: self.document_type,
            root: self.root,
            slots: self.slots.clone(),
        }
    }

    /// Live blocks ordered by handle (storage form)
    pub fn to_blocks(&self) -> Vec<Block> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Live(block) => Some(Block::clone(block)),
                _ => None,
            })
            .collect()
    }

    fn live_mut(&mut self, id: BlockId) -> Result<&mut Block, TreeError> {
        let slots = Arc::make_mut(&mut self.slots);
        match slots.get_mut(id.index()) {
            Some(Slot::Live(block)) => Ok(Arc::make_mut(block)),
            _ => Err(TreeError::NotFound(id)),
        }
    }

    fn live(&self, id: BlockId) -> Result<&Block, TreeError> {
        self.get(id).ok_or(TreeError::NotFound(id))
    }

    fn allocate(&mut self, block: Block) -> BlockId {
        let slots = Arc::make_mut(&mut self.slots);
        let id = block.id;
        debug_assert_eq!(id.index(), slots.len());
        slots.push(Slot::Live(Arc::new(block)));
        id
    }

    fn next_id(&self) -> BlockId {
        BlockId(self.slots.len() as u32)
    }

    fn check_placement(&self, parent: BlockId, kind: BlockKind) -> Result<(), TreeError> {
        let parent_block = self.live(parent)?;
        if grammar::allows(self.document_type, parent_block.kind, kind) {
            Ok(())
        } else {
            Err(TreeError::InvalidParent {
                parent,
                parent_kind: parent_block.kind,
                child_kind: kind,
            })
        }
    }

    fn attach(&mut self, id: BlockId, parent: BlockId, index: usize) -> Result<usize, TreeError> {
        let parent_block = self.live_mut(parent)?;
        let index = index.min(parent_block.children.len());
        parent_block.children.insert(index, id);
        self.live_mut(id)?.parent = Some(parent);
        Ok(index)
    }

    fn detach(&mut self, id: BlockId) -> Result<Placement, TreeError> {
        let (parent, index) = self.position(id).ok_or(TreeError::NotFound(id))?;
        self.live_mut(parent)?.children.remove(index);
        Ok(Placement { parent, index })
    }

    /// Mark the block just before a placement (or its parent) as dirty
    fn mark_gap(&mut self, placement: Placement) {
        let marker = if placement.index > 0 {
            self.children(placement.parent)
                .get(placement.index - 1)
                .copied()
                .unwrap_or(placement.parent)
        } else {
            placement.parent
        };
        self.dirty.insert(marker);
    }

    pub fn mark_dirty(&mut self, id: BlockId) {
        self.dirty.insert(id);
    }

    /// Earliest dirty live block in document order; clears the dirty set.
    pub fn take_first_dirty(&mut self) -> Option<BlockId> {
        let dirty = std::mem::take(&mut self.dirty);
        if dirty.contains(&self.root) {
            return Some(self.root);
        }
        self.document_order()
            .into_iter()
            .find(|id| dirty.contains(id))
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Insert a new block under `parent` at `index` (clamped to the child count).
    pub fn insert_block(
        &mut self,
        parent: BlockId,
        index: usize,
        kind: BlockKind,
        runs: Vec<Run>,
    ) -> Result<BlockId, TreeError> {
        self.check_placement(parent, kind)?;

        let id = self.next_id();
        self.allocate(Block::new(id, kind, runs));
        let index = self.attach(id, parent, index)?;
        self.dirty.insert(id);

        debug!(block = %id, %kind, parent = %parent, index, "Inserted block");
        Ok(id)
    }

    /// Tombstone a block and its descendants.
    ///
    /// Renumbering is left to the continuity pass.
    pub fn delete_block(&mut self, id: BlockId) -> Result<Placement, TreeError> {
        if id == self.root {
            return Err(TreeError::RootImmutable);
        }
        self.live(id)?;

        let placement = self.detach(id)?;
        let mut doomed = self.descendants(id);
        doomed.push(id);

        let slots = Arc::make_mut(&mut self.slots);
        for block_id in &doomed {
            let slot = &mut slots[block_id.index()];
            if let Slot::Live(block) = slot {
                *slot = Slot::Tombstoned(block.clone());
            }
        }

        self.mark_gap(placement);
        debug!(block = %id, removed = doomed.len(), "Deleted block");
        Ok(placement)
    }

    /// Bring a tombstoned subtree back under `parent` at `index`.
    pub fn restore_block(
        &mut self,
        id: BlockId,
        parent: BlockId,
        index: usize,
    ) -> Result<(), TreeError> {
        let kind = match self.slot(id) {
            Some(Slot::Tombstoned(block)) => block.kind,
            Some(Slot::Live(_)) => return Err(TreeError::NotDeleted(id)),
            _ => return Err(TreeError::NotFound(id)),
        };
        self.check_placement(parent, kind)?;

        // Children lists of tombstoned blocks are untouched, so the subtree
        // is recovered by walking them.
        let slots = Arc::make_mut(&mut self.slots);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let slot = &mut slots[next.index()];
            if let Slot::Tombstoned(block) = slot {
                stack.extend(block.children.iter().copied());
                *slot = Slot::Live(block.clone());
            }
        }

        self.attach(id, parent, index)?;
        self.dirty.insert(id);
        debug!(block = %id, parent = %parent, index, "Restored block");
        Ok(())
    }

    /// Reparent a block. `index` is its position after removal from the old parent.
    pub fn move_block(
        &mut self,
        id: BlockId,
        new_parent: BlockId,
        index: usize,
    ) -> Result<Placement, TreeError> {
        if id == self.root {
            return Err(TreeError::RootImmutable);
        }
        let kind = self.live(id)?.kind;
        self.live(new_parent)?;

        if new_parent == id || self.is_ancestor(id, new_parent) {
            return Err(TreeError::CycleRejected {
                block: id,
                new_parent,
            });
        }
        self.check_placement(new_parent, kind)?;

        let old = self.detach(id)?;
        self.mark_gap(old);
        self.attach(id, new_parent, index)?;
        self.dirty.insert(id);

        debug!(block = %id, from = %old.parent, to = %new_parent, index, "Moved block");
        Ok(old)
    }

    /// Replace the chars in `range` with `replacement`; returns the removed runs.
    pub fn edit_text(
        &mut self,
        id: BlockId,
        range: Range<usize>,
        replacement: Vec<Run>,
    ) -> Result<Vec<Run>, TreeError> {
        let len = runs_char_len(&self.live(id)?.runs);
        if range.start > range.end || range.end > len {
            return Err(TreeError::InvalidRange {
                block: id,
                range,
                len,
            });
        }

        let block = self.live_mut(id)?;
        let removed = splice_runs(&mut block.runs, range, replacement);
        self.dirty.insert(id);
        Ok(removed)
    }

    /// Plain-text edit that inherits the format at the edit point
    pub fn edit_plain(
        &mut self,
        id: BlockId,
        range: Range<usize>,
        text: &str,
    ) -> Result<Vec<Run>, TreeError> {
        let format = format_at(&self.live(id)?.runs, range.start);
        self.edit_text(id, range, vec![Run::new(text, format)])
    }

    /// Retype a block; returns the previous kind.
    pub fn set_kind(&mut self, id: BlockId, kind: BlockKind) -> Result<BlockKind, TreeError> {
        if id == self.root {
            return Err(TreeError::RootImmutable);
        }
        let block = self.live(id)?;
        let old = block.kind;
        let parent = block.parent.ok_or(TreeError::NotFound(id))?;
        self.check_placement(parent, kind)?;

        for child in self.children(id) {
            let child_kind = self.live(*child)?.kind;
            if !grammar::can_contain(kind, child_kind) {
                return Err(TreeError::InvalidParent {
                    parent: id,
                    parent_kind: kind,
                    child_kind,
                });
            }
        }

        let block = self.live_mut(id)?;
        block.kind = kind;
        if old != kind {
            // Numbering belongs to the old kind's class
            block.numbering = None;
        }
        self.dirty.insert(id);
        Ok(old)
    }

    /// Replace a block's numbering; returns the previous value.
    ///
    /// Numbers do not affect flow, so this does not mark the block dirty.
    pub fn set_numbering(
        &mut self,
        id: BlockId,
        numbering: Option<Numbering>,
    ) -> Result<Option<Numbering>, TreeError> {
        let block = self.live_mut(id)?;
        Ok(std::mem::replace(&mut block.numbering, numbering))
    }

    /// Owned copy of a subtree for use in another document
    pub fn export_subtree(&self, id: BlockId) -> Result<DetachedSubtree, TreeError> {
        fn detach_block(tree: &BlockTree, id: BlockId) -> Result<DetachedBlock, TreeError> {
            let block = tree.live(id)?;
            let children = block
                .children
                .iter()
                .map(|child| detach_block(tree, *child))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DetachedBlock {
                kind: block.kind,
                runs: block.runs.clone(),
                children,
            })
        }

        if id == self.root {
            return Err(TreeError::RootImmutable);
        }
        Ok(DetachedSubtree {
            root: detach_block(self, id)?,
        })
    }

    /// Insert a detached subtree with fresh handles; validated as a whole first.
    pub fn import_subtree(
        &mut self,
        parent: BlockId,
        index: usize,
        subtree: &DetachedSubtree,
    ) -> Result<BlockId, TreeError> {
        self.check_placement(parent, subtree.root.kind)?;
        if let Some((parent_kind, child_kind)) = subtree.first_violation(self.document_type) {
            return Err(TreeError::InvalidParent {
                parent,
                parent_kind,
                child_kind,
            });
        }

        fn build(tree: &mut BlockTree, block: &DetachedBlock, parent: BlockId) -> BlockId {
            let id = tree.next_id();
            let mut fresh = Block::new(id, block.kind, block.runs.clone());
            fresh.parent = Some(parent);
            tree.allocate(fresh);
            let children: Vec<BlockId> = block
                .children
                .iter()
                .map(|child| build(tree, child, id))
                .collect();
            if let Ok(built) = tree.live_mut(id) {
                built.children = children;
            }
            id
        }

        let id = build(self, &subtree.root, parent);
        self.attach(id, parent, index)?;
        self.dirty.insert(id);
        debug!(block = %id, blocks = subtree.len(), "Imported subtree");
        Ok(id)
    }

    /// Free tombstoned content once no undo history can reach it.
    pub fn purge_tombstones(&mut self) -> usize {
        let slots = Arc::make_mut(&mut self.slots);
        let mut purged = 0;
        for slot in slots.iter_mut() {
            if matches!(slot, Slot::Tombstoned(_)) {
                *slot = Slot::Vacant;
                purged += 1;
            }
        }
        purged
    }
}

impl BlockSource for BlockTree {
    fn slot(&self, id: BlockId) -> Option<&Slot> {
        self.slots.get(id.index())
    }

    fn root(&self) -> BlockId {
        self.root
    }

    fn document_type(&self) -> DocumentType {
        self.document_type
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
