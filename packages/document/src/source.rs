//! Read-only access shared by the live tree and its snapshots.

use crate::block::Block;
use crate::id::BlockId;
use scriptory_templates::DocumentType;
use std::sync::Arc;

/// Arena slot. Slots are never reused: deleted blocks are tombstoned (their
/// content is kept so undo can resurrect them) and later purged to `Vacant`.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Live(Arc<Block>),
    Tombstoned(Arc<Block>),
    Vacant,
}

/// Read access to a block arena.
///
/// Implemented by [`crate::BlockTree`] and [`crate::TreeSnapshot`]; walking
/// code (pagination, exporters, numbering) is written once against this trait.
pub trait BlockSource {
    fn slot(&self, id: BlockId) -> Option<&Slot>;

    fn root(&self) -> BlockId;

    fn document_type(&self) -> DocumentType;

    fn slot_count(&self) -> usize;

    /// Live block by handle
    fn get(&self, id: BlockId) -> Option<&Block> {
        match self.slot(id) {
            Some(Slot::Live(block)) => Some(block),
            _ => None,
        }
    }

    /// Live or tombstoned block
    fn get_any(&self, id: BlockId) -> Option<&Block> {
        match self.slot(id) {
            Some(Slot::Live(block)) | Some(Slot::Tombstoned(block)) => Some(block),
            _ => None,
        }
    }

    fn is_live(&self, id: BlockId) -> bool {
        self.get(id).is_some()
    }

    fn is_tombstoned(&self, id: BlockId) -> bool {
        matches!(self.slot(id), Some(Slot::Tombstoned(_)))
    }

    fn children(&self, id: BlockId) -> &[BlockId] {
        self.get(id).map(|block| block.children.as_slice()).unwrap_or(&[])
    }

    /// Live blocks in document (pre-)order, excluding the root
    fn document_order(&self) -> Vec<BlockId> {
        self.descendants(self.root())
    }

    /// Pre-order descendants of `id`, excluding `id` itself
    fn descendants(&self, id: BlockId) -> Vec<BlockId> {
        let mut order = Vec::new();
        let mut stack: Vec<BlockId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            order.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        order
    }

    /// Whether `ancestor` lies on the parent chain of `id`
    fn is_ancestor(&self, ancestor: BlockId, id: BlockId) -> bool {
        let mut current = self.get(id).and_then(|block| block.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).and_then(|block| block.parent);
        }
        false
    }

    /// Parent handle and index among its siblings
    fn position(&self, id: BlockId) -> Option<(BlockId, usize)> {
        let parent = self.get(id)?.parent?;
        let index = self.children(parent).iter().position(|child| *child == id)?;
        Some((parent, index))
    }

    fn text(&self, id: BlockId) -> Option<String> {
        self.get(id).map(Block::text)
    }

    /// Live blocks (root first, then document order), cloned for comparison
    fn live_blocks(&self) -> Vec<Block> {
        std::iter::once(self.root())
            .chain(self.document_order())
            .filter_map(|id| self.get(id).cloned())
            .collect()
    }

    fn live_count(&self) -> usize {
        self.document_order().len() + 1
    }
}

/// Immutable view of a tree at one point in time.
///
/// Sharing is structural: taking a snapshot clones one `Arc`, and the live
/// tree copies slot pointers (not blocks) on its next mutation.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    pub(crate) document_type: DocumentType,
    pub(crate) root: BlockId,
    pub(crate) slots: Arc<Vec<Slot>>,
}

impl BlockSource for TreeSnapshot {
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
