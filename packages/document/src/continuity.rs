//! Ledger of the MORE / CONT'D markers attached to split blocks.
//!
//! Markers are derived from the current page layout. They are not content,
//! so they are never part of the tree or of undo history.

use crate::id::BlockId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One split point: `(MORE)` at the bottom of `page`, `SPEAKER (CONT'D)` on
/// top of the next page, the text continuing at char `split_offset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitMarker {
    pub page: u32,
    pub split_offset: usize,
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuityLedger {
    markers: BTreeMap<BlockId, Vec<SplitMarker>>,
}

impl ContinuityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self, block: BlockId) -> &[SplitMarker] {
        self.markers.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace a block's markers; returns the previous ones.
    pub fn set(&mut self, block: BlockId, markers: Vec<SplitMarker>) -> Vec<SplitMarker> {
        if markers.is_empty() {
            self.markers.remove(&block).unwrap_or_default()
        } else {
            self.markers.insert(block, markers).unwrap_or_default()
        }
    }

    pub fn remove(&mut self, block: BlockId) -> Vec<SplitMarker> {
        self.markers.remove(&block).unwrap_or_default()
    }

    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.markers.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &SplitMarker)> + '_ {
        self.markers
            .iter()
            .flat_map(|(block, markers)| markers.iter().map(move |marker| (*block, marker)))
    }

    /// Total number of split points
    pub fn len(&self) -> usize {
        self.markers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(page: u32) -> SplitMarker {
        SplitMarker {
            page,
            split_offset: 40,
            speaker: Some("ANNA".to_string()),
        }
    }

    #[test]
    fn test_set_and_remove() {
        let mut ledger = ContinuityLedger::new();
        assert!(ledger.set(BlockId(2), vec![marker(1)]).is_empty());
        assert_eq!(ledger.set(BlockId(2), vec![marker(1), marker(2)]), vec![marker(1)]);
        assert_eq!(ledger.len(), 2);

        // Setting no markers drops the entry
        ledger.set(BlockId(2), Vec::new());
        assert!(ledger.is_empty());
        assert!(ledger.markers(BlockId(2)).is_empty());
    }
}
