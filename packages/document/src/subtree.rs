//! Owned subtrees for copying blocks between documents.
//!
//! A detached subtree carries no handles: ids belong to the arena they were
//! allocated in, so the importing tree assigns fresh ones.

use crate::block::{runs_text, Run};
use crate::grammar;
use scriptory_templates::{BlockKind, DocumentType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetachedBlock {
    pub kind: BlockKind,
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub children: Vec<DetachedBlock>,
}

impl DetachedBlock {
    pub fn leaf(kind: BlockKind, runs: Vec<Run>) -> Self {
        Self {
            kind,
            runs,
            children: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        runs_text(&self.runs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetachedSubtree {
    pub root: DetachedBlock,
}

impl DetachedSubtree {
    pub fn new(root: DetachedBlock) -> Self {
        Self { root }
    }

    /// Number of blocks, including the subtree root
    pub fn len(&self) -> usize {
        fn count(block: &DetachedBlock) -> usize {
            1 + block.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// First parent/child pair the target document type would reject
    pub fn first_violation(&self, document_type: DocumentType) -> Option<(BlockKind, BlockKind)> {
        fn check(
            block: &DetachedBlock,
            document_type: DocumentType,
        ) -> Option<(BlockKind, BlockKind)> {
            block.children.iter().find_map(|child| {
                if grammar::allows(document_type, block.kind, child.kind) {
                    check(child, document_type)
                } else {
                    Some((block.kind, child.kind))
                }
            })
        }
        check(&self.root, document_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> DetachedSubtree {
        DetachedSubtree::new(DetachedBlock {
            kind: BlockKind::Panel,
            runs: vec![Run::plain("Rooftop")],
            children: vec![
                DetachedBlock::leaf(BlockKind::Caption, vec![Run::plain("Later.")]),
                DetachedBlock::leaf(BlockKind::Dialogue, vec![Run::plain("Jump!")]),
            ],
        })
    }

    #[test]
    fn test_len_counts_nested_blocks() {
        assert_eq!(panel().len(), 3);
    }

    #[test]
    fn test_first_violation() {
        assert_eq!(panel().first_violation(DocumentType::ComicBook), None);

        let mut bad = panel();
        bad.root.children.push(DetachedBlock::leaf(BlockKind::SceneHeading, vec![]));
        assert_eq!(
            bad.first_violation(DocumentType::ComicBook),
            Some((BlockKind::Panel, BlockKind::SceneHeading))
        );
    }
}
