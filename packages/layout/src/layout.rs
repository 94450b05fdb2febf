//! Page layout: the derived, fully recomputable result of pagination.

use crate::units::MeasuredUnit;
use scriptory_document::BlockId;
use scriptory_templates::{Template, TemplateId};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Where a page's flow begins: unit index and first line within it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowPosition {
    pub unit: usize,
    pub line: usize,
}

impl FlowPosition {
    /// The page opens with the remainder of a split block
    pub fn continued(&self) -> bool {
        self.line > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentReason {
    WholeBlock,
    SplitStart,
    SplitContinuation,
}

/// The part of one block placed on one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub block: BlockId,
    /// Char range of the block text on this page
    pub range: Range<usize>,
    pub lines: usize,
    pub reason: FragmentReason,
    pub height: f32,
    /// `SPEAKER (CONT'D)` printed above a continuation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_in: Option<String>,
    /// `(MORE)` printed below a piece that continues overleaf
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    pub start: FlowPosition,
    pub fragments: Vec<Fragment>,
    /// Highest unit index consulted while filling this page
    #[serde(skip)]
    pub(crate) horizon: usize,
}

/// A block that does not fit on a page even by itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowWarning {
    pub block: BlockId,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub template: TemplateId,
    /// CRC32 of the template the layout was computed with
    pub fingerprint: u32,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub overflows: Vec<OverflowWarning>,
    #[serde(skip)]
    pub(crate) units: Vec<MeasuredUnit>,
}

impl PageLayout {
    pub fn empty(template: &Template) -> Self {
        Self {
            template: template.id.clone(),
            fingerprint: template_fingerprint(template),
            pages: Vec::new(),
            overflows: Vec::new(),
            units: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All fragments of a block, in page order, with their page numbers
    pub fn fragments_of(&self, block: BlockId) -> Vec<(u32, &Fragment)> {
        self.pages
            .iter()
            .flat_map(|page| page.fragments.iter().map(move |f| (page.number, f)))
            .filter(|(_, f)| f.block == block)
            .collect()
    }

    /// Page on which a block starts
    pub fn page_of(&self, block: BlockId) -> Option<u32> {
        self.fragments_of(block).first().map(|(page, _)| *page)
    }

    /// Blocks that are split across at least one page boundary
    pub fn split_blocks(&self) -> Vec<BlockId> {
        let mut blocks: Vec<BlockId> = self
            .pages
            .iter()
            .flat_map(|page| page.fragments.iter())
            .filter(|f| f.reason == FragmentReason::SplitStart)
            .map(|f| f.block)
            .collect();
        blocks.dedup();
        blocks
    }

    /// Whether measured units are available for incremental recompute
    pub fn has_units(&self) -> bool {
        !self.units.is_empty() || self.pages.is_empty()
    }

    /// Serialized form used for byte-for-byte comparison
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Stable fingerprint of everything in a template that influences layout
pub fn template_fingerprint(template: &Template) -> u32 {
    let bytes = serde_json::to_vec(template).unwrap_or_default();
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes);
    hasher.finalize()
}
