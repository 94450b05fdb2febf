//! # Blocks and text runs
//!
//! A block's text is an ordered sequence of runs, each a string with one
//! format span. Runs are kept normalized: no empty runs and no two adjacent
//! runs with the same format. Offsets are `char` offsets into the
//! concatenated text.

use crate::id::BlockId;
use scriptory_templates::BlockKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Comment thread anchored to a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u32);

/// Revision (colored-page draft) a run was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(pub u32);

/// Inline formatting span
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<RevisionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub format: Format,
}

impl Run {
    pub fn new(text: impl Into<String>, format: Format) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Format::default())
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Concatenated text of a run sequence
pub fn runs_text(runs: &[Run]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

pub fn runs_char_len(runs: &[Run]) -> usize {
    runs.iter().map(Run::char_len).sum()
}

/// Drop empty runs and merge neighbours with equal formats.
pub fn normalize_runs(runs: &mut Vec<Run>) {
    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        if run.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.format == run.format => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    *runs = merged;
}

/// Ensure a run boundary at `offset`; returns the index of the first run at or after it.
fn split_at(runs: &mut Vec<Run>, offset: usize) -> usize {
    let mut start = 0;
    for index in 0..runs.len() {
        let len = runs[index].char_len();
        if offset == start {
            return index;
        }
        if offset < start + len {
            let byte = runs[index]
                .text
                .char_indices()
                .nth(offset - start)
                .map(|(byte, _)| byte)
                .unwrap_or(runs[index].text.len());
            let tail = runs[index].text.split_off(byte);
            let format = runs[index].format.clone();
            runs.insert(index + 1, Run::new(tail, format));
            return index + 1;
        }
        start += len;
    }
    runs.len()
}

/// Replace the chars in `range` with `replacement`, returning the removed runs.
///
/// Cost is linear in the number of runs of this block; nothing else moves.
/// The caller checks that `range` lies within the text.
pub fn splice_runs(runs: &mut Vec<Run>, range: Range<usize>, replacement: Vec<Run>) -> Vec<Run> {
    let start = split_at(runs, range.start);
    let end = split_at(runs, range.end);

    let mut removed: Vec<Run> = runs.splice(start..end, replacement).collect();
    normalize_runs(runs);
    normalize_runs(&mut removed);
    removed
}

/// Format in effect at `offset` (the char before it, or the first run)
pub fn format_at(runs: &[Run], offset: usize) -> Format {
    let mut start = 0;
    for run in runs {
        let len = run.char_len();
        if offset > start && offset <= start + len {
            return run.format.clone();
        }
        start += len;
    }
    runs.first().map(|run| run.format.clone()).unwrap_or_default()
}

/// Sequential number assigned to a block, with an optional letter suffix
/// for insertions inside a locked range ("12A").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NumberLabel {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl NumberLabel {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            suffix: None,
        }
    }

    pub fn suffixed(number: u32, suffix: impl Into<String>) -> Self {
        Self {
            number,
            suffix: Some(suffix.into()),
        }
    }
}

impl fmt::Display for NumberLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{}{}", self.number, suffix),
            None => write!(f, "{}", self.number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Numbering {
    pub label: NumberLabel,
    /// Locked numbers survive renumbering passes
    #[serde(default)]
    pub locked: bool,
}

impl Numbering {
    pub fn free(number: u32) -> Self {
        Self {
            label: NumberLabel::new(number),
            locked: false,
        }
    }

    pub fn locked(label: NumberLabel) -> Self {
        Self {
            label,
            locked: true,
        }
    }
}

/// A typed unit of document content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub parent: Option<BlockId>,
    #[serde(default)]
    pub children: Vec<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<Numbering>,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind, mut runs: Vec<Run>) -> Self {
        normalize_runs(&mut runs);
        Self {
            id,
            kind,
            runs,
            parent: None,
            children: Vec::new(),
            numbering: None,
        }
    }

    pub fn text(&self) -> String {
        runs_text(&self.runs)
    }

    pub fn char_len(&self) -> usize {
        runs_char_len(&self.runs)
    }

    /// Text of a char range (clamped to the block)
    pub fn text_range(&self, range: Range<usize>) -> String {
        self.text()
            .chars()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect()
    }
}
