//! Flattening the tree into measured layout units.
//!
//! Every printable block becomes one unit in document order. A unit knows
//! its wrapped lines and the style decisions pagination needs, so the page
//! filler never touches the tree or the template again.

use crate::measure::{sentence_starts, wrap_lines, TextMeasurer};
use scriptory_document::{BlockId, BlockSource};
use scriptory_templates::{BlockKind, SplitPolicy, Template};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredUnit {
    pub block: BlockId,
    pub kind: BlockKind,
    pub lines: Vec<Range<usize>>,
    pub line_height: f32,
    pub space_before: f32,
    pub keep_with_next: bool,
    pub keep_with_previous: bool,
    pub split: SplitPolicy,
    /// Lines that begin a sentence (valid preferred split points)
    pub sentence_starts: Vec<usize>,
    /// Nearest preceding character cue, for dialogue-like units
    pub speaker: Option<String>,
}

impl MeasuredUnit {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn char_len(&self) -> usize {
        self.lines.last().map(|line| line.end).unwrap_or(0)
    }

    /// Char range covered by lines `from..to`
    pub fn range(&self, from: usize, to: usize) -> Range<usize> {
        let start = self.lines.get(from).map(|l| l.start).unwrap_or(0);
        let end = to
            .checked_sub(1)
            .and_then(|last| self.lines.get(last))
            .map(|l| l.end)
            .unwrap_or(start);
        start..end
    }

    /// Height of `lines` lines, plus the gap above when not at a page top
    pub fn height(&self, lines: usize, with_space: bool) -> f32 {
        let gap = if with_space { self.space_before } else { 0.0 };
        gap + lines as f32 * self.line_height
    }
}

/// Measure a single block. `None` for non-printing blocks.
pub fn measure_block<S: BlockSource>(
    source: &S,
    id: BlockId,
    template: &Template,
    measurer: &dyn TextMeasurer,
    speaker: Option<&str>,
) -> Option<MeasuredUnit> {
    let block = source.get(id)?;
    let style = template.style(block.kind);
    if !style.printable || block.kind == BlockKind::Root {
        return None;
    }

    let text = block.text();
    let lines = wrap_lines(&text, style.text_width(&template.page), &style.font, measurer);
    let sentence_starts = if block.kind.is_dialogue_like() {
        sentence_starts(&text, &lines)
    } else {
        Vec::new()
    };

    Some(MeasuredUnit {
        block: id,
        kind: block.kind,
        lines,
        line_height: style.line_height(),
        space_before: style.space_before_points(),
        // A heading never ends a page, whatever the template says
        keep_with_next: style.keep_with_next || block.kind == BlockKind::SceneHeading,
        keep_with_previous: style.keep_with_previous,
        split: split_policy(block.kind, style.split),
        sentence_starts,
        speaker: if block.kind.is_dialogue_like() {
            speaker.map(str::to_string)
        } else {
            None
        },
    })
}

/// Dialogue that may split always carries MORE / CONT'D.
fn split_policy(kind: BlockKind, policy: SplitPolicy) -> SplitPolicy {
    match policy {
        SplitPolicy::Anywhere if kind.is_dialogue_like() => SplitPolicy::WithMarkers,
        policy => policy,
    }
}

/// Speaker name as printed in a cue: trimmed, upper-cased, without any
/// extension such as "(V.O.)".
pub fn speaker_name(text: &str) -> String {
    let name = text.split('(').next().unwrap_or(text);
    name.trim().to_uppercase()
}

/// Measure every printable block, reusing `reuse` for the leading blocks
/// whose handles still line up. Returns the units and how many were reused.
pub fn measure_document<S: BlockSource>(
    source: &S,
    template: &Template,
    measurer: &dyn TextMeasurer,
    reuse: &[MeasuredUnit],
) -> (Vec<MeasuredUnit>, usize) {
    let mut units: Vec<MeasuredUnit> = Vec::new();
    let mut speaker: Option<String> = None;
    let mut reused = 0;

    for id in source.document_order() {
        let Some(block) = source.get(id) else {
            continue;
        };
        let kind = block.kind;
        let index = units.len();

        let unit = match reuse.get(index) {
            Some(previous) if reused == index && previous.block == id => {
                reused += 1;
                Some(previous.clone())
            }
            _ => measure_block(source, id, template, measurer, speaker.as_deref()),
        };

        if kind == BlockKind::Character {
            speaker = Some(speaker_name(&block.text()));
        }
        if let Some(unit) = unit {
            units.push(unit);
        }
    }

    (units, reused)
}
