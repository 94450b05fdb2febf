//! Per-document template overrides.
//!
//! Overrides never mutate the shared template; they are layered onto a copy
//! when the document resolves its effective template.

use crate::kind::BlockKind;
use crate::template::{
    BlockStyle, LineSpacing, LockedInsertion, NumberingPattern, PageGeometry, SplitPolicy, Template,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Optional replacements for individual style fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleOverride {
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub uppercase: Option<bool>,
    pub indent_left: Option<f32>,
    pub indent_right: Option<f32>,
    pub space_before: Option<f32>,
    pub line_spacing: Option<LineSpacing>,
    pub keep_with_next: Option<bool>,
    pub keep_with_previous: Option<bool>,
    pub numbering: Option<NumberingPattern>,
    pub split: Option<SplitPolicy>,
}

impl StyleOverride {
    pub fn apply_to(&self, style: &mut BlockStyle) {
        if let Some(size) = self.font_size {
            style.font.size = size;
        }
        if let Some(family) = &self.font_family {
            style.font.family = family.clone();
        }
        if let Some(bold) = self.bold {
            style.bold = bold;
        }
        if let Some(italic) = self.italic {
            style.italic = italic;
        }
        if let Some(underline) = self.underline {
            style.underline = underline;
        }
        if let Some(uppercase) = self.uppercase {
            style.uppercase = uppercase;
        }
        if let Some(indent) = self.indent_left {
            style.indent_left = indent;
        }
        if let Some(indent) = self.indent_right {
            style.indent_right = indent;
        }
        if let Some(space) = self.space_before {
            style.space_before = space;
        }
        if let Some(spacing) = self.line_spacing {
            style.line_spacing = spacing;
        }
        if let Some(keep) = self.keep_with_next {
            style.keep_with_next = keep;
        }
        if let Some(keep) = self.keep_with_previous {
            style.keep_with_previous = keep;
        }
        if let Some(numbering) = &self.numbering {
            style.numbering = Some(numbering.clone());
        }
        if let Some(split) = self.split {
            style.split = split;
        }
    }
}

/// Document-local template adjustments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateOverrides {
    pub page: Option<PageGeometry>,
    pub min_split_lines: Option<u32>,
    pub locked_insertion: Option<LockedInsertion>,
    pub styles: BTreeMap<BlockKind, StyleOverride>,
}

impl TemplateOverrides {
    pub fn is_empty(&self) -> bool {
        self.page.is_none()
            && self.min_split_lines.is_none()
            && self.locked_insertion.is_none()
            && self.styles.is_empty()
    }

    pub fn style(&mut self, kind: BlockKind) -> &mut StyleOverride {
        self.styles.entry(kind).or_default()
    }

    pub fn apply_to(&self, template: &mut Template) {
        if let Some(page) = self.page {
            template.page = page;
        }
        if let Some(lines) = self.min_split_lines {
            template.min_split_lines = lines;
        }
        if let Some(insertion) = self.locked_insertion {
            template.locked_insertion = insertion;
        }
        for (kind, style_override) in &self.styles {
            // Overriding a missing kind starts from the template default
            let mut style = template.style(*kind).clone();
            style_override.apply_to(&mut style);
            template.styles.insert(*kind, style);
        }
    }
}
