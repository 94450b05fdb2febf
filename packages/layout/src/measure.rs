//! # Measurement
//!
//! Turns block text into wrapped lines. Line breaking is greedy word wrap:
//! whitespace hangs at the end of the line it follows, `\n` forces a break,
//! and a word wider than the line is broken between characters.
//!
//! Line ranges are `char` ranges into the block text and always cover it
//! contiguously, so fragments built from them never lose or duplicate text.

use scriptory_templates::FontSpec;
use std::ops::Range;

/// Slack for accumulated floating point error when summing advances
const WIDTH_EPSILON: f32 = 0.01;

/// Horizontal advance of glyphs in a font
pub trait TextMeasurer: Send + Sync {
    fn advance(&self, ch: char, font: &FontSpec) -> f32;

    fn width(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().map(|ch| self.advance(ch, font)).sum()
    }
}

/// Fixed-pitch measurer; every glyph advances `em_fraction` of the font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    pub em_fraction: f32,
}

impl MonospaceMeasurer {
    /// Courier and its descendants: 10 characters per inch at 12pt
    pub fn courier() -> Self {
        Self { em_fraction: 0.6 }
    }
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self::courier()
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn advance(&self, ch: char, font: &FontSpec) -> f32 {
        if ch == '\n' {
            0.0
        } else {
            font.size * self.em_fraction
        }
    }
}

/// Wrap `text` into lines no wider than `max_width`.
///
/// Empty text yields a single empty line.
pub fn wrap_lines(
    text: &str,
    max_width: f32,
    font: &FontSpec,
    measurer: &dyn TextMeasurer,
) -> Vec<Range<usize>> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut lines = Vec::new();

    let mut start = 0;
    let mut width = 0.0f32;
    // Where the next line would start if we broke at the last space run
    let mut last_break: Option<usize> = None;
    let mut i = 0;

    while i < n {
        let ch = chars[i];
        if ch == '\n' {
            lines.push(start..i + 1);
            i += 1;
            start = i;
            width = 0.0;
            last_break = None;
            continue;
        }

        let advance = measurer.advance(ch, font);
        if ch.is_whitespace() {
            width += advance;
            i += 1;
            last_break = Some(i);
            continue;
        }

        if width + advance > max_width + WIDTH_EPSILON && i > start {
            let at = last_break.filter(|b| *b > start).unwrap_or(i);
            lines.push(start..at);
            start = at;
            width = chars[start..i].iter().map(|c| measurer.advance(*c, font)).sum();
            last_break = None;
            continue;
        }

        width += advance;
        i += 1;
    }

    if start < n || lines.is_empty() || chars[n - 1] == '\n' {
        lines.push(start..n);
    }
    lines
}

/// Indices of lines that begin a new sentence (the previous line ends one).
pub fn sentence_starts(text: &str, lines: &[Range<usize>]) -> Vec<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut starts = Vec::new();

    for (index, line) in lines.iter().enumerate().skip(1) {
        let previous = &lines[index - 1];
        let tail = chars[previous.start..line.start]
            .iter()
            .rev()
            .find(|c| !c.is_whitespace() && !matches!(c, '"' | '\'' | ')' | '\u{201d}'));
        if matches!(tail, Some('.') | Some('!') | Some('?') | Some('\u{2026}')) {
            starts.push(index);
        }
    }
    starts
}
