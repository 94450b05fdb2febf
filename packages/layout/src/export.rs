//! Read-only export walks.
//!
//! Exporters consume blocks with their resolved style and numbering label,
//! or a paginated plain-text rendering. Neither touches the tree.

use crate::layout::PageLayout;
use crate::measure::{wrap_lines, MonospaceMeasurer};
use scriptory_document::{BlockId, BlockSource};
use scriptory_templates::{BlockKind, BlockStyle, Template};
use std::fmt::Write;

/// A block as an exporter sees it
#[derive(Debug, Clone, PartialEq)]
pub struct StyledBlock {
    pub block: BlockId,
    pub kind: BlockKind,
    /// Nesting depth below the root (top-level blocks are 0)
    pub depth: usize,
    /// Text with the style's case folding applied
    pub text: String,
    /// Rendered numbering label ("12A", "PANEL 3")
    pub label: Option<String>,
    pub style: BlockStyle,
}

/// Every block in document order with its effective style
pub fn styled_blocks<S: BlockSource>(source: &S, template: &Template) -> Vec<StyledBlock> {
    let mut out = Vec::new();
    let mut stack: Vec<(BlockId, usize)> = source
        .children(source.root())
        .iter()
        .rev()
        .map(|id| (*id, 0))
        .collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(block) = source.get(id) else {
            continue;
        };
        stack.extend(block.children.iter().rev().map(|child| (*child, depth + 1)));

        let style = template.style(block.kind);
        out.push(StyledBlock {
            block: id,
            kind: block.kind,
            depth,
            text: apply_case(&block.text(), style),
            label: label(block.numbering.as_ref().map(|n| n.label.to_string()), style),
            style: style.clone(),
        });
    }
    out
}

fn apply_case(text: &str, style: &BlockStyle) -> String {
    if style.uppercase {
        text.to_uppercase()
    } else {
        text.to_string()
    }
}

fn label(number: Option<String>, style: &BlockStyle) -> Option<String> {
    let number = number?;
    Some(match &style.numbering {
        Some(pattern) => pattern.render(&number),
        None => number,
    })
}

/// Plain-text rendering of a layout, one page after another.
///
/// Indentation is approximated in columns of the fixed-pitch measurer.
pub fn render_text<S: BlockSource>(layout: &PageLayout, source: &S, template: &Template) -> String {
    let measurer = MonospaceMeasurer::courier();
    let mut out = String::new();

    for page in &layout.pages {
        if page.number > 1 {
            out.push('\u{c}');
        }
        let _ = writeln!(out, "{:>60}", format!("{}.", page.number));

        for (index, fragment) in page.fragments.iter().enumerate() {
            let Some(block) = source.get(fragment.block) else {
                continue;
            };
            let style = template.style(block.kind);
            let column = style.font.size * measurer.em_fraction;
            let indent = " ".repeat((style.indent_left / column).round() as usize);
            let speaker_indent = " ".repeat(
                (template.style(BlockKind::Character).indent_left / column).round() as usize,
            );

            if index > 0 {
                for _ in 0..style.space_before.round() as usize {
                    out.push('\n');
                }
            }
            if let Some(lead_in) = &fragment.lead_in {
                let _ = writeln!(out, "{}{}", speaker_indent, lead_in);
            }

            let text: String = block
                .text()
                .chars()
                .skip(fragment.range.start)
                .take(fragment.range.len())
                .collect();
            let text = apply_case(&text, style);
            let number = if fragment.range.start == 0 {
                label(block.numbering.as_ref().map(|n| n.label.to_string()), style)
            } else {
                None
            };

            let chars: Vec<char> = text.chars().collect();
            let lines = wrap_lines(&text, style.text_width(&template.page), &style.font, &measurer);
            for (line_index, line) in lines.iter().enumerate() {
                let content: String = chars[line.clone()].iter().collect();
                let content = content.trim_end();
                match (&number, line_index) {
                    (Some(number), 0) => {
                        let _ = writeln!(out, "{}{}  {}", indent, number, content);
                    }
                    _ => {
                        let _ = writeln!(out, "{}{}", indent, content);
                    }
                }
            }

            if let Some(trail) = &fragment.trail {
                let _ = writeln!(out, "{}{}", speaker_indent, trail);
            }
        }
    }
    out
}
