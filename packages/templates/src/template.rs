//! # Templates
//!
//! A template is an immutable value object: page geometry plus a style for
//! every block kind. Documents reference templates by id and may layer
//! local overrides on top (see [`crate::TemplateOverrides`]).
//!
//! All lengths are in points (1/72 inch).

use crate::kind::{BlockKind, DocumentType, NumberingClass};
use crate::overrides::TemplateOverrides;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Template identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

/// Page size and printable area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margins: Margins,
    /// Space reserved below the top margin for running headers
    #[serde(default)]
    pub header_reserve: f32,
    /// Space reserved above the bottom margin for running footers
    #[serde(default)]
    pub footer_reserve: f32,
}

impl PageGeometry {
    /// US Letter with screenplay margins (1.5in binding side, 1in elsewhere)
    pub fn us_letter() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margins: Margins {
                top: 72.0,
                bottom: 72.0,
                left: 108.0,
                right: 72.0,
            },
            header_reserve: 12.0,
            footer_reserve: 0.0,
        }
    }

    /// Vertical space available for body content on one page.
    pub fn content_height(&self) -> f32 {
        self.height
            - self.margins.top
            - self.margins.bottom
            - self.header_reserve
            - self.footer_reserve
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Courier Prime".to_string(),
            size: 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSpacing {
    Single,
    OneAndHalf,
    Double,
    /// Exact line height in points
    Fixed(f32),
}

impl LineSpacing {
    pub fn line_height(&self, font_size: f32) -> f32 {
        match self {
            LineSpacing::Single => font_size,
            LineSpacing::OneAndHalf => font_size * 1.5,
            LineSpacing::Double => font_size * 2.0,
            LineSpacing::Fixed(points) => *points,
        }
    }
}

/// How a block may be divided across a page boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Always moves as a whole
    Never,
    /// May split at any line boundary
    Anywhere,
    /// Splits carry "(MORE)" and "CHARACTER (CONT'D)" markers
    WithMarkers,
}

/// Numbering pattern for eligible kinds; `{n}` is replaced by the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingPattern {
    pub class: NumberingClass,
    #[serde(default = "default_number_format")]
    pub format: String,
}

fn default_number_format() -> String {
    "{n}".to_string()
}

impl NumberingPattern {
    pub fn new(class: NumberingClass, format: impl Into<String>) -> Self {
        Self {
            class,
            format: format.into(),
        }
    }

    pub fn render(&self, label: &str) -> String {
        self.format.replace("{n}", label)
    }
}

/// Formatting rules for one block kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockStyle {
    pub font: FontSpec,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub uppercase: bool,
    /// Horizontal indentation from the left margin
    pub indent_left: f32,
    /// Horizontal indentation from the right margin
    pub indent_right: f32,
    /// Vertical gap before the block, in lines of this style
    pub space_before: f32,
    pub line_spacing: LineSpacing,
    pub keep_with_next: bool,
    pub keep_with_previous: bool,
    pub numbering: Option<NumberingPattern>,
    pub split: SplitPolicy,
    /// Non-printing kinds (folders, title page fields) are skipped by layout
    pub printable: bool,
}

impl Default for BlockStyle {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            bold: false,
            italic: false,
            underline: false,
            uppercase: false,
            indent_left: 0.0,
            indent_right: 0.0,
            space_before: 1.0,
            line_spacing: LineSpacing::Single,
            keep_with_next: false,
            keep_with_previous: false,
            numbering: None,
            split: SplitPolicy::Anywhere,
            printable: true,
        }
    }
}

impl BlockStyle {
    pub fn line_height(&self) -> f32 {
        self.line_spacing.line_height(self.font.size)
    }

    /// Gap above the block in points
    pub fn space_before_points(&self) -> f32 {
        self.space_before * self.line_height()
    }

    /// Width available to text inside the page's content area
    pub fn text_width(&self, page: &PageGeometry) -> f32 {
        (page.content_width() - self.indent_left - self.indent_right).max(0.0)
    }

    // Builder helpers used by the built-in templates

    pub fn font(mut self, family: &str, size: f32) -> Self {
        self.font = FontSpec {
            family: family.to_string(),
            size,
        };
        self
    }

    pub fn indent(mut self, left: f32, right: f32) -> Self {
        self.indent_left = left;
        self.indent_right = right;
        self
    }

    pub fn space_before(mut self, lines: f32) -> Self {
        self.space_before = lines;
        self
    }

    pub fn spacing(mut self, spacing: LineSpacing) -> Self {
        self.line_spacing = spacing;
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn keep_with_next(mut self) -> Self {
        self.keep_with_next = true;
        self
    }

    pub fn keep_with_previous(mut self) -> Self {
        self.keep_with_previous = true;
        self
    }

    pub fn numbered(mut self, class: NumberingClass, format: &str) -> Self {
        self.numbering = Some(NumberingPattern::new(class, format));
        self
    }

    pub fn split(mut self, policy: SplitPolicy) -> Self {
        self.split = policy;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.printable = false;
        self
    }
}

/// Marker text used when dialogue splits across pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContinuityRules {
    pub more_text: String,
    pub contd_suffix: String,
    /// Move a dialogue split back to the last sentence end when possible
    pub prefer_sentence_break: bool,
}

impl Default for ContinuityRules {
    fn default() -> Self {
        Self {
            more_text: "(MORE)".to_string(),
            contd_suffix: " (CONT'D)".to_string(),
            prefer_sentence_break: true,
        }
    }
}

/// What a locked numbering class does with newly inserted blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockedInsertion {
    /// New blocks stay unnumbered until the user assigns a number
    #[default]
    Unnumbered,
    /// New blocks get a letter suffix after the preceding number ("12A")
    Suffixed,
}

/// A named set of per-kind formatting rules plus page geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub document_type: DocumentType,
    pub page: PageGeometry,
    #[serde(default)]
    pub styles: BTreeMap<BlockKind, BlockStyle>,
    /// Used for kinds without an entry in `styles`
    #[serde(default)]
    pub default_style: BlockStyle,
    #[serde(default)]
    pub continuity: ContinuityRules,
    /// Minimum lines of a split block left on either page
    #[serde(default = "default_min_split_lines")]
    pub min_split_lines: u32,
    #[serde(default)]
    pub locked_insertion: LockedInsertion,
}

fn default_min_split_lines() -> u32 {
    2
}

impl Template {
    pub fn new(id: impl Into<String>, name: impl Into<String>, document_type: DocumentType) -> Self {
        Self {
            id: TemplateId::new(id),
            name: name.into(),
            document_type,
            page: PageGeometry::us_letter(),
            styles: BTreeMap::new(),
            default_style: BlockStyle::default(),
            continuity: ContinuityRules::default(),
            min_split_lines: default_min_split_lines(),
            locked_insertion: LockedInsertion::default(),
        }
    }

    pub fn with_style(mut self, kind: BlockKind, style: BlockStyle) -> Self {
        self.styles.insert(kind, style);
        self
    }

    /// Style for a kind, falling back to the template's default style
    pub fn style(&self, kind: BlockKind) -> &BlockStyle {
        self.styles.get(&kind).unwrap_or(&self.default_style)
    }

    pub fn has_style(&self, kind: BlockKind) -> bool {
        self.styles.contains_key(&kind)
    }

    pub fn numbering_class(&self, kind: BlockKind) -> Option<NumberingClass> {
        self.style(kind).numbering.as_ref().map(|pattern| pattern.class)
    }

    /// Kinds that take part in the given numbering class
    pub fn numbered_kinds(&self, class: NumberingClass) -> Vec<BlockKind> {
        self.styles
            .iter()
            .filter(|(_, style)| style.numbering.as_ref().map(|p| p.class) == Some(class))
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Numbering classes used anywhere in this template
    pub fn numbering_classes(&self) -> Vec<NumberingClass> {
        let mut classes: Vec<NumberingClass> = self
            .styles
            .values()
            .filter_map(|style| style.numbering.as_ref().map(|p| p.class))
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }

    /// Copy-on-read: a new template with document-local overrides applied.
    pub fn with_overrides(&self, overrides: &TemplateOverrides) -> Template {
        let mut resolved = self.clone();
        overrides.apply_to(&mut resolved);
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_spacing_heights() {
        assert_eq!(LineSpacing::Single.line_height(12.0), 12.0);
        assert_eq!(LineSpacing::OneAndHalf.line_height(12.0), 18.0);
        assert_eq!(LineSpacing::Double.line_height(12.0), 24.0);
        assert_eq!(LineSpacing::Fixed(14.0).line_height(12.0), 14.0);
    }

    #[test]
    fn test_content_area() {
        let page = PageGeometry::us_letter();
        assert_eq!(page.content_height(), 792.0 - 144.0 - 12.0);
        assert_eq!(page.content_width(), 432.0);

        let style = BlockStyle::default().indent(72.0, 108.0);
        assert_eq!(style.text_width(&page), 252.0);
    }

    #[test]
    fn test_style_falls_back_to_default() {
        let template = Template::new("t", "T", DocumentType::Screenplay)
            .with_style(BlockKind::Dialogue, BlockStyle::default().indent(72.0, 108.0));

        assert_eq!(template.style(BlockKind::Dialogue).indent_left, 72.0);
        assert_eq!(template.style(BlockKind::Action), &template.default_style);
    }

    #[test]
    fn test_numbering_pattern_render() {
        let pattern = NumberingPattern::new(NumberingClass::Panel, "PANEL {n}");
        assert_eq!(pattern.render("3"), "PANEL 3");
    }

    #[test]
    fn test_template_json_defaults() {
        let json = r#"{
            "id": "mini",
            "name": "Mini",
            "documentType": "screenplay",
            "page": {
                "width": 612, "height": 792,
                "margins": { "top": 72, "bottom": 72, "left": 108, "right": 72 }
            },
            "styles": {
                "dialogue": { "indentLeft": 72, "split": "with_markers" }
            }
        }"#;

        let template: Template = serde_json::from_str(json).unwrap();
        assert_eq!(template.min_split_lines, 2);
        assert_eq!(template.continuity.more_text, "(MORE)");
        assert_eq!(template.style(BlockKind::Dialogue).split, SplitPolicy::WithMarkers);
        assert_eq!(template.page.header_reserve, 0.0);
    }
}
