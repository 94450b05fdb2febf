//! Built-in house styles, one per document type.
//!
//! Measurements follow common US industry layouts for 12pt Courier.

use crate::kind::{BlockKind, DocumentType, NumberingClass};
use crate::template::{BlockStyle, LineSpacing, Margins, PageGeometry, SplitPolicy, Template};

pub const DEFAULT_TEMPLATE_ID: &str = "default";

/// All built-in templates
pub fn all() -> Vec<Template> {
    vec![
        default_template(),
        screenplay(),
        stageplay(),
        audioplay(),
        comic(),
        novel(),
    ]
}

/// Fallback used when a document references an unknown template
pub fn default_template() -> Template {
    let mut template = screenplay();
    template.id = DEFAULT_TEMPLATE_ID.into();
    template.name = "Default".to_string();
    template
}

fn hidden_kinds(template: Template) -> Template {
    template
        .with_style(BlockKind::FolderMarker, BlockStyle::default().hidden())
        .with_style(BlockKind::TitlePageField, BlockStyle::default().hidden())
        .with_style(BlockKind::PlainText, BlockStyle::default())
}

pub fn screenplay() -> Template {
    let template = Template::new("screenplay", "Screenplay", DocumentType::Screenplay)
        .with_style(
            BlockKind::SceneHeading,
            BlockStyle::default()
                .uppercase()
                .keep_with_next()
                .numbered(NumberingClass::Scene, "{n}")
                .split(SplitPolicy::Never),
        )
        .with_style(BlockKind::Action, BlockStyle::default())
        .with_style(
            BlockKind::Character,
            BlockStyle::default()
                .indent(158.4, 0.0)
                .uppercase()
                .keep_with_next()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Parenthetical,
            BlockStyle::default()
                .indent(115.2, 144.0)
                .space_before(0.0)
                .keep_with_next()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Dialogue,
            BlockStyle::default()
                .indent(72.0, 108.0)
                .space_before(0.0)
                .split(SplitPolicy::WithMarkers),
        )
        .with_style(
            BlockKind::Lyrics,
            BlockStyle::default()
                .indent(72.0, 108.0)
                .space_before(0.0)
                .italic()
                .split(SplitPolicy::WithMarkers),
        )
        .with_style(
            BlockKind::Transition,
            BlockStyle::default()
                .indent(288.0, 0.0)
                .uppercase()
                .keep_with_previous()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Shot,
            BlockStyle::default()
                .uppercase()
                .keep_with_next()
                .split(SplitPolicy::Never),
        );
    hidden_kinds(template)
}

pub fn stageplay() -> Template {
    let template = Template::new("stageplay", "Stage Play", DocumentType::Stageplay)
        .with_style(
            BlockKind::SceneHeading,
            BlockStyle::default()
                .indent(144.0, 0.0)
                .uppercase()
                .bold()
                .space_before(2.0)
                .keep_with_next()
                .numbered(NumberingClass::Scene, "SCENE {n}")
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Action,
            BlockStyle::default().indent(216.0, 0.0).italic(),
        )
        .with_style(
            BlockKind::Character,
            BlockStyle::default()
                .indent(180.0, 0.0)
                .uppercase()
                .keep_with_next()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Parenthetical,
            BlockStyle::default()
                .indent(144.0, 72.0)
                .space_before(0.0)
                .keep_with_next()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Dialogue,
            BlockStyle::default()
                .indent(72.0, 72.0)
                .space_before(0.0)
                .split(SplitPolicy::WithMarkers),
        )
        .with_style(
            BlockKind::Lyrics,
            BlockStyle::default()
                .indent(72.0, 72.0)
                .space_before(0.0)
                .italic()
                .split(SplitPolicy::WithMarkers),
        )
        .with_style(
            BlockKind::Transition,
            BlockStyle::default()
                .indent(288.0, 0.0)
                .uppercase()
                .keep_with_previous()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Sound,
            BlockStyle::default().indent(216.0, 0.0).uppercase().split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Music,
            BlockStyle::default().indent(216.0, 0.0).uppercase().split(SplitPolicy::Never),
        );
    hidden_kinds(template)
}

pub fn audioplay() -> Template {
    let cue = || {
        BlockStyle::default()
            .uppercase()
            .numbered(NumberingClass::Cue, "{n}.")
            .split(SplitPolicy::Never)
    };

    let template = Template::new("audioplay", "Audio Drama", DocumentType::Audioplay)
        .with_style(
            BlockKind::SceneHeading,
            BlockStyle::default()
                .uppercase()
                .bold()
                .keep_with_next()
                .numbered(NumberingClass::Scene, "{n}")
                .split(SplitPolicy::Never),
        )
        .with_style(BlockKind::Action, BlockStyle::default())
        .with_style(
            BlockKind::Character,
            BlockStyle::default()
                .uppercase()
                .keep_with_next()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Parenthetical,
            BlockStyle::default()
                .indent(144.0, 72.0)
                .space_before(0.0)
                .keep_with_next()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Dialogue,
            BlockStyle::default()
                .indent(144.0, 0.0)
                .space_before(0.0)
                .split(SplitPolicy::WithMarkers),
        )
        .with_style(
            BlockKind::Transition,
            BlockStyle::default()
                .indent(288.0, 0.0)
                .uppercase()
                .keep_with_previous()
                .split(SplitPolicy::Never),
        )
        .with_style(BlockKind::Sound, cue())
        .with_style(BlockKind::Music, cue())
        .with_style(BlockKind::Cue, cue());
    hidden_kinds(template)
}

pub fn comic() -> Template {
    let template = Template::new("comic", "Comic Book Script", DocumentType::ComicBook)
        .with_style(
            BlockKind::Heading(1),
            BlockStyle::default()
                .uppercase()
                .bold()
                .space_before(2.0)
                .keep_with_next()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Panel,
            BlockStyle::default()
                .bold()
                .keep_with_next()
                .numbered(NumberingClass::Panel, "PANEL {n}")
                .split(SplitPolicy::Anywhere),
        )
        .with_style(
            BlockKind::Caption,
            BlockStyle::default().indent(72.0, 0.0).split(SplitPolicy::Anywhere),
        )
        .with_style(
            BlockKind::Character,
            BlockStyle::default()
                .indent(72.0, 0.0)
                .uppercase()
                .keep_with_next()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Parenthetical,
            BlockStyle::default()
                .indent(108.0, 72.0)
                .space_before(0.0)
                .keep_with_next()
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::Dialogue,
            BlockStyle::default()
                .indent(144.0, 36.0)
                .space_before(0.0)
                .split(SplitPolicy::WithMarkers),
        )
        .with_style(
            BlockKind::Sound,
            BlockStyle::default().indent(72.0, 0.0).uppercase().split(SplitPolicy::Never),
        )
        .with_style(BlockKind::Action, BlockStyle::default());
    hidden_kinds(template)
}

pub fn novel() -> Template {
    let serif = |size: f32| BlockStyle::default().font("Times New Roman", size);

    let mut template = Template::new("novel", "Novel Manuscript", DocumentType::Novel);
    template.page = PageGeometry {
        width: 612.0,
        height: 792.0,
        margins: Margins {
            top: 72.0,
            bottom: 72.0,
            left: 72.0,
            right: 72.0,
        },
        header_reserve: 12.0,
        footer_reserve: 0.0,
    };
    template.default_style = serif(12.0).spacing(LineSpacing::Double).space_before(0.0);

    let mut template = template
        .with_style(
            BlockKind::Heading(1),
            serif(16.0)
                .bold()
                .space_before(2.0)
                .keep_with_next()
                .numbered(NumberingClass::Chapter, "Chapter {n}")
                .split(SplitPolicy::Never),
        )
        .with_style(
            BlockKind::PlainText,
            serif(12.0).spacing(LineSpacing::Double).space_before(0.0),
        );
    for level in 2..=6u8 {
        let size = 16.0 - f32::from(level);
        template = template.with_style(
            BlockKind::Heading(level),
            serif(size)
                .bold()
                .keep_with_next()
                .split(SplitPolicy::Never),
        );
    }
    template
        .with_style(BlockKind::FolderMarker, BlockStyle::default().hidden())
        .with_style(BlockKind::TitlePageField, BlockStyle::default().hidden())
}
