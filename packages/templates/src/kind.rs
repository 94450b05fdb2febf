//! Block kinds, document types and numbering classes.
//!
//! These are shared vocabulary between the template registry (which keys
//! styles by kind) and the block tree (which tags every block with a kind).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of block types a document can contain.
///
/// Serialized as a stable string key (`"scene_heading"`, `"heading:2"`) so
/// kinds can be used as JSON map keys in template files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum BlockKind {
    /// Document root; never printed.
    Root,
    SceneHeading,
    Action,
    Character,
    Parenthetical,
    Dialogue,
    Transition,
    Shot,
    Lyrics,
    Sound,
    Music,
    Cue,
    Caption,
    Panel,
    /// Heading with level 1..=6
    Heading(u8),
    PlainText,
    TitlePageField,
    /// Structural folder (act, sequence, comic page group)
    FolderMarker,
}

impl BlockKind {
    /// Heading constructor that rejects levels outside 1..=6
    pub fn heading(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(BlockKind::Heading(level))
    }

    /// Kinds that may hold child blocks.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            BlockKind::Root | BlockKind::FolderMarker | BlockKind::Heading(_) | BlockKind::Panel
        )
    }

    /// Kinds whose text is spoken and may split with continuation markers.
    pub fn is_dialogue_like(&self) -> bool {
        matches!(self, BlockKind::Dialogue | BlockKind::Lyrics)
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            BlockKind::Root => "root",
            BlockKind::SceneHeading => "scene_heading",
            BlockKind::Action => "action",
            BlockKind::Character => "character",
            BlockKind::Parenthetical => "parenthetical",
            BlockKind::Dialogue => "dialogue",
            BlockKind::Transition => "transition",
            BlockKind::Shot => "shot",
            BlockKind::Lyrics => "lyrics",
            BlockKind::Sound => "sound",
            BlockKind::Music => "music",
            BlockKind::Cue => "cue",
            BlockKind::Caption => "caption",
            BlockKind::Panel => "panel",
            BlockKind::Heading(level) => return write!(f, "heading:{}", level),
            BlockKind::PlainText => "plain_text",
            BlockKind::TitlePageField => "title_page_field",
            BlockKind::FolderMarker => "folder_marker",
        };
        f.write_str(key)
    }
}

/// Error for unrecognised block kind keys
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown block kind: {0}")]
pub struct UnknownBlockKind(pub String);

impl FromStr for BlockKind {
    type Err = UnknownBlockKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(level) = s.strip_prefix("heading:") {
            return level
                .parse::<u8>()
                .ok()
                .and_then(BlockKind::heading)
                .ok_or_else(|| UnknownBlockKind(s.to_string()));
        }

        let kind = match s {
            "root" => BlockKind::Root,
            "scene_heading" => BlockKind::SceneHeading,
            "action" => BlockKind::Action,
            "character" => BlockKind::Character,
            "parenthetical" => BlockKind::Parenthetical,
            "dialogue" => BlockKind::Dialogue,
            "transition" => BlockKind::Transition,
            "shot" => BlockKind::Shot,
            "lyrics" => BlockKind::Lyrics,
            "sound" => BlockKind::Sound,
            "music" => BlockKind::Music,
            "cue" => BlockKind::Cue,
            "caption" => BlockKind::Caption,
            "panel" => BlockKind::Panel,
            "plain_text" => BlockKind::PlainText,
            "title_page_field" => BlockKind::TitlePageField,
            "folder_marker" => BlockKind::FolderMarker,
            _ => return Err(UnknownBlockKind(s.to_string())),
        };
        Ok(kind)
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        kind.to_string()
    }
}

impl TryFrom<String> for BlockKind {
    type Error = UnknownBlockKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The kind of writing project a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Screenplay,
    Stageplay,
    Audioplay,
    ComicBook,
    Novel,
}

impl DocumentType {
    /// Every kind that may appear in a document of this type.
    pub fn kinds(&self) -> Vec<BlockKind> {
        use BlockKind::*;

        let mut kinds = vec![Root, FolderMarker, TitlePageField, PlainText];
        match self {
            DocumentType::Screenplay => kinds.extend([
                SceneHeading,
                Action,
                Character,
                Parenthetical,
                Dialogue,
                Transition,
                Shot,
                Lyrics,
            ]),
            DocumentType::Stageplay => kinds.extend([
                SceneHeading,
                Action,
                Character,
                Parenthetical,
                Dialogue,
                Transition,
                Lyrics,
                Sound,
                Music,
            ]),
            DocumentType::Audioplay => kinds.extend([
                SceneHeading,
                Action,
                Character,
                Parenthetical,
                Dialogue,
                Transition,
                Sound,
                Music,
                Cue,
            ]),
            DocumentType::ComicBook => kinds.extend([
                Heading(1),
                Panel,
                Caption,
                Character,
                Parenthetical,
                Dialogue,
                Sound,
                Action,
            ]),
            DocumentType::Novel => kinds.extend((1..=6).map(Heading)),
        }
        kinds
    }

    pub fn allows(&self, kind: BlockKind) -> bool {
        self.kinds().contains(&kind)
    }

    /// Name of the built-in template for this type
    pub fn builtin_template(&self) -> &'static str {
        match self {
            DocumentType::Screenplay => "screenplay",
            DocumentType::Stageplay => "stageplay",
            DocumentType::Audioplay => "audioplay",
            DocumentType::ComicBook => "comic",
            DocumentType::Novel => "novel",
        }
    }
}

/// A category of blocks sharing one sequential numbering scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingClass {
    Scene,
    Panel,
    Cue,
    Chapter,
}

impl fmt::Display for NumberingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberingClass::Scene => f.write_str("scene"),
            NumberingClass::Panel => f.write_str("panel"),
            NumberingClass::Cue => f.write_str("cue"),
            NumberingClass::Chapter => f.write_str("chapter"),
        }
    }
}
