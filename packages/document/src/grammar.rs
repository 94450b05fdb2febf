//! Structural grammar: which block kinds may contain which.

use scriptory_templates::{BlockKind, DocumentType};

/// Whether a block of kind `parent` may hold a child of kind `child`.
pub fn can_contain(parent: BlockKind, child: BlockKind) -> bool {
    use BlockKind::*;

    if child == Root {
        return false;
    }

    match parent {
        Root => true,
        FolderMarker => child != TitlePageField,
        Heading(level) => match child {
            Heading(child_level) => child_level > level,
            FolderMarker | TitlePageField => false,
            _ => true,
        },
        Panel => matches!(
            child,
            Caption | Character | Parenthetical | Dialogue | Sound | Action | PlainText | Cue
        ),
        SceneHeading | Action | Character | Parenthetical | Dialogue | Transition | Shot
        | Lyrics | Sound | Music | Cue | Caption | PlainText | TitlePageField => false,
    }
}

/// Grammar check including the document type's allowed kinds.
pub fn allows(document_type: DocumentType, parent: BlockKind, child: BlockKind) -> bool {
    document_type.allows(child) && can_contain(parent, child)
}
