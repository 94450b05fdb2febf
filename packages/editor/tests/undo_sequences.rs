//! Undo/redo over longer edit sequences
//!
//! This tests:
//! - Undo returns the tree to exactly the state before each step
//! - Redo brings back the same block handles
//! - Explicit groups and typing runs undo as one step
//! - Lock state changes undo together with the flags they set

use scriptory_document::{
    Block, BlockId, BlockSource, DetachedBlock, DetachedSubtree, Document, DocumentId, LockState,
    NumberingState, Run,
};
use scriptory_editor::{Command, Editor};
use scriptory_templates::{BlockKind, DocumentType, NumberingClass, TemplateRegistry};
use std::sync::Arc;

fn editor() -> Editor {
    Editor::new(
        Document::new(DocumentId::new("undo"), DocumentType::Screenplay),
        Arc::new(TemplateRegistry::with_builtins()),
    )
}

fn append(editor: &mut Editor, kind: BlockKind, text: &str) -> BlockId {
    let root = editor.document().root();
    let index = editor.tree().children(root).len();
    editor
        .apply(Command::InsertBlock {
            parent: root,
            index,
            kind,
            runs: vec![Run::plain(text)],
        })
        .unwrap()
        .touched[0]
}

fn state(editor: &Editor) -> (Vec<Block>, NumberingState) {
    (editor.tree().live_blocks(), editor.document().numbering.clone())
}

#[test]
fn test_undo_restores_every_intermediate_state() {
    let mut editor = editor();
    let root = editor.document().root();
    let a = append(&mut editor, BlockKind::SceneHeading, "INT. KITCHEN - DAY");
    let action = append(&mut editor, BlockKind::Action, "The kettle whistles.");
    let b = append(&mut editor, BlockKind::SceneHeading, "EXT. GARDEN - DAY");
    let c = append(&mut editor, BlockKind::SceneHeading, "INT. SHED - NIGHT");

    let commands = vec![
        Command::EditText {
            block: action,
            range: 4..10,
            runs: vec![Run::plain("old copper kettle")],
        },
        Command::MoveBlock {
            block: c,
            new_parent: root,
            index: 0,
        },
        Command::LockRange {
            class: NumberingClass::Scene,
            first: c,
            last: a,
        },
        Command::SetKind {
            block: b,
            kind: BlockKind::Action,
        },
        Command::InsertSubtree {
            parent: root,
            index: 2,
            subtree: DetachedSubtree::new(DetachedBlock::leaf(
                BlockKind::SceneHeading,
                vec![Run::plain("EXT. ROAD - DUSK")],
            )),
        },
        Command::DeleteBlock { block: a },
        Command::UnlockNumbering {
            class: NumberingClass::Scene,
        },
        Command::EditText {
            block: action,
            range: 0..3,
            runs: Vec::new(),
        },
    ];

    let mut history = Vec::new();
    for command in commands {
        history.push(state(&editor));
        editor.apply(command).unwrap();
    }
    let end = state(&editor);

    while let Some(expected) = history.pop() {
        editor.undo().unwrap().unwrap();
        assert_eq!(state(&editor), expected);
    }

    // And forward again to the same end state
    while editor.can_redo() {
        editor.redo().unwrap();
    }
    assert_eq!(state(&editor), end);
}

#[test]
fn test_redo_reuses_handles() {
    let mut editor = editor();
    let scene = append(&mut editor, BlockKind::SceneHeading, "INT. HALL - DAY");
    let action = append(&mut editor, BlockKind::Action, "Footsteps.");

    editor.undo().unwrap();
    editor.undo().unwrap();
    assert!(editor.tree().document_order().is_empty());

    editor.redo().unwrap();
    editor.redo().unwrap();
    assert_eq!(editor.tree().document_order(), vec![scene, action]);

    // Later commands can keep referring to the same handles
    editor
        .apply(Command::EditText {
            block: action,
            range: 0..0,
            runs: vec![Run::plain("Heavy ")],
        })
        .unwrap();
    assert_eq!(editor.tree().text(action).unwrap(), "Heavy Footsteps.");
}

#[test]
fn test_group_undoes_as_one_step() {
    let mut editor = editor();
    let scene = append(&mut editor, BlockKind::SceneHeading, "INT. A");
    let before = state(&editor);

    editor.begin_coalescing_group();
    append(&mut editor, BlockKind::Action, "One.");
    append(&mut editor, BlockKind::SceneHeading, "INT. B");
    editor
        .apply(Command::SetKind {
            block: scene,
            kind: BlockKind::Transition,
        })
        .unwrap();
    editor.end_group();

    assert_eq!(editor.undo_levels(), 2);
    editor.undo().unwrap();
    assert_eq!(state(&editor), before);
}

#[test]
fn test_undo_closes_open_group() {
    let mut editor = editor();
    editor.begin_coalescing_group();
    append(&mut editor, BlockKind::Action, "One.");
    append(&mut editor, BlockKind::Action, "Two.");

    editor.undo().unwrap().unwrap();
    assert!(editor.tree().document_order().is_empty());
    assert!(!editor.can_undo());
}

#[test]
fn test_typing_run_undoes_together() {
    let mut editor = editor();
    let block = append(&mut editor, BlockKind::Action, "Door.");

    // Type " Open", then backspace twice
    let mut caret = 5;
    for ch in " Open".chars() {
        editor.type_text(block, caret, &ch.to_string()).unwrap();
        caret += 1;
    }
    for _ in 0..2 {
        editor
            .apply(Command::EditText {
                block,
                range: caret - 1..caret,
                runs: Vec::new(),
            })
            .unwrap();
        caret -= 1;
    }
    assert_eq!(editor.tree().text(block).unwrap(), "Door. Op");

    // Typing somewhere else is a new step
    editor.type_text(block, 0, "A").unwrap();
    assert_eq!(editor.undo_levels(), 3);

    editor.undo().unwrap();
    assert_eq!(editor.tree().text(block).unwrap(), "Door. Op");
    editor.undo().unwrap();
    assert_eq!(editor.tree().text(block).unwrap(), "Door.");

    editor.redo().unwrap();
    assert_eq!(editor.tree().text(block).unwrap(), "Door. Op");
}

#[test]
fn test_lock_and_unlock_undo_with_their_flags() {
    let mut editor = editor();
    let scenes: Vec<BlockId> = (0..3)
        .map(|i| append(&mut editor, BlockKind::SceneHeading, &format!("INT. ROOM {}", i)))
        .collect();
    let class = NumberingClass::Scene;
    let locked = |editor: &Editor| -> Vec<bool> {
        scenes
            .iter()
            .map(|s| editor.tree().get(*s).unwrap().numbering.as_ref().unwrap().locked)
            .collect()
    };

    editor.apply(Command::LockNumbering { class }).unwrap();
    assert_eq!(locked(&editor), vec![true; 3]);

    editor.apply(Command::UnlockNumbering { class }).unwrap();
    assert_eq!(editor.document().numbering.state(class), LockState::Unlocked);
    assert_eq!(locked(&editor), vec![false; 3]);

    editor.undo().unwrap();
    assert_eq!(editor.document().numbering.state(class), LockState::Locked);
    assert_eq!(locked(&editor), vec![true; 3]);

    editor.undo().unwrap();
    assert_eq!(editor.document().numbering.state(class), LockState::Unlocked);
    assert_eq!(locked(&editor), vec![false; 3]);
}

#[test]
fn test_new_edit_discards_redo() {
    let mut editor = editor();
    append(&mut editor, BlockKind::Action, "First.");
    editor.undo().unwrap();
    assert!(editor.can_redo());

    append(&mut editor, BlockKind::Action, "Second.");
    assert!(!editor.can_redo());
    assert!(editor.redo().unwrap().is_none());
}

#[test]
fn test_undo_of_renumbering_delete_restores_labels() {
    let mut editor = editor();
    let scenes: Vec<BlockId> = (0..4)
        .map(|i| append(&mut editor, BlockKind::SceneHeading, &format!("EXT. LOT {}", i)))
        .collect();
    let before = state(&editor);

    let result = editor.apply(Command::DeleteBlock { block: scenes[1] }).unwrap();
    assert!(result.touched.contains(&scenes[3]));

    let label = |editor: &Editor, id: BlockId| {
        editor.tree().get(id).unwrap().numbering.as_ref().unwrap().label.to_string()
    };
    assert_eq!(label(&editor, scenes[3]), "3");

    editor.undo().unwrap();
    assert_eq!(state(&editor), before);
    assert_eq!(label(&editor, scenes[3]), "4");
}
