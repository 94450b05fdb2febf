//! Integration tests for the editor: numbering, pagination and events

use scriptory_document::{BlockId, BlockSource, Document, DocumentId, Run};
use scriptory_editor::{Command, Editor, EditorEvent, RenumberReason};
use scriptory_layout::{paginate, FragmentReason};
use scriptory_templates::{
    builtin, BlockKind, DocumentType, NumberingClass, SplitPolicy, TemplateId, TemplateRegistry,
};
use std::sync::Arc;

fn editor() -> Editor {
    Editor::new(
        Document::new(DocumentId::new("feature"), DocumentType::Screenplay),
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

/// Action text that wraps to exactly `lines` lines (60 columns each)
fn action_lines(lines: usize) -> String {
    vec!["x".repeat(59); lines].join(" ")
}

fn label(editor: &Editor, block: BlockId) -> Option<String> {
    editor
        .tree()
        .get(block)
        .and_then(|b| b.numbering.as_ref())
        .map(|n| n.label.to_string())
}

fn renumber_events(events: &[EditorEvent]) -> Vec<&EditorEvent> {
    events
        .iter()
        .filter(|e| matches!(e, EditorEvent::RenumberPerformed { .. }))
        .collect()
}

#[test]
fn test_heading_inserted_at_page_bottom_moves_to_next_page() {
    let mut editor = editor();
    let filler = append(&mut editor, BlockKind::Action, &action_lines(50));
    append(&mut editor, BlockKind::Action, &action_lines(4));

    // The heading would still fit on page one, but nothing after it would
    let root = editor.document().root();
    let heading = editor
        .apply(Command::InsertBlock {
            parent: root,
            index: 1,
            kind: BlockKind::SceneHeading,
            runs: vec![Run::plain("EXT. ROOF - NIGHT")],
        })
        .unwrap()
        .touched[0];

    let layout = editor.layout().unwrap();
    assert_eq!(layout.page_of(filler), Some(1));
    assert_eq!(layout.page_of(heading), Some(2));
    assert_eq!(layout.pages[0].fragments.len(), 1);
}

#[test]
fn test_locked_numbering_leaves_new_scenes_unnumbered() {
    let mut editor = editor();
    let scenes: Vec<BlockId> = (1..=3)
        .map(|i| append(&mut editor, BlockKind::SceneHeading, &format!("INT. ROOM {} - DAY", i)))
        .collect();

    let result = editor
        .apply(Command::LockNumbering {
            class: NumberingClass::Scene,
        })
        .unwrap();
    assert!(renumber_events(&result.events).is_empty());

    let mut added = Vec::new();
    for i in 4..=6 {
        let root = editor.document().root();
        let index = editor.tree().children(root).len();
        let result = editor
            .apply(Command::InsertBlock {
                parent: root,
                index,
                kind: BlockKind::SceneHeading,
                runs: vec![Run::plain(format!("EXT. FIELD {} - DAY", i))],
            })
            .unwrap();
        assert!(renumber_events(&result.events).is_empty());
        added.push(result.touched[0]);
    }

    for (i, scene) in scenes.iter().enumerate() {
        let numbering = editor.tree().get(*scene).unwrap().numbering.clone().unwrap();
        assert_eq!(numbering.label.to_string(), (i + 1).to_string());
        assert!(numbering.locked);
    }
    for scene in added {
        assert_eq!(label(&editor, scene), None);
    }
}

#[test]
fn test_long_dialogue_splits_with_one_marker_pair() {
    let mut editor = editor();
    // 46 lines, a gap and the cue leave 5 lines of page one
    append(&mut editor, BlockKind::Action, &action_lines(46));
    append(&mut editor, BlockKind::Character, "Anna");

    // Forty lines at 35 columns with no sentence breaks
    let text = vec!["x".repeat(34); 40].join(" ");
    let root = editor.document().root();
    let result = editor
        .apply(Command::InsertBlock {
            parent: root,
            index: 2,
            kind: BlockKind::Dialogue,
            runs: vec![Run::plain(text.clone())],
        })
        .unwrap();
    let dialogue = result.touched[0];

    let layout = editor.layout().unwrap();
    let pieces = layout.fragments_of(dialogue);
    assert_eq!(pieces.len(), 2);
    let (head_page, head) = pieces[0];
    let (tail_page, tail) = pieces[1];
    assert_eq!((head_page, tail_page), (1, 2));
    // One of the five lines goes to (MORE)
    assert_eq!(head.lines, 4);
    assert_eq!(head.lines + tail.lines, 40);
    assert_eq!(head.trail.as_deref(), Some("(MORE)"));
    assert!(head.lead_in.is_none());
    assert_eq!(tail.lead_in.as_deref(), Some("ANNA (CONT'D)"));
    assert!(tail.trail.is_none());
    assert_eq!(tail.reason, FragmentReason::SplitContinuation);

    // The continuation opens page two
    assert_eq!(layout.pages[1].fragments[0].block, dialogue);

    // No text lost or duplicated across the split
    let joined: String = text.chars().take(head.range.end).collect::<String>()
        + &text.chars().skip(tail.range.start).collect::<String>();
    assert_eq!(head.range.end, tail.range.start);
    assert_eq!(joined, text);

    let markers: Vec<&EditorEvent> = result
        .events
        .iter()
        .filter(|e| matches!(e, EditorEvent::MarkerInserted { .. }))
        .collect();
    assert_eq!(
        markers,
        vec![&EditorEvent::MarkerInserted {
            block: dialogue,
            page: 1,
            split_offset: tail.range.start,
            speaker: Some("ANNA".to_string()),
        }]
    );
    assert_eq!(editor.document().continuity.len(), 1);
}

/// Screenplay layout with the heading and dialogue break flags relaxed
fn relaxed_editor() -> Editor {
    let mut template = builtin::screenplay();
    template.id = TemplateId::new("relaxed");
    if let Some(style) = template.styles.get_mut(&BlockKind::SceneHeading) {
        style.keep_with_next = false;
    }
    if let Some(style) = template.styles.get_mut(&BlockKind::Dialogue) {
        style.split = SplitPolicy::Anywhere;
    }

    Editor::new(
        Document::with_template(
            DocumentId::new("relaxed"),
            DocumentType::Screenplay,
            TemplateId::new("relaxed"),
        ),
        Arc::new(TemplateRegistry::with_builtins().extended([template])),
    )
}

#[test]
fn test_break_rules_hold_under_relaxed_template() {
    let mut editor = relaxed_editor();
    assert_eq!(editor.template().id.as_str(), "relaxed");

    append(&mut editor, BlockKind::Action, &action_lines(50));
    let heading = append(&mut editor, BlockKind::SceneHeading, "EXT. ROOF - NIGHT");
    append(&mut editor, BlockKind::Action, &action_lines(4));
    let layout = editor.layout().unwrap();
    assert_eq!(layout.page_of(heading), Some(2));

    let mut editor = relaxed_editor();
    append(&mut editor, BlockKind::Action, &action_lines(46));
    append(&mut editor, BlockKind::Character, "Anna");
    let dialogue = append(&mut editor, BlockKind::Dialogue, &vec!["x".repeat(34); 40].join(" "));

    let pieces = editor.layout().unwrap().fragments_of(dialogue);
    assert_eq!(pieces.len(), 2);
    assert_eq!(pieces[0].1.trail.as_deref(), Some("(MORE)"));
    assert_eq!(pieces[1].1.lead_in.as_deref(), Some("ANNA (CONT'D)"));
}

#[test]
fn test_delete_inside_locked_range_only_renumbers_trailing_scenes() {
    let mut editor = editor();
    let scenes: Vec<BlockId> = (1..=8)
        .map(|i| append(&mut editor, BlockKind::SceneHeading, &format!("INT. ROOM {} - DAY", i)))
        .collect();

    let result = editor
        .apply(Command::LockRange {
            class: NumberingClass::Scene,
            first: scenes[0],
            last: scenes[4],
        })
        .unwrap();
    assert!(renumber_events(&result.events).is_empty());
    assert!(editor.tree().get(scenes[4]).unwrap().numbering.as_ref().unwrap().locked);
    assert!(!editor.tree().get(scenes[5]).unwrap().numbering.as_ref().unwrap().locked);

    // Inside the locked range: nobody moves
    let result = editor.apply(Command::DeleteBlock { block: scenes[2] }).unwrap();
    assert!(renumber_events(&result.events).is_empty());
    assert_eq!(label(&editor, scenes[3]).as_deref(), Some("4"));
    assert_eq!(label(&editor, scenes[5]).as_deref(), Some("6"));

    // In the trailing range: later scenes close the gap
    let result = editor.apply(Command::DeleteBlock { block: scenes[6] }).unwrap();
    assert_eq!(
        renumber_events(&result.events),
        vec![&EditorEvent::RenumberPerformed {
            class: NumberingClass::Scene,
            reason: RenumberReason::Structural,
            blocks: vec![scenes[7]],
        }]
    );
    assert_eq!(label(&editor, scenes[7]).as_deref(), Some("7"));
    assert_eq!(label(&editor, scenes[4]).as_deref(), Some("5"));
}

#[test]
fn test_unlocked_numbering_stays_contiguous() -> anyhow::Result<()> {
    let mut editor = editor();
    let root = editor.document().root();
    let mut scenes = Vec::new();
    for i in 0..6 {
        scenes.push(append(&mut editor, BlockKind::SceneHeading, &format!("INT. ROOM {}", i)));
        append(&mut editor, BlockKind::Action, "Beat.");
    }

    editor.apply(Command::MoveBlock {
        block: scenes[5],
        new_parent: root,
        index: 0,
    })?;
    editor.apply(Command::DeleteBlock { block: scenes[2] })?;
    editor.apply(Command::InsertBlock {
        parent: root,
        index: 3,
        kind: BlockKind::SceneHeading,
        runs: vec![Run::plain("EXT. GATE")],
    })?;
    editor.apply(Command::SetKind {
        block: scenes[0],
        kind: BlockKind::Action,
    })?;

    let template = editor.template().clone();
    let labels: Vec<String> = editor
        .tree()
        .document_order()
        .into_iter()
        .filter(|id| template.numbering_class(editor.tree().get(*id).unwrap().kind).is_some())
        .filter_map(|id| label(&editor, id))
        .collect();
    let expected: Vec<String> = (1..=labels.len()).map(|n| n.to_string()).collect();
    // Six scenes, one deleted, one retyped, one inserted
    assert_eq!(labels.len(), 5);
    assert_eq!(labels, expected);
    assert_eq!(label(&editor, scenes[5]).as_deref(), Some("1"));
    assert_eq!(label(&editor, scenes[0]), None);
    Ok(())
}

#[test]
fn test_duplicate_numbers_force_full_renumber() {
    let mut editor = editor();
    let a = append(&mut editor, BlockKind::SceneHeading, "INT. A");
    let b = append(&mut editor, BlockKind::SceneHeading, "INT. B");
    editor
        .apply(Command::LockNumbering {
            class: NumberingClass::Scene,
        })
        .unwrap();

    let numbering = editor.tree().get(a).unwrap().numbering.clone();
    let result = editor.apply(Command::SetNumber { block: b, numbering }).unwrap();

    assert_eq!(
        renumber_events(&result.events),
        vec![&EditorEvent::RenumberPerformed {
            class: NumberingClass::Scene,
            reason: RenumberReason::Conflict,
            blocks: vec![b],
        }]
    );
    assert_eq!(label(&editor, a).as_deref(), Some("1"));
    assert_eq!(label(&editor, b).as_deref(), Some("2"));
}

#[test]
fn test_same_edits_give_same_pages() {
    let run = || {
        let mut editor = editor();
        for i in 0..12 {
            append(&mut editor, BlockKind::SceneHeading, &format!("INT. ROOM {} - NIGHT", i));
            append(&mut editor, BlockKind::Action, &action_lines(3 + i % 5));
            append(&mut editor, BlockKind::Character, "Bob");
            append(&mut editor, BlockKind::Dialogue, &"Not tonight. ".repeat(4 + i));
        }
        let block = editor.tree().document_order()[9];
        editor.type_text(block, 0, "Later, ").unwrap();
        editor
    };

    let first = run();
    let second = run();
    let first_layout = first.layout().unwrap();
    assert_eq!(first_layout.to_json(), second.layout().unwrap().to_json());
    assert_eq!(first.tree().live_blocks(), second.tree().live_blocks());

    // Incremental layout after every edit matches one full run
    let full = paginate(first.tree(), first.template());
    assert_eq!(first_layout.to_json(), full.to_json());
}

#[test]
fn test_overflow_is_reported_once() {
    let mut editor = editor();
    let root = editor.document().root();
    let result = editor
        .apply(Command::InsertBlock {
            parent: root,
            index: 0,
            kind: BlockKind::SceneHeading,
            runs: vec![Run::plain(action_lines(60))],
        })
        .unwrap();
    let heading = result.touched[0];
    assert!(result
        .events
        .iter()
        .any(|e| matches!(e, EditorEvent::OverflowWarning { block, .. } if *block == heading)));

    let result = editor.type_text(heading, 0, "x").unwrap();
    assert!(!result
        .events
        .iter()
        .any(|e| matches!(e, EditorEvent::OverflowWarning { .. })));
}

#[test]
fn test_subscribers_receive_events() {
    let mut editor = editor();
    let mut events = editor.subscribe();
    let scenes: Vec<BlockId> = (0..3)
        .map(|i| append(&mut editor, BlockKind::SceneHeading, &format!("INT. ROOM {}", i)))
        .collect();

    let result = editor.apply(Command::DeleteBlock { block: scenes[0] }).unwrap();
    let expected = EditorEvent::RenumberPerformed {
        class: NumberingClass::Scene,
        reason: RenumberReason::Structural,
        blocks: vec![scenes[1], scenes[2]],
    };
    assert_eq!(renumber_events(&result.events), vec![&expected]);

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert_eq!(received, vec![expected]);
}
