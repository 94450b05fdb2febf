//! Integration tests for tree operations across a whole document lifecycle

use scriptory_document::{
    storage, BlockSource, BlockTree, Document, DocumentId, DocumentStore, FileStore, Run,
    TreeError,
};
use scriptory_templates::{BlockKind, DocumentType};

fn build_screenplay(tree: &mut BlockTree, scenes: usize) {
    let root = tree.root();
    for i in 0..scenes {
        let index = tree.children(root).len();
        tree.insert_block(
            root,
            index,
            BlockKind::SceneHeading,
            vec![Run::plain(format!("INT. ROOM {} - DAY", i + 1))],
        )
        .unwrap();
        tree.insert_block(root, index + 1, BlockKind::Action, vec![Run::plain("Something happens.")])
            .unwrap();
    }
}

#[test]
fn test_failed_operations_leave_tree_unchanged() {
    let mut tree = BlockTree::new(DocumentType::Screenplay);
    build_screenplay(&mut tree, 3);
    let before = tree.live_blocks();

    let root = tree.root();
    let first = tree.document_order()[0];

    assert!(tree.insert_block(first, 0, BlockKind::Action, vec![]).is_err());
    assert_eq!(tree.delete_block(root), Err(TreeError::RootImmutable));
    assert!(tree.move_block(root, first, 0).is_err());
    assert!(tree.edit_text(first, 0..500, vec![]).is_err());
    assert!(tree.set_kind(first, BlockKind::Panel).is_err());

    assert_eq!(tree.live_blocks(), before);
}

#[test]
fn test_delete_restore_is_identity() {
    let mut tree = BlockTree::new(DocumentType::Screenplay);
    build_screenplay(&mut tree, 4);
    let before = tree.live_blocks();

    let victim = tree.document_order()[2];
    let placement = tree.delete_block(victim).unwrap();
    assert_eq!(tree.live_count(), before.len() - 1);

    tree.restore_block(victim, placement.parent, placement.index).unwrap();
    assert_eq!(tree.live_blocks(), before);
}

#[test]
fn test_move_then_move_back_is_identity() {
    let mut tree = BlockTree::new(DocumentType::Screenplay);
    let root = tree.root();
    let act = tree.insert_block(root, 0, BlockKind::FolderMarker, vec![Run::plain("ACT I")]).unwrap();
    build_screenplay(&mut tree, 2);
    let before = tree.live_blocks();

    let scene = tree.children(root)[1];
    let old = tree.move_block(scene, act, 0).unwrap();
    assert_eq!(tree.children(act), &[scene]);
    assert_eq!(tree.document_order()[1], scene);

    tree.move_block(scene, old.parent, old.index).unwrap();
    assert_eq!(tree.live_blocks(), before);
}

#[test]
fn test_edit_then_reinsert_removed_runs_is_identity() {
    let mut tree = BlockTree::new(DocumentType::Screenplay);
    build_screenplay(&mut tree, 1);
    let action = tree.document_order()[1];
    let before = tree.live_blocks();

    let removed = tree.edit_plain(action, 0..9, "Nothing").unwrap();
    assert_eq!(tree.text(action).unwrap(), "Nothing happens.");

    tree.edit_text(action, 0..7, removed).unwrap();
    assert_eq!(tree.live_blocks(), before);
}

#[test]
fn test_snapshots_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}

    let mut tree = BlockTree::new(DocumentType::Screenplay);
    build_screenplay(&mut tree, 2);
    let snapshot = tree.snapshot();
    assert_send_sync(&snapshot);

    let handle = std::thread::spawn(move || snapshot.document_order().len());
    assert_eq!(handle.join().unwrap(), 4);
}

#[test]
fn test_file_store_round_trip_keeps_handles() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path());

    let mut doc = Document::new(DocumentId::from_key("pilot.fountain"), DocumentType::Screenplay);
    build_screenplay(&mut doc.tree, 2);
    let doomed = doc.tree.document_order()[3];
    doc.tree.delete_block(doomed).unwrap();
    doc.tree.purge_tombstones();
    store.save(&doc).unwrap();

    let mut loaded = store.load(&doc.id).unwrap();
    assert_eq!(loaded.tree.live_blocks(), doc.tree.live_blocks());

    // A purged handle is never handed out again
    let root = loaded.root();
    let fresh = loaded.tree.insert_block(root, 0, BlockKind::Action, vec![]).unwrap();
    assert_ne!(fresh, doomed);

    let json = storage::to_json(&loaded).unwrap();
    assert!(json.contains("\"schema_version\": 2"));
}
