//! # Document storage
//!
//! Documents are stored as versioned JSON. Older schema versions are upgraded
//! in memory on load; saving always writes the current version.
//!
//! Version history:
//! - 1: `template` is a bare id string, blocks carry a plain `text` string and
//!   an optional bare `scene_number`.
//! - 2: `template` is `{id, overrides}`, blocks carry formatted `runs` and a
//!   `numbering` record; numbering lock state and revisions are stored.

use crate::block::Block;
use crate::document::Document;
use crate::errors::StorageError;
use crate::id::{BlockId, DocumentId};
use crate::numbering::NumberingState;
use crate::continuity::ContinuityLedger;
use crate::revisions::RevisionMarks;
use crate::source::BlockSource;
use crate::tree::{slot_limit, BlockTree};
use scriptory_templates::{DocumentType, TemplateId, TemplateOverrides};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SCHEMA_VERSION: u32 = 2;

/// Load and save whole documents
pub trait DocumentStore {
    fn load(&self, id: &DocumentId) -> Result<Document, StorageError>;

    fn save(&mut self, document: &Document) -> Result<(), StorageError>;

    fn exists(&self, id: &DocumentId) -> bool;

    fn list(&self) -> Result<Vec<DocumentId>, StorageError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTemplate {
    id: TemplateId,
    #[serde(default, skip_serializing_if = "TemplateOverrides::is_empty")]
    overrides: TemplateOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    schema_version: u32,
    id: DocumentId,
    document_type: DocumentType,
    template: StoredTemplate,
    #[serde(default)]
    numbering: NumberingState,
    #[serde(default)]
    revisions: RevisionMarks,
    root: BlockId,
    /// Arena size, so handles of purged blocks are not handed out again
    #[serde(default)]
    slot_count: usize,
    blocks: Vec<Block>,
}

/// Serialize a document at the current schema version.
pub fn to_json(document: &Document) -> Result<String, StorageError> {
    let stored = StoredDocument {
        schema_version: SCHEMA_VERSION,
        id: document.id.clone(),
        document_type: document.document_type(),
        template: StoredTemplate {
            id: document.template_ref.clone(),
            overrides: document.overrides.clone(),
        },
        numbering: document.numbering.clone(),
        revisions: document.revisions.clone(),
        root: document.root(),
        slot_count: document.tree.slot_count(),
        blocks: document.tree.to_blocks(),
    };
    Ok(serde_json::to_string_pretty(&stored)?)
}

/// Parse a stored document of any supported schema version.
pub fn from_json(source: &str) -> Result<Document, StorageError> {
    let mut value: Value = serde_json::from_str(source)?;
    let version = value
        .get("schema_version")
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .unwrap_or(1);

    if version > SCHEMA_VERSION {
        return Err(StorageError::UnsupportedSchema {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }
    if version == 1 {
        debug!("Upgrading schema 1 document");
        upgrade_v1(&mut value)?;
    }

    let stored: StoredDocument = serde_json::from_value(value)?;
    let limit = slot_limit(stored.blocks.len());
    if stored.slot_count > limit {
        return Err(StorageError::Malformed(format!(
            "slot_count {} exceeds {} for {} blocks",
            stored.slot_count,
            limit,
            stored.blocks.len()
        )));
    }
    let mut tree = BlockTree::from_blocks(stored.document_type, stored.root, stored.blocks)?;
    tree.reserve_slots(stored.slot_count);
    Ok(Document {
        id: stored.id,
        template_ref: stored.template.id,
        overrides: stored.template.overrides,
        numbering: stored.numbering,
        revisions: stored.revisions,
        continuity: ContinuityLedger::new(),
        tree,
    })
}

fn upgrade_v1(value: &mut Value) -> Result<(), StorageError> {
    let object = value
        .as_object_mut()
        .ok_or_else(|| StorageError::Malformed("document is not an object".to_string()))?;

    object.insert("schema_version".to_string(), json!(SCHEMA_VERSION));

    if let Some(Value::String(template)) = object.get("template").cloned() {
        object.insert("template".to_string(), json!({ "id": template }));
    }

    let blocks = object
        .get_mut("blocks")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| StorageError::Malformed("missing blocks".to_string()))?;
    for block in blocks {
        let block = block
            .as_object_mut()
            .ok_or_else(|| StorageError::Malformed("block is not an object".to_string()))?;
        upgrade_v1_block(block);
    }
    Ok(())
}

fn upgrade_v1_block(block: &mut Map<String, Value>) {
    if let Some(Value::String(text)) = block.remove("text") {
        let runs = if text.is_empty() {
            json!([])
        } else {
            json!([{ "text": text }])
        };
        block.insert("runs".to_string(), runs);
    }
    if let Some(number) = block.remove("scene_number").and_then(|n| n.as_u64()) {
        block.insert(
            "numbering".to_string(),
            json!({ "label": { "number": number }, "locked": false }),
        );
    }
}

/// In-process store holding serialized documents
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: HashMap<DocumentId, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw stored JSON (for example an older schema version)
    pub fn insert_raw(&mut self, id: DocumentId, json: String) {
        self.documents.insert(id, json);
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, id: &DocumentId) -> Result<Document, StorageError> {
        let json = self
            .documents
            .get(id)
            .ok_or_else(|| StorageError::NotFound(id.clone()))?;
        from_json(json)
    }

    fn save(&mut self, document: &Document) -> Result<(), StorageError> {
        self.documents.insert(document.id.clone(), to_json(document)?);
        Ok(())
    }

    fn exists(&self, id: &DocumentId) -> bool {
        self.documents.contains_key(id)
    }

    fn list(&self) -> Result<Vec<DocumentId>, StorageError> {
        let mut ids: Vec<DocumentId> = self.documents.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// One `<id>.json` file per document in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &DocumentId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }
}

impl DocumentStore for FileStore {
    fn load(&self, id: &DocumentId) -> Result<Document, StorageError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.clone()));
        }
        let source = std::fs::read_to_string(&path)?;
        let document = from_json(&source)?;
        debug!(path = %path.display(), "Loaded document");
        Ok(document)
    }

    fn save(&mut self, document: &Document) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&document.id);
        std::fs::write(&path, to_json(document)?)?;
        info!(path = %path.display(), "Saved document");
        Ok(())
    }

    fn exists(&self, id: &DocumentId) -> bool {
        self.path_for(id).exists()
    }

    fn list(&self) -> Result<Vec<DocumentId>, StorageError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<DocumentId> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map(|e| e == "json").unwrap_or(false))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(DocumentId::new)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}
