//! A document: its block tree plus everything that travels with it.

use crate::continuity::ContinuityLedger;
use crate::id::{BlockId, DocumentId};
use crate::numbering::NumberingState;
use crate::revisions::RevisionMarks;
use crate::source::BlockSource;
use crate::tree::BlockTree;
use scriptory_templates::{
    DocumentType, Template, TemplateId, TemplateOverrides, TemplateRegistry, TemplateWarning,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub template_ref: TemplateId,
    pub overrides: TemplateOverrides,
    pub numbering: NumberingState,
    pub revisions: RevisionMarks,
    /// Derived from the current layout; not persisted
    pub continuity: ContinuityLedger,
    pub tree: BlockTree,
}

impl Document {
    /// Empty document of the given type using that type's built-in template
    pub fn new(id: DocumentId, document_type: DocumentType) -> Self {
        Self::with_template(id, document_type, TemplateId::new(document_type.builtin_template()))
    }

    pub fn with_template(id: DocumentId, document_type: DocumentType, template: TemplateId) -> Self {
        Self {
            id,
            template_ref: template,
            overrides: TemplateOverrides::default(),
            numbering: NumberingState::new(),
            revisions: RevisionMarks::new(),
            continuity: ContinuityLedger::new(),
            tree: BlockTree::new(document_type),
        }
    }

    pub fn document_type(&self) -> DocumentType {
        self.tree.document_type()
    }

    pub fn root(&self) -> BlockId {
        self.tree.root()
    }

    /// The template this document formats with: the referenced template (or
    /// the registry fallback) with this document's overrides applied.
    pub fn effective_template(
        &self,
        registry: &TemplateRegistry,
    ) -> (Arc<Template>, Option<TemplateWarning>) {
        let (template, warning) = registry.resolve_or_default(&self.template_ref);
        if self.overrides.is_empty() {
            (template, warning)
        } else {
            (Arc::new(template.with_overrides(&self.overrides)), warning)
        }
    }
}
