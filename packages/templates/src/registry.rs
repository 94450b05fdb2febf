//! # Template Registry
//!
//! Resolves templates by id. The registry is read-only once built: reloading
//! produces a fresh registry instead of mutating this one, so an
//! `Arc<TemplateRegistry>` can be shared across documents without locking.

use crate::builtin::{self, DEFAULT_TEMPLATE_ID};
use crate::errors::TemplateError;
use crate::kind::{BlockKind, DocumentType};
use crate::template::{Template, TemplateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Non-fatal problems found while resolving or validating templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateWarning {
    /// A kind of the template's document type has no style entry
    MissingStyle { template: TemplateId, kind: BlockKind },

    /// The requested template does not exist; the fallback is used instead
    UnknownTemplate {
        requested: TemplateId,
        fallback: TemplateId,
    },

    /// Margins leave no room for content
    DegenerateGeometry { template: TemplateId },
}

/// Check that a template styles every kind its document type can contain.
pub fn validate(template: &Template) -> Vec<TemplateWarning> {
    let mut warnings: Vec<TemplateWarning> = template
        .document_type
        .kinds()
        .into_iter()
        .filter(|kind| *kind != BlockKind::Root && !template.has_style(*kind))
        .map(|kind| TemplateWarning::MissingStyle {
            template: template.id.clone(),
            kind,
        })
        .collect();

    if template.page.content_height() <= 0.0 || template.page.content_width() <= 0.0 {
        warnings.push(TemplateWarning::DegenerateGeometry {
            template: template.id.clone(),
        });
    }

    warnings
}

/// Named template lookup
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateId, Arc<Template>>,
    fallback: Arc<Template>,
}

/// Template files may hold one template or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    One(Box<Template>),
    Many(Vec<Template>),
}

impl TemplateRegistry {
    /// Registry containing only the fallback template
    pub fn new() -> Self {
        let fallback = Arc::new(builtin::default_template());
        let mut templates = HashMap::new();
        templates.insert(fallback.id.clone(), fallback.clone());
        Self {
            templates,
            fallback,
        }
    }

    /// Registry with every built-in template
    pub fn with_builtins() -> Self {
        Self::new().extended(builtin::all())
    }

    /// A new registry with additional templates; later ids replace earlier ones.
    pub fn extended(&self, templates: impl IntoIterator<Item = Template>) -> Self {
        let mut next = self.clone();
        for template in templates {
            debug!(template = %template.id, "Registering template");
            if template.id.as_str() == DEFAULT_TEMPLATE_ID {
                next.fallback = Arc::new(template.clone());
            }
            next.templates.insert(template.id.clone(), Arc::new(template));
        }
        next
    }

    /// Full replace: built-ins plus the given templates, discarding this registry's contents.
    pub fn reload(&self, templates: impl IntoIterator<Item = Template>) -> Self {
        Self::with_builtins().extended(templates)
    }

    /// Parse templates from JSON (a single object or an array)
    pub fn parse_json(source: &str) -> Result<Vec<Template>, TemplateError> {
        let file: TemplateFile = serde_json::from_str(source)?;
        Ok(match file {
            TemplateFile::One(template) => vec![*template],
            TemplateFile::Many(templates) => templates,
        })
    }

    pub fn from_json_str(source: &str) -> Result<Self, TemplateError> {
        Ok(Self::with_builtins().extended(Self::parse_json(source)?))
    }

    /// Built-ins plus every `*.json` file in `dir`
    pub fn load_dir(dir: &Path) -> Result<Self, TemplateError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map(|e| e == "json").unwrap_or(false))
            .collect();
        // Deterministic override order
        paths.sort();

        let mut loaded = Vec::new();
        for path in &paths {
            let source = std::fs::read_to_string(path)?;
            loaded.extend(Self::parse_json(&source)?);
        }

        info!(dir = %dir.display(), templates = loaded.len(), "Loaded templates");
        Ok(Self::with_builtins().extended(loaded))
    }

    pub fn resolve(&self, id: &TemplateId) -> Result<Arc<Template>, TemplateError> {
        self.templates
            .get(id)
            .cloned()
            .ok_or_else(|| TemplateError::UnknownTemplate(id.clone()))
    }

    /// Resolve, falling back to the built-in default for unknown ids.
    pub fn resolve_or_default(&self, id: &TemplateId) -> (Arc<Template>, Option<TemplateWarning>) {
        match self.resolve(id) {
            Ok(template) => (template, None),
            Err(_) => {
                warn!(requested = %id, fallback = %self.fallback.id, "Unknown template, using fallback");
                (
                    self.fallback.clone(),
                    Some(TemplateWarning::UnknownTemplate {
                        requested: id.clone(),
                        fallback: self.fallback.id.clone(),
                    }),
                )
            }
        }
    }

    /// Built-in template for a document type, or the fallback
    pub fn for_document_type(&self, document_type: DocumentType) -> Arc<Template> {
        self.resolve_or_default(&TemplateId::new(document_type.builtin_template()))
            .0
    }

    pub fn validate(&self, template: &Template) -> Vec<TemplateWarning> {
        validate(template)
    }

    pub fn default_template(&self) -> Arc<Template> {
        self.fallback.clone()
    }

    /// Registered ids in sorted order
    pub fn ids(&self) -> Vec<TemplateId> {
        let mut ids: Vec<TemplateId> = self.templates.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
