//! # Scriptory Templates
//!
//! Named formatting templates for every document type: page geometry plus a
//! style per block kind. Templates are immutable values; the registry hands
//! out `Arc<Template>` and never mutates what it has loaded.
//!
//! ```rust,ignore
//! use scriptory_templates::{TemplateRegistry, TemplateId};
//!
//! let registry = TemplateRegistry::with_builtins();
//! let (template, warning) = registry.resolve_or_default(&TemplateId::new("screenplay"));
//! assert!(warning.is_none());
//! ```

pub mod builtin;
mod errors;
mod kind;
mod overrides;
mod registry;
mod template;

pub use errors::TemplateError;
pub use kind::{BlockKind, DocumentType, NumberingClass, UnknownBlockKind};
pub use overrides::{StyleOverride, TemplateOverrides};
pub use registry::{validate, TemplateRegistry, TemplateWarning};
pub use template::{
    BlockStyle, ContinuityRules, FontSpec, LineSpacing, LockedInsertion, Margins,
    NumberingPattern, PageGeometry, SplitPolicy, Template, TemplateId,
};
