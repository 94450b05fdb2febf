//! Error types for the template registry

use crate::template::TemplateId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(TemplateId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid template JSON: {0}")]
    Json(#[from] serde_json::Error),
}
