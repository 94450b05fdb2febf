pub mod check;
pub mod init;
pub mod paginate;
pub mod renumber;

pub use check::{check, CheckArgs};
pub use init::{init, InitArgs};
pub use paginate::{paginate, PaginateArgs};
pub use renumber::{renumber, RenumberArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use scriptory_document::{BlockSource, Document, DocumentId, DocumentStore, FileStore};
use tracing::debug;

/// Load a document from the project's document directory
pub(crate) fn load(config: &Config, cwd: &str, id: &str) -> Result<(FileStore, Document)> {
    let store = config.store(cwd);
    let document = store
        .load(&DocumentId::new(id))
        .with_context(|| format!("Cannot open document '{}'", id))?;
    debug!(document = id, blocks = document.tree.document_order().len(), "Loaded document");
    Ok((store, document))
}

/// One-line description of an editor event
pub(crate) fn describe(event: &scriptory_editor::EditorEvent) -> String {
    use scriptory_editor::EditorEvent::*;

    match event {
        RenumberPerformed { class, reason, blocks } => {
            format!("Renumbered {} {} block(s) ({:?})", blocks.len(), class, reason)
        }
        OverflowWarning { block, page } => {
            format!("Block {} is taller than a page (page {})", block, page)
        }
        MarkerInserted {
            page, speaker, ..
        } => match speaker {
            Some(speaker) => format!("Split {} across pages {}-{}", speaker, page, page + 1),
            None => format!("Split block across pages {}-{}", page, page + 1),
        },
        MarkerRemoved { block, page, .. } => format!("Block {} no longer splits after page {}", block, page),
        TemplateFallback { warning } => format!("Template: {:?}", warning),
    }
}
