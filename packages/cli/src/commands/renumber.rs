use super::{describe, load};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use scriptory_document::DocumentStore;
use scriptory_editor::{Editor, EditorConfig};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RenumberArgs {
    /// Document id
    pub document: String,

    /// Report what would change without saving
    #[arg(long)]
    pub dry_run: bool,
}

pub fn renumber(args: RenumberArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = Arc::new(config.registry(cwd)?);
    let (mut store, document) = load(&config, cwd, &args.document)?;

    let mut editor = Editor::with_config(
        document,
        registry,
        EditorConfig {
            auto_layout: false,
            ..EditorConfig::default()
        },
    );
    let result = editor.renumber()?;

    if result.touched.is_empty() {
        println!("{} {} is already numbered correctly", "✓".green(), args.document);
        return Ok(());
    }

    for event in &result.events {
        println!("  {} {}", "•".bright_blue(), describe(event));
    }
    println!(
        "  {} {} block(s) updated",
        "✓".green(),
        result.touched.len()
    );

    if args.dry_run {
        println!("{}", "Dry run, nothing saved".dimmed());
    } else {
        store.save(editor.document())?;
        println!("{} Saved {}", "✅".green(), args.document.bright_white());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptory_document::{Document, DocumentId, Numbering, Run};
    use scriptory_templates::{BlockKind, DocumentType};

    fn numbers(config: &Config, cwd: &str) -> Vec<Option<String>> {
        let document = config.store(cwd).load(&DocumentId::new("draft")).unwrap();
        document
            .tree
            .to_blocks()
            .into_iter()
            .filter(|block| block.kind == BlockKind::SceneHeading)
            .map(|block| block.numbering.map(|n| n.label.to_string()))
            .collect()
    }

    #[test]
    fn test_renumber_saves_unless_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();
        let config = Config::default();

        let mut document = Document::new(DocumentId::new("draft"), DocumentType::Screenplay);
        let root = document.root();
        for (text, number) in [("INT. ONE", 4), ("INT. TWO", 9)] {
            let id = document
                .tree
                .insert_block(root, usize::MAX, BlockKind::SceneHeading, vec![Run::plain(text)])
                .unwrap();
            document.tree.set_numbering(id, Some(Numbering::free(number))).unwrap();
        }
        config.store(cwd).save(&document).unwrap();

        renumber(
            RenumberArgs {
                document: "draft".to_string(),
                dry_run: true,
            },
            cwd,
        )
        .unwrap();
        assert_eq!(
            numbers(&config, cwd),
            vec![Some("4".to_string()), Some("9".to_string())]
        );

        renumber(
            RenumberArgs {
                document: "draft".to_string(),
                dry_run: false,
            },
            cwd,
        )
        .unwrap();
        assert_eq!(
            numbers(&config, cwd),
            vec![Some("1".to_string()), Some("2".to_string())]
        );
    }
}
