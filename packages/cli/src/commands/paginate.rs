use super::{describe, load};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use scriptory_editor::{Editor, EditorConfig, EditorEvent};
use scriptory_layout::{render_text, LayoutWorker};
use scriptory_templates::TemplateId;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text pages with markers
    Text,
    /// The page layout as JSON
    Json,
}

#[derive(Args, Debug)]
pub struct PaginateArgs {
    /// Document id (file name without .json in the documents directory)
    pub document: String,

    /// Paginate with this template instead of the document's own
    #[arg(short, long)]
    pub template: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn paginate(args: PaginateArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = Arc::new(config.registry(cwd)?);
    let (_, document) = load(&config, cwd, &args.document)?;

    // Layout runs on the worker, not inline after each edit
    let mut editor = Editor::with_config(
        document,
        registry,
        EditorConfig {
            auto_layout: false,
            ..EditorConfig::default()
        },
    );

    let mut notices: Vec<EditorEvent> = Vec::new();
    match args.template {
        Some(id) => notices.extend(editor.set_template(TemplateId::new(id))?),
        None => notices.extend(
            editor
                .template_warnings()
                .iter()
                .cloned()
                .map(|warning| EditorEvent::TemplateFallback { warning }),
        ),
    }

    let worker = LayoutWorker::new();
    let events = editor
        .layout_in_background(&worker)
        .await?
        .ok_or_else(|| anyhow!("Layout was superseded before it finished"))?;
    notices.extend(events.into_iter().filter(|event| {
        matches!(
            event,
            EditorEvent::OverflowWarning { .. } | EditorEvent::TemplateFallback { .. }
        )
    }));

    let layout = editor
        .layout()
        .cloned()
        .ok_or_else(|| anyhow!("No layout produced"))?;

    for notice in &notices {
        eprintln!("{} {}", "warning:".yellow().bold(), describe(notice));
    }

    let output = match args.format {
        OutputFormat::Text => render_text(&layout, editor.tree(), editor.template()),
        OutputFormat::Json => layout.to_json(),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, output)?;
            eprintln!(
                "{} {} pages → {}",
                "✓".green(),
                layout.page_count(),
                path.display()
            );
        }
        None => print!("{}", output),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{init, InitArgs};
    use crate::commands::init::ProjectType;

    #[tokio::test]
    async fn test_paginate_sample_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();
        init(
            InitArgs {
                project_type: ProjectType::Screenplay,
                documents_dir: "documents".to_string(),
                force: false,
            },
            cwd,
        )
        .unwrap();

        let output = dir.path().join("sample.txt");
        paginate(
            PaginateArgs {
                document: "sample".to_string(),
                template: None,
                format: OutputFormat::Text,
                output: Some(output.clone()),
            },
            cwd,
        )
        .await
        .unwrap();

        let text = fs::read_to_string(output).unwrap();
        assert!(text.contains("INT. LIGHTHOUSE - NIGHT"));
        assert!(text.contains("MARA"));
    }

    #[tokio::test]
    async fn test_paginate_missing_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = paginate(
            PaginateArgs {
                document: "nothing".to_string(),
                template: None,
                format: OutputFormat::Json,
                output: None,
            },
            dir.path().to_str().unwrap(),
        )
        .await;
        assert!(result.is_err());
    }
}
