use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use scriptory_document::{DetachedBlock, Document, DocumentId, DocumentStore, Run};
use scriptory_editor::Editor;
use scriptory_templates::{BlockKind, DocumentType, TemplateId, TemplateRegistry};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProjectType {
    Screenplay,
    Stageplay,
    Audioplay,
    Comic,
    Novel,
}

impl From<ProjectType> for DocumentType {
    fn from(kind: ProjectType) -> Self {
        match kind {
            ProjectType::Screenplay => DocumentType::Screenplay,
            ProjectType::Stageplay => DocumentType::Stageplay,
            ProjectType::Audioplay => DocumentType::Audioplay,
            ProjectType::Comic => DocumentType::ComicBook,
            ProjectType::Novel => DocumentType::Novel,
        }
    }
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Kind of project
    #[arg(short = 't', long = "type", value_enum, default_value = "screenplay")]
    pub project_type: ProjectType,

    /// Documents directory
    #[arg(short, long, default_value = "documents")]
    pub documents_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Scriptory project...".bright_blue().bold());

    let document_type = DocumentType::from(args.project_type);
    let config = Config {
        documents_dir: args.documents_dir.clone(),
        default_template: document_type.builtin_template().to_string(),
        ..Config::default()
    };

    let templates_dir = config.templates_path(cwd);
    if !templates_dir.exists() {
        fs::create_dir_all(&templates_dir)?;
        println!("  {} Created {}/", "✓".green(), config.templates_dir);
    }

    // Sample document
    let mut store = config.store(cwd);
    let sample_id = DocumentId::new("sample");
    if !store.exists(&sample_id) {
        let document = sample_document(&config, sample_id, document_type)?;
        store.save(&document)?;
        println!("  {} Created {}/sample.json", "✓".green(), config.documents_dir);
    }

    // Write config file
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: scriptory paginate sample");
    println!("  2. Run: scriptory check");

    Ok(())
}

/// A short document of the requested type, built through the editor so it is
/// numbered like any other
fn sample_document(config: &Config, id: DocumentId, document_type: DocumentType) -> Result<Document> {
    let document = Document::with_template(id, document_type, TemplateId::new(&config.default_template));
    let mut editor = Editor::new(document, Arc::new(TemplateRegistry::with_builtins()));
    let root = editor.document().root();
    editor.import_blocks(root, sample_blocks(document_type))?;
    editor.clear_history();
    Ok(editor.into_document())
}

fn sample_blocks(document_type: DocumentType) -> Vec<DetachedBlock> {
    let leaf = |kind, text: &str| DetachedBlock::leaf(kind, vec![Run::plain(text)]);

    match document_type {
        DocumentType::Screenplay | DocumentType::Stageplay | DocumentType::Audioplay => vec![
            leaf(BlockKind::SceneHeading, "INT. LIGHTHOUSE - NIGHT"),
            leaf(BlockKind::Action, "Waves hammer the rocks. High above, the lamp turns."),
            leaf(BlockKind::Character, "Mara"),
            leaf(BlockKind::Dialogue, "Someone has to keep it burning."),
            leaf(BlockKind::SceneHeading, "EXT. CLIFF PATH - DAWN"),
            leaf(BlockKind::Action, "A lone figure climbs toward the light."),
        ],
        DocumentType::ComicBook => vec![DetachedBlock {
            kind: BlockKind::Heading(1),
            runs: vec![Run::plain("PAGE ONE")],
            children: vec![
                DetachedBlock {
                    kind: BlockKind::Panel,
                    runs: vec![Run::plain("Wide shot of the lighthouse in a storm.")],
                    children: vec![leaf(BlockKind::Caption, "The last night of the season.")],
                },
                DetachedBlock {
                    kind: BlockKind::Panel,
                    runs: vec![Run::plain("Mara at the lamp.")],
                    children: vec![
                        leaf(BlockKind::Character, "Mara"),
                        leaf(BlockKind::Dialogue, "Someone has to keep it burning."),
                    ],
                },
            ],
        }],
        DocumentType::Novel => vec![DetachedBlock {
            kind: BlockKind::Heading(1),
            runs: vec![Run::plain("Chapter One")],
            children: vec![
                leaf(BlockKind::PlainText, "The storm came in off the water just after dark."),
                leaf(BlockKind::PlainText, "Mara climbed the stairs to the lamp."),
            ],
        }],
    }
}
