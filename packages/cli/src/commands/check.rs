use super::{describe, load, paginate::OutputFormat};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use scriptory_document::{BlockSource, DocumentId, DocumentStore};
use scriptory_editor::{correct_numbering, Editor, EditorConfig, EditorEvent, RenumberReason};
use serde::Serialize;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document ids to check (defaults to every document in the project)
    pub documents: Vec<String>,

    /// Show all diagnostics including info level
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub rule: &'static str,
    pub message: String,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            rule,
            message: message.into(),
        }
    }
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = Arc::new(config.registry(cwd)?);

    let ids: Vec<String> = if args.documents.is_empty() {
        config
            .store(cwd)
            .list()?
            .into_iter()
            .map(|id: DocumentId| id.to_string())
            .collect()
    } else {
        args.documents.clone()
    };

    if args.format == OutputFormat::Text {
        println!("🔍 {} Scriptory check", "Starting".green().bold());
        println!("   Documents: {}", ids.len());
        println!();
    }

    let mut total_errors = 0;
    let mut total_warnings = 0;
    let mut report = Vec::new();

    for id in &ids {
        let diagnostics = check_document(&config, cwd, &registry, id);
        total_errors += count(&diagnostics, DiagnosticLevel::Error);
        total_warnings += count(&diagnostics, DiagnosticLevel::Warning);

        match args.format {
            OutputFormat::Json => report.push(serde_json::json!({
                "document": id,
                "diagnostics": diagnostics,
            })),
            OutputFormat::Text => print_text(id, &diagnostics, args.verbose),
        }
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!(
            "✨ {} Check complete!",
            if total_errors > 0 {
                "Done".red().bold()
            } else {
                "Done".green().bold()
            }
        );
        if total_errors > 0 {
            println!("   {} {}", "Errors:".red(), total_errors);
        }
        if total_warnings > 0 {
            println!("   {} {}", "Warnings:".yellow(), total_warnings);
        }
        if total_errors == 0 && total_warnings == 0 {
            println!("   {} No issues found!", "✓".green());
        }
    }

    if total_errors > 0 {
        return Err(anyhow!("{} error(s) found", total_errors));
    }
    Ok(())
}

/// Every diagnostic for one document. Load failures become diagnostics so
/// the remaining documents are still checked.
fn check_document(
    config: &Config,
    cwd: &str,
    registry: &Arc<scriptory_templates::TemplateRegistry>,
    id: &str,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let document = match load(config, cwd, id) {
        Ok((_, document)) => document,
        Err(err) => {
            diagnostics.push(Diagnostic::new(DiagnosticLevel::Error, "load", format!("{:#}", err)));
            return diagnostics;
        }
    };

    let mut editor = Editor::with_config(
        document,
        registry.clone(),
        EditorConfig {
            auto_layout: false,
            ..EditorConfig::default()
        },
    );

    for warning in editor.template_warnings() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warning,
            "template",
            describe(&EditorEvent::TemplateFallback {
                warning: warning.clone(),
            }),
        ));
    }

    // Numbering as stored versus what the lock state calls for
    let effect = correct_numbering(editor.document(), editor.template(), RenumberReason::Structural);
    for event in &effect.events {
        if let EditorEvent::RenumberPerformed {
            class,
            reason: RenumberReason::Conflict,
            ..
        } = event
        {
            diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "numbering",
                format!("Duplicate {} numbers", class),
            ));
        }
    }
    if !effect.commands.is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warning,
            "numbering",
            format!(
                "{} block(s) need renumbering (run `scriptory renumber {}`)",
                effect.commands.len(),
                id
            ),
        ));
    }

    match editor.refresh_layout() {
        Ok(events) => {
            for event in events {
                if let EditorEvent::OverflowWarning { .. } = event {
                    diagnostics.push(Diagnostic::new(DiagnosticLevel::Warning, "overflow", describe(&event)));
                }
            }
        }
        Err(err) => {
            diagnostics.push(Diagnostic::new(DiagnosticLevel::Error, "layout", err.to_string()));
        }
    }

    for block in editor.tree().live_blocks() {
        let leaf = block.parent.is_some() && block.children.is_empty();
        if leaf && block.text().trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Info,
                "empty-block",
                format!("Empty {} block {}", block.kind, block.id),
            ));
        }
    }

    diagnostics
}

fn count(diagnostics: &[Diagnostic], level: DiagnosticLevel) -> usize {
    diagnostics.iter().filter(|d| d.level == level).count()
}

fn print_text(id: &str, diagnostics: &[Diagnostic], verbose: bool) {
    let shown: Vec<&Diagnostic> = diagnostics
        .iter()
        .filter(|d| verbose || d.level != DiagnosticLevel::Info)
        .collect();

    if shown.is_empty() {
        if verbose {
            println!("{} {}", "✓".green(), id);
        }
        return;
    }

    println!("{}", id);
    for diagnostic in shown {
        let level_str = match diagnostic.level {
            DiagnosticLevel::Error => "error".red().bold(),
            DiagnosticLevel::Warning => "warning".yellow().bold(),
            DiagnosticLevel::Info => "info".blue().bold(),
        };
        println!(
            "  {} [{}] {}",
            level_str,
            diagnostic.rule.dimmed(),
            diagnostic.message
        );
    }
}
