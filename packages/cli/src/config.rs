use anyhow::Context;
use scriptory_document::FileStore;
use scriptory_templates::TemplateRegistry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "scriptory.config.json";

/// Scriptory project configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory of custom template JSON files
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Directory holding one JSON file per document
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,

    /// Template given to new documents
    #[serde(default = "default_template")]
    pub default_template: String,
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_documents_dir() -> String {
    "documents".to_string()
}

fn default_template() -> String {
    "screenplay".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid {}", config_path.display()))?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn templates_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.templates_dir)
    }

    pub fn documents_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.documents_dir)
    }

    /// Built-in templates plus the project's own
    pub fn registry(&self, cwd: &str) -> anyhow::Result<TemplateRegistry> {
        let dir = self.templates_path(cwd);
        if !dir.is_dir() {
            return Ok(TemplateRegistry::with_builtins());
        }
        TemplateRegistry::load_dir(&dir)
            .with_context(|| format!("Failed to load templates from {}", dir.display()))
    }

    pub fn store(&self, cwd: &str) -> FileStore {
        FileStore::new(self.documents_path(cwd))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            documents_dir: default_documents_dir(),
            default_template: default_template(),
        }
    }
}
