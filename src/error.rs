//! Error taxonomy shared by the analyzer, renderers, frontmatter and config layers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or incomplete configuration (config file, CLI arguments).
    #[error("configuration error: {0}")]
    Config(String),

    #[error("Unsupported import format: {0}")]
    UnsupportedImportFormat(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedExportFormat(String),

    /// The raw payload handed to the analyzer is missing required fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A `%{key}` placeholder referenced a key with no value.
    #[error("key not found: {0}")]
    MissingPlaceholder(String),

    /// Failure talking to GitHub. Never retried.
    #[error("GitHub request failed: {0}")]
    Transport(#[from] octocrab::Error),

    #[error("environment configuration error: {0}")]
    Env(#[from] envy::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// True for failures that originate in the data source rather than in analysis or rendering.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
