use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file {}: {source}", path.display())]
    TomlDe {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write settings: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Failed to render settings as JSON: {0}")]
    JsonSer(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    /// The program could not be started at all (not found, not executable).
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
