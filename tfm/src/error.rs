use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TfmError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error(
        "config file not found. Create either:\n{legacy_snippet}\n\nOR (recommended new format):\n{yaml_snippet}"
    )]
    ConfigMissing {
        legacy_snippet: String,
        yaml_snippet: String,
    },

    #[error("config file already exists at {path}")]
    ConfigExists { path: PathBuf },

    #[error("legacy config file not found at {path}")]
    LegacyConfigNotFound { path: PathBuf },

    #[error("failed to write config at {path}: {message}")]
    ConfigWrite { path: PathBuf, message: String },

    #[error("not in a git repository: {start}")]
    NotInRepository { start: PathBuf },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("{what} validation failed")]
    Validation { what: String },

    #[error("unsupported terraform action: {0}")]
    UnsupportedAction(String),

    #[error("failed to create workspace {workspace}")]
    WorkspaceCreate { workspace: String },
}
