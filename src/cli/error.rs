//! CLI error type and exit codes.

use std::path::PathBuf;
use std::process::ExitStatus;

use iniguard_schema::{InvalidConfigError, SchemaError};

use crate::config::SettingsError;
use crate::store::StoreError;

/// Anything that ends a CLI invocation unsuccessfully.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid name format. Valid format is 'section.option', but got '{0}'.")]
    InvalidName(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Invalid(#[from] InvalidConfigError),

    #[error("No section: '{section}'")]
    NoSection { section: String },

    #[error("No option '{option}' in section: '{section}'")]
    NoOption { section: String, option: String },

    #[error("{count} violation(s) found")]
    Violations { count: usize },

    #[error("failed to launch editor {editor:?} for {}: {source}", path.display())]
    EditorLaunch {
        editor: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("editor {editor:?} exited with {status}")]
    EditorFailed { editor: String, status: ExitStatus },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code: 2 for usage errors, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidName(_) => 2,
            _ => 1,
        }
    }
}
