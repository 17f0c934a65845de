//! Config store errors.

use std::fmt;
use std::path::PathBuf;

use iniguard_schema::InvalidConfigError;

/// Why a section name was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateReason {
    /// The literal name `DEFAULT`.
    Reserved,
    /// The same header appears twice in one file.
    Repeated,
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved => write!(f, "the name is reserved"),
            Self::Repeated => write!(f, "the header appears more than once"),
        }
    }
}

/// Errors raised while loading, mutating or persisting a [`ConfigStore`].
///
/// [`ConfigStore`]: crate::store::ConfigStore
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("malformed config {}: {reason}", path.display())]
    ConfigFormat { path: PathBuf, reason: String },

    #[error("duplicate section \"{section}\" in {}: {reason}", path.display())]
    DuplicateSection {
        section: String,
        path: PathBuf,
        reason: DuplicateReason,
    },

    #[error("No section: '{section}'")]
    NoSection { section: String },

    #[error("no config layers given")]
    NoLayers,

    #[error("writable layer index {index} is out of range for {layers} layer(s)")]
    WritableOutOfRange { index: usize, layers: usize },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Invalid(#[from] InvalidConfigError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
