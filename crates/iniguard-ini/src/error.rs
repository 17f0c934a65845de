//! Error types for INI parsing.

/// A malformed INI source.
///
/// Line numbers are 1-based and refer to the raw text handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IniError {
    #[error("line {line}: key/value pair found before any section header")]
    MissingSectionHeader { line: usize },

    #[error("line {line}: empty section name")]
    EmptySectionName { line: usize },

    #[error("line {line}: empty key")]
    EmptyKey { line: usize },

    #[error("line {line}: expected `[section]` or `key = value`, got {content:?}")]
    Syntax { line: usize, content: String },
}

impl IniError {
    /// Line the error was detected on.
    pub fn line(&self) -> usize {
        match self {
            Self::MissingSectionHeader { line }
            | Self::EmptySectionName { line }
            | Self::EmptyKey { line }
            | Self::Syntax { line, .. } => *line,
        }
    }
}
