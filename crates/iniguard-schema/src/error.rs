//! Schema loading errors and configuration violations.

use std::fmt;
use std::path::PathBuf;

use iniguard_ini::IniError;
use serde::Serialize;

/// Which part of a schema rule a pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Section,
    Option,
    Value,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section => write!(f, "section"),
            Self::Option => write!(f, "option"),
            Self::Value => write!(f, "value"),
        }
    }
}

/// The schema could not be loaded. Nothing is partially loaded.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read schema {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed schema {origin}: {source}")]
    Format {
        origin: String,
        #[source]
        source: IniError,
    },

    #[error("malformed schema {origin}: reserved section name \"DEFAULT\" on line {line}")]
    ReservedSection { origin: String, line: usize },

    #[error(
        "invalid {kind} pattern {pattern:?} in schema section {section:?}{}: {source}",
        .option.as_ref().map(|o| format!(", option {:?}", o)).unwrap_or_default()
    )]
    Pattern {
        kind: PatternKind,
        section: String,
        option: Option<String>,
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },
}

/// A configuration entry the schema does not accept.
///
/// Messages are user-facing and rendered verbatim by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidConfigError {
    #[error(
        "\"{section}\" is not a valid section. Valid sections should match one of these as a regular expression: {}.",
        .valid_sections.join(", ")
    )]
    InvalidSection {
        section: String,
        valid_sections: Vec<String>,
    },

    #[error(
        "\"{option}\" is not a valid option for section \"{section}\". Valid options in this section should match one of these as a regular expression: {}.",
        .valid_options.join(", ")
    )]
    InvalidOption {
        section: String,
        option: String,
        section_pattern: String,
        valid_options: Vec<String>,
    },

    #[error(
        "\"{value}\" is not a valid value for \"{section}.{option}\". Should match \"{pattern}\" as a regular expression."
    )]
    InvalidValue {
        section: String,
        option: String,
        value: String,
        pattern: String,
    },
}

/// One entry of a collect-all validation report.
pub type Violation = InvalidConfigError;

impl InvalidConfigError {
    /// Section the violation was found in.
    pub fn section(&self) -> &str {
        match self {
            Self::InvalidSection { section, .. }
            | Self::InvalidOption { section, .. }
            | Self::InvalidValue { section, .. } => section,
        }
    }

    /// The pattern that should have matched, for value violations.
    pub fn expected_pattern(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { pattern, .. } => Some(pattern),
            _ => None,
        }
    }
}
