//! `section.option` names as typed on the command line.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;

use super::error::CliError;

/// A parsed `section.option` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOption {
    pub section: String,
    pub option: String,
}

impl SectionOption {
    /// Parse `SECTION.OPTION`. Both parts must be word characters and
    /// non-empty; anything else (missing dot, extra dots, spaces) is a usage
    /// error.
    pub fn from_dot_notation(name: &str) -> Result<Self, CliError> {
        static NAME_RE: OnceLock<Regex> = OnceLock::new();
        let re = NAME_RE.get_or_init(|| {
            Regex::new(r"^(?P<section>\w+)\.(?P<option>\w+)$").expect("static regex is valid")
        });

        let caps = re
            .captures(name)
            .ok_or_else(|| CliError::InvalidName(name.to_string()))?;
        Ok(Self {
            section: caps["section"].to_string(),
            option: caps["option"].to_string(),
        })
    }
}

impl FromStr for SectionOption {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_dot_notation(s)
    }
}

impl fmt::Display for SectionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.option)
    }
}
