//! In-memory INI document.

use std::fmt;

/// A single `key = value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniEntry {
    pub key: String,
    pub value: String,
    /// Source line, 0 for entries that were built in memory.
    pub line: usize,
}

/// A `[name]` header and the entries that follow it, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    /// Source line of the header, 0 for sections built in memory.
    pub line: usize,
    pub entries: Vec<IniEntry>,
}

impl IniSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line: 0,
            entries: Vec::new(),
        }
    }

    /// Append an entry. Duplicates are kept; the document is a faithful
    /// record of the text, not a map.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(IniEntry {
            key: key.into(),
            value: value.into(),
            line: 0,
        });
    }
}

/// Ordered list of sections as they appear in the source.
///
/// The same section name may appear more than once; callers decide whether
/// repeated headers merge or are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    pub sections: Vec<IniSection>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render as INI text.
    ///
    /// Sections are separated by a blank line and the output ends with a
    /// newline. An empty document renders as an empty string.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.name)?;
            for entry in &section.entries {
                writeln!(f, "{} = {}", entry.key, entry.value)?;
            }
        }
        Ok(())
    }
}
