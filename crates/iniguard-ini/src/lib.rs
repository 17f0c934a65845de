//! Strict two-level INI codec.
//!
//! Parses `[section]` / `key = value` text into an ordered document and
//! renders documents back to text. There is no default-section fallback,
//! no interpolation and no multi-line values: every non-blank, non-comment
//! line is either a section header or a single key/value pair.

mod document;
mod error;
mod parser;

pub use document::{IniDocument, IniEntry, IniSection};
pub use error::IniError;
pub use parser::{parse, parse_with, ParseOptions};

/// Characters that start a full-line comment.
pub const COMMENT_PREFIXES: &[char] = &['#', ';'];

/// Starts a trailing comment when inline comments are enabled.
pub const INLINE_COMMENT_PREFIX: char = '#';

/// Characters that separate a key from its value. The first one wins.
pub const DELIMITERS: &[char] = &['=', ':'];
