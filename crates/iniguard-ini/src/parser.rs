//! Line-oriented INI parser.

use crate::document::{IniDocument, IniEntry, IniSection};
use crate::error::IniError;
use crate::{COMMENT_PREFIXES, DELIMITERS, INLINE_COMMENT_PREFIX};

/// Parser knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Strip trailing `# ...` comments. The `#` only counts when preceded by
    /// whitespace, so `a#b` stays intact. `;` is never an inline comment.
    pub inline_comments: bool,
}

/// Parse INI text with default options (no inline comments).
pub fn parse(text: &str) -> Result<IniDocument, IniError> {
    parse_with(text, ParseOptions::default())
}

/// Parse INI text.
pub fn parse_with(text: &str, options: ParseOptions) -> Result<IniDocument, IniError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut doc = IniDocument::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIXES) {
            continue;
        }

        let content = if options.inline_comments {
            strip_inline_comment(trimmed)
        } else {
            trimmed
        };

        if let Some(name) = parse_header(content) {
            let name = name.trim();
            if name.is_empty() {
                return Err(IniError::EmptySectionName { line });
            }
            doc.sections.push(IniSection {
                name: name.to_string(),
                line,
                entries: Vec::new(),
            });
            continue;
        }

        let Some(pos) = content.find(DELIMITERS) else {
            return Err(IniError::Syntax {
                line,
                content: trimmed.to_string(),
            });
        };

        let key = content[..pos].trim();
        let value = content[pos + 1..].trim();
        if key.is_empty() {
            return Err(IniError::EmptyKey { line });
        }

        let Some(section) = doc.sections.last_mut() else {
            return Err(IniError::MissingSectionHeader { line });
        };
        section.entries.push(IniEntry {
            key: key.to_string(),
            value: value.to_string(),
            line,
        });
    }

    Ok(doc)
}

/// `[name]` -> `name`. The name runs from the first `[` to the last `]`, so
/// headers may themselves contain brackets (regex character classes).
fn parse_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

fn strip_inline_comment(line: &str) -> &str {
    let mut prev_ws = false;
    for (i, c) in line.char_indices() {
        if prev_ws && c == INLINE_COMMENT_PREFIX {
            return line[..i].trim_end();
        }
        prev_ws = c.is_whitespace();
    }
    line
}
