//! Compiled patterns and first-match resolution.

use std::fmt;

use regex_lite::Regex;

/// A schema pattern compiled with full-match semantics.
///
/// `\d{8}` is compiled as `^(?:\d{8})$`, so it matches `12345678` but not
/// `abc12345678`. Patterns that already carry their own anchors are
/// unaffected. The text as written in the schema is kept for messages.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex_lite::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern exactly as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl AsRef<Pattern> for Pattern {
    fn as_ref(&self) -> &Pattern {
        self
    }
}

/// Return the first item, in iteration order, whose pattern fully matches
/// `candidate`.
///
/// Items are anything that carries a pattern (the pattern itself, or a
/// schema rule keyed by one), so callers get the owning rule back directly.
pub fn first_match<'p, T, I>(candidate: &str, items: I) -> Option<&'p T>
where
    T: AsRef<Pattern> + 'p,
    I: IntoIterator<Item = &'p T>,
{
    items.into_iter().find(|item| item.as_ref().is_match(candidate))
}
