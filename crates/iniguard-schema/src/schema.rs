//! Schema model: section pattern -> option pattern -> value pattern.

use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use iniguard_ini::{parse_with, IniDocument, IniSection, ParseOptions};

use crate::error::{PatternKind, SchemaError};
use crate::matcher::{first_match, Pattern};
use crate::RESERVED_SECTION;

/// An option-name pattern and the pattern its values must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRule {
    pub option: Pattern,
    pub value: Pattern,
}

/// A section-name pattern and its option rules, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRule {
    pub section: Pattern,
    pub options: Vec<OptionRule>,
}

impl AsRef<Pattern> for OptionRule {
    fn as_ref(&self) -> &Pattern {
        &self.option
    }
}

impl AsRef<Pattern> for SectionRule {
    fn as_ref(&self) -> &Pattern {
        &self.section
    }
}

impl SectionRule {
    /// First option rule whose pattern fully matches `option`.
    pub fn resolve_option(&self, option: &str) -> Option<&OptionRule> {
        first_match(option, &self.options)
    }

    /// Option pattern texts, for error messages.
    pub fn option_patterns(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|r| r.option.as_str().to_string())
            .collect()
    }
}

/// Immutable, fully compiled schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    sections: Vec<SectionRule>,
}

impl Schema {
    /// Load a schema file. Unlike config layers, a missing schema is an
    /// error.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SchemaError::Missing {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(SchemaError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let schema = Self::parse(&text, &path.display().to_string())?;
        tracing::debug!(
            path = %path.display(),
            sections = schema.sections.len(),
            "loaded schema"
        );
        Ok(schema)
    }

    /// Parse schema text. `origin` names the source in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self, SchemaError> {
        let options = ParseOptions {
            inline_comments: true,
        };
        let doc = parse_with(text, options).map_err(|source| SchemaError::Format {
            origin: origin.to_string(),
            source,
        })?;
        Self::from_document(&doc, origin)
    }

    /// Compile every pattern of a parsed document.
    ///
    /// Repeated section headers with identical text merge into the first
    /// occurrence. A repeated option pattern inside a merged section
    /// replaces the earlier value pattern in place.
    pub fn from_document(doc: &IniDocument, origin: &str) -> Result<Self, SchemaError> {
        let mut sections: Vec<SectionRule> = Vec::new();

        for raw in &doc.sections {
            if raw.name == RESERVED_SECTION {
                return Err(SchemaError::ReservedSection {
                    origin: origin.to_string(),
                    line: raw.line,
                });
            }

            let idx = match sections
                .iter()
                .position(|s| s.section.as_str() == raw.name)
            {
                Some(idx) => idx,
                None => {
                    sections.push(SectionRule {
                        section: compile(PatternKind::Section, &raw.name, None, &raw.name)?,
                        options: Vec::new(),
                    });
                    sections.len() - 1
                }
            };

            for entry in &raw.entries {
                let rule = OptionRule {
                    option: compile(PatternKind::Option, &raw.name, Some(&entry.key), &entry.key)?,
                    value: compile(PatternKind::Value, &raw.name, Some(&entry.key), &entry.value)?,
                };
                let options = &mut sections[idx].options;
                match options.iter_mut().find(|r| r.option == rule.option) {
                    Some(existing) => *existing = rule,
                    None => options.push(rule),
                }
            }
        }

        Ok(Self { sections })
    }

    /// Section rules in declaration order.
    pub fn sections(&self) -> &[SectionRule] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section pattern texts, for error messages.
    pub fn section_patterns(&self) -> Vec<String> {
        self.sections
            .iter()
            .map(|s| s.section.as_str().to_string())
            .collect()
    }

    /// First section rule whose pattern fully matches `section`.
    pub fn resolve_section(&self, section: &str) -> Option<&SectionRule> {
        first_match(section, &self.sections)
    }

    /// Value pattern for `section.option`.
    ///
    /// Only the FIRST matching section rule is consulted. If it has no
    /// matching option the lookup fails, even when a later section rule
    /// would have matched both.
    pub fn lookup_value_pattern(&self, section: &str, option: &str) -> Option<&Pattern> {
        self.resolve_section(section)?
            .resolve_option(option)
            .map(|r| &r.value)
    }

    /// Render the schema back to INI text, merged duplicates included.
    pub fn describe(&self) -> String {
        let mut doc = IniDocument::new();
        for rule in &self.sections {
            let mut section = IniSection::new(rule.section.as_str());
            for opt in &rule.options {
                section.push(opt.option.as_str(), opt.value.as_str());
            }
            doc.sections.push(section);
        }
        doc.render()
    }
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, "<string>")
    }
}

fn compile(
    kind: PatternKind,
    section: &str,
    option: Option<&str>,
    source: &str,
) -> Result<Pattern, SchemaError> {
    Pattern::new(source).map_err(|e| SchemaError::Pattern {
        kind,
        section: section.to_string(),
        option: option.map(str::to_string),
        pattern: source.to_string(),
        source: e,
    })
}
