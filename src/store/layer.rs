//! A single config file: its provenance and its sections.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use iniguard_ini::{IniDocument, IniSection, COMMENT_PREFIXES, DELIMITERS};
use iniguard_schema::RESERVED_SECTION;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::{DuplicateReason, StoreError};

/// Where a layer was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSource {
    pub path: PathBuf,

    /// False when the file did not exist at load time.
    pub exists: bool,

    /// SHA-256 of the bytes read or last written (hex).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    pub(crate) name: String,
    pub(crate) options: Vec<(String, String)>,
}

/// One layer of a [`ConfigStore`](super::ConfigStore).
///
/// Names are stored already normalized; callers fold before lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    source: LayerSource,
    pub(crate) sections: Vec<Section>,
}

impl Layer {
    /// An empty layer bound to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            source: LayerSource {
                path: path.into(),
                exists: false,
                digest: None,
            },
            sections: Vec::new(),
        }
    }

    /// Read `path`. A missing file yields an empty layer.
    pub(crate) fn load(path: &Path, case_sensitive: bool) -> Result<Self, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config layer missing, treating as empty");
                return Ok(Self::empty(path));
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let digest = digest(&bytes);
        let text = String::from_utf8(bytes).map_err(|e| StoreError::ConfigFormat {
            path: path.to_path_buf(),
            reason: format!("invalid UTF-8: {}", e),
        })?;
        let doc = iniguard_ini::parse(&text).map_err(|e| StoreError::ConfigFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut layer = Self::from_document(&doc, path, case_sensitive)?;
        layer.source.exists = true;
        layer.source.digest = Some(digest);
        tracing::debug!(
            path = %path.display(),
            sections = layer.sections.len(),
            "loaded config layer"
        );
        Ok(layer)
    }

    /// Build a layer from a parsed document.
    ///
    /// Within one file a header may appear only once and an option only once
    /// per section, both compared after case folding.
    pub(crate) fn from_document(
        doc: &IniDocument,
        path: &Path,
        case_sensitive: bool,
    ) -> Result<Self, StoreError> {
        let mut layer = Self::empty(path);

        for raw in &doc.sections {
            if raw.name == RESERVED_SECTION {
                return Err(StoreError::DuplicateSection {
                    section: raw.name.clone(),
                    path: path.to_path_buf(),
                    reason: DuplicateReason::Reserved,
                });
            }

            let name = fold(&raw.name, case_sensitive);
            if layer.section(&name).is_some() {
                return Err(StoreError::DuplicateSection {
                    section: name,
                    path: path.to_path_buf(),
                    reason: DuplicateReason::Repeated,
                });
            }

            let mut section = Section {
                name,
                options: Vec::with_capacity(raw.entries.len()),
            };
            for entry in &raw.entries {
                let key = fold(&entry.key, case_sensitive);
                if section.options.iter().any(|(k, _)| *k == key) {
                    return Err(StoreError::ConfigFormat {
                        path: path.to_path_buf(),
                        reason: format!(
                            "line {}: option \"{}\" repeated in section \"{}\"",
                            entry.line, key, section.name
                        ),
                    });
                }
                section.options.push((key, entry.value.clone()));
            }
            layer.sections.push(section);
        }

        Ok(layer)
    }

    pub fn source(&self) -> &LayerSource {
        &self.source
    }

    pub fn path(&self) -> &Path {
        &self.source.path
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.section(section).is_some()
    }

    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.section(section)?
            .options
            .iter()
            .find(|(k, _)| k == option)
            .map(|(_, v)| v.as_str())
    }

    /// `(section, option, value)` triples in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.sections.iter().flat_map(|s| {
            s.options
                .iter()
                .map(move |(k, v)| (s.name.as_str(), k.as_str(), v.as_str()))
        })
    }

    pub(crate) fn set(&mut self, section: &str, option: &str, value: &str) {
        let idx = match self.sections.iter().position(|s| s.name == section) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section {
                    name: section.to_string(),
                    options: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        let options = &mut self.sections[idx].options;
        match options.iter_mut().find(|(k, _)| k == option) {
            Some((_, v)) => *v = value.to_string(),
            None => options.push((option.to_string(), value.to_string())),
        }
    }

    /// Remove `option`; drop the section if it becomes empty.
    ///
    /// `None` when the section does not exist, otherwise whether the option
    /// was present.
    pub(crate) fn remove(&mut self, section: &str, option: &str) -> Option<bool> {
        let idx = self.sections.iter().position(|s| s.name == section)?;
        let options = &mut self.sections[idx].options;
        let before = options.len();
        options.retain(|(k, _)| k != option);
        let removed = options.len() != before;
        if options.is_empty() {
            self.sections.remove(idx);
        }
        Some(removed)
    }

    pub(crate) fn clear(&mut self) {
        self.sections.clear();
    }

    /// Every entry must survive a render and re-parse unchanged.
    pub(crate) fn ensure_round_trips(&self) -> Result<(), StoreError> {
        for (section, option, value) in self.entries() {
            check_storable(section, option, value).map_err(|reason| {
                StoreError::ConfigFormat {
                    path: self.path().to_path_buf(),
                    reason,
                }
            })?;
        }
        Ok(())
    }

    pub(crate) fn to_document(&self) -> IniDocument {
        let mut doc = IniDocument::new();
        for s in &self.sections {
            let mut section = IniSection::new(s.name.clone());
            for (k, v) in &s.options {
                section.push(k.clone(), v.clone());
            }
            doc.sections.push(section);
        }
        doc
    }

    pub(crate) fn mark_written(&mut self, contents: &str) {
        self.source.exists = true;
        self.source.digest = Some(digest(contents.as_bytes()));
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// Reject a `(section, option, value)` triple that would not read back
/// unchanged after rendering: surrounding whitespace is trimmed by the
/// parser, line breaks split the entry, and an option name may not carry a
/// delimiter or look like a comment or header.
pub(crate) fn check_storable(section: &str, option: &str, value: &str) -> Result<(), String> {
    let has_break = |s: &str| s.contains(['\n', '\r']);
    let padded = |s: &str| s.trim() != s;

    if section.is_empty() || padded(section) || has_break(section) {
        return Err(format!("section name {:?} cannot be stored", section));
    }
    if option.is_empty()
        || padded(option)
        || has_break(option)
        || option.contains(DELIMITERS)
        || option.starts_with(COMMENT_PREFIXES)
        || option.starts_with('[')
    {
        return Err(format!(
            "option name {:?} in section {:?} cannot be stored",
            option, section
        ));
    }
    if padded(value) || has_break(value) {
        return Err(format!(
            "value {:?} for \"{}.{}\" cannot be stored: leading or trailing whitespace and line breaks are not preserved",
            value, section, option
        ));
    }
    Ok(())
}

/// Lowercase a section or option name unless names are case-sensitive.
pub(crate) fn fold(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
