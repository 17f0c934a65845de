//! `git config` style actions over a schema and a layered store.
//!
//! [`ConfigCli`] owns a [`Schema`] and a [`ConfigStore`] and checks every
//! write twice: the single entry before it is applied, then the whole
//! writable layer again when it is saved. A rejected save leaves the file
//! on disk untouched.

mod editor;
mod error;
mod name;

pub use editor::{editor_from_env, open_in_editor, resolve_editor};
pub use error::CliError;
pub use name::SectionOption;

use std::io::Write;
use std::path::Path;

use iniguard_schema::{Schema, Violation};
use serde::Serialize;

use crate::config::Settings;
use crate::store::{ConfigEntry, ConfigStore};

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Get(SectionOption),
    Set(SectionOption, String),
    Unset(SectionOption),
    UnsetAll,
    List,
    Check,
    ListValidOptions,
    Edit,
}

/// Output formatting switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Prefix values with `file:<path>\t`, like `git config --show-origin`.
    pub show_origin: bool,
    /// Emit `--list` / `--check` output as JSON.
    pub json: bool,
}

/// Schema plus store, composed.
#[derive(Debug)]
pub struct ConfigCli {
    schema: Schema,
    store: ConfigStore,
}

impl ConfigCli {
    pub fn new(schema: Schema, store: ConfigStore) -> Self {
        Self { schema, store }
    }

    /// Load the schema and every config layer named by `settings`.
    pub fn open(settings: &Settings) -> Result<Self, CliError> {
        let schema = Schema::from_file(&settings.schema)?;
        let store = ConfigStore::load(&settings.layers, settings.store_options())?;
        Ok(Self::new(schema, store))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Fail on the first invalid entry of the effective view.
    pub fn ensure_valid(&self) -> Result<(), CliError> {
        self.store.validate_effective(&self.schema)?;
        Ok(())
    }

    /// Effective entry for `name`.
    pub fn get(&self, name: &SectionOption) -> Result<ConfigEntry, CliError> {
        match self.store.get_with_layer(&name.section, &name.option) {
            Some((value, layer)) => Ok(ConfigEntry {
                section: self.store.normalize_name(&name.section),
                option: self.store.normalize_name(&name.option),
                value: value.to_string(),
                layer,
            }),
            None if !self.store.has_section(&name.section) => Err(CliError::NoSection {
                section: name.section.clone(),
            }),
            None => Err(CliError::NoOption {
                section: name.section.clone(),
                option: name.option.clone(),
            }),
        }
    }

    /// Validate one entry, apply it to the writable layer, then save.
    ///
    /// A value the schema rejects never reaches the store.
    pub fn set(&mut self, name: &SectionOption, value: &str) -> Result<(), CliError> {
        self.store.ensure_section_allowed(&name.section)?;
        let section = self.store.normalize_name(&name.section);
        let option = self.store.normalize_name(&name.option);
        self.schema.validate_entry(&section, &option, value)?;

        self.store.set(&section, &option, value)?;
        self.store.save(&self.schema)?;
        tracing::debug!(%section, %option, "option set");
        Ok(())
    }

    /// Remove `name` from the writable layer; save only if something was
    /// removed.
    pub fn unset(&mut self, name: &SectionOption) -> Result<bool, CliError> {
        let removed = self.store.unset(&name.section, &name.option)?;
        if removed {
            self.store.save(&self.schema)?;
        }
        Ok(removed)
    }

    /// Empty the writable layer and save.
    pub fn unset_all(&mut self) -> Result<(), CliError> {
        self.store.unset_all();
        self.store.save(&self.schema)?;
        Ok(())
    }

    pub fn list(&self) -> Vec<ConfigEntry> {
        self.store.list_entries().collect()
    }

    /// Every violation in the effective view.
    pub fn check(&self) -> Vec<Violation> {
        self.store.check_effective(&self.schema)
    }

    /// Path of the layer an entry came from.
    pub fn origin(&self, entry: &ConfigEntry) -> &Path {
        self.store.layers()[entry.layer].path()
    }

    fn write_value(
        &self,
        out: &mut dyn Write,
        entry: &ConfigEntry,
        text: &str,
        output: OutputOptions,
    ) -> std::io::Result<()> {
        if output.show_origin {
            writeln!(out, "file:{}\t{}", self.origin(entry).display(), text)
        } else {
            writeln!(out, "{}", text)
        }
    }
}

#[derive(Serialize)]
struct ListedEntry<'a> {
    #[serde(flatten)]
    entry: &'a ConfigEntry,
    origin: &'a Path,
}

/// Execute one action, writing command output to `out`.
///
/// `--edit` and `--list-valid-options` only need paths and the schema, so
/// they work even when the config on disk is currently invalid. Every other
/// action first validates the loaded effective view.
pub fn run(
    settings: &Settings,
    action: Action,
    output: OutputOptions,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match action {
        Action::ListValidOptions => {
            let schema = Schema::from_file(&settings.schema)?;
            write!(out, "{}", schema.describe())?;
            return Ok(());
        }
        Action::Edit => {
            let editor = editor_from_env(settings.editor.as_deref());
            return open_in_editor(&editor, settings.writable_path());
        }
        _ => {}
    }

    let mut cli = ConfigCli::open(settings)?;

    if action == Action::Check {
        let violations = cli.check();
        if output.json {
            serde_json::to_writer_pretty(&mut *out, &violations).map_err(std::io::Error::from)?;
            writeln!(out)?;
        } else {
            for v in &violations {
                writeln!(out, "{}", v)?;
            }
        }
        if violations.is_empty() {
            return Ok(());
        }
        return Err(CliError::Violations {
            count: violations.len(),
        });
    }

    cli.ensure_valid()?;

    match action {
        Action::Get(name) => {
            let entry = cli.get(&name)?;
            cli.write_value(out, &entry, &entry.value, output)?;
        }
        Action::Set(name, value) => cli.set(&name, &value)?,
        Action::Unset(name) => {
            cli.unset(&name)?;
        }
        Action::UnsetAll => cli.unset_all()?,
        Action::List => {
            let entries = cli.list();
            if output.json {
                let listed: Vec<ListedEntry<'_>> = entries
                    .iter()
                    .map(|entry| ListedEntry {
                        entry,
                        origin: cli.origin(entry),
                    })
                    .collect();
                serde_json::to_writer_pretty(&mut *out, &listed).map_err(std::io::Error::from)?;
                writeln!(out)?;
            } else {
                for entry in &entries {
                    let line = format!("{}={}", entry.name(), entry.value);
                    cli.write_value(out, entry, &line, output)?;
                }
            }
        }
        Action::Check | Action::ListValidOptions | Action::Edit => {}
    }
    Ok(())
}
