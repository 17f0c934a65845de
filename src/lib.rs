//! iniguard - schema-checked, layered INI configuration.
//!
//! A schema file describes which sections, options and values are allowed
//! using full-match regular expressions. Config files are stacked in
//! layers; reads see the merged view and writes go to a single writable
//! layer that is re-validated before it is saved.

pub mod cli;
pub mod config;
pub mod logging;
pub mod store;

pub use cli::{Action, CliError, ConfigCli, OutputOptions, SectionOption};
pub use config::{Settings, SettingsError};
pub use iniguard_schema::{InvalidConfigError, Schema, SchemaError, Violation};
pub use store::{ConfigEntry, ConfigStore, StoreError, StoreOptions};
