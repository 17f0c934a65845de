//! Launcher settings: which schema and which config files to operate on.
//!
//! Settings are themselves layered, lowest precedence first:
//! 1. Built-in defaults
//! 2. Settings file (`--settings`, `INIGUARD_SETTINGS`, or
//!    `<config dir>/iniguard/settings.toml` when present)
//! 3. Environment (`INIGUARD_SCHEMA`, `INIGUARD_CONFIG`)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::{BuiltinDefaults, FALLBACK_EDITOR};
pub use effective::{
    CliOverrides, EnvOverrides, Settings, SettingsError, SettingsOrigin, SettingsSource,
};
pub use merge::{merge_all, merge_into};
