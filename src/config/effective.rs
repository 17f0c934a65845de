//! Effective settings with provenance.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use super::defaults::BuiltinDefaults;
use super::merge::merge_all;
use crate::store::StoreOptions;

/// Environment variable naming the settings file.
pub const ENV_SETTINGS: &str = "INIGUARD_SETTINGS";
/// Environment variable naming the schema file.
pub const ENV_SCHEMA: &str = "INIGUARD_SCHEMA";
/// Environment variable naming a single config file to operate on.
pub const ENV_CONFIG: &str = "INIGUARD_CONFIG";

/// Where a settings layer came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettingsOrigin {
    Builtin,
    File,
    Env,
    Cli,
}

/// A contributing settings layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsSource {
    pub origin: SettingsOrigin,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the settings file bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Overrides taken from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub settings: Option<PathBuf>,
    pub schema: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            settings: var(ENV_SETTINGS),
            schema: var(ENV_SCHEMA),
            config: var(ENV_CONFIG),
        }
    }

    fn to_value(&self) -> Option<Value> {
        let mut value = json!({});
        if let Some(schema) = &self.schema {
            value["schema"] = path_value(schema);
        }
        if let Some(config) = &self.config {
            value["layers"] = json!([path_value(config)]);
            value["writable"] = Value::Null;
        }
        non_empty(value)
    }
}

/// Overrides taken from command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub settings: Option<PathBuf>,
    pub schema: Option<PathBuf>,
    /// Replaces the layer list; the last file is writable.
    pub files: Vec<PathBuf>,
    pub case_sensitive: bool,
}

impl CliOverrides {
    fn to_value(&self) -> Option<Value> {
        let mut value = json!({});
        if let Some(schema) = &self.schema {
            value["schema"] = path_value(schema);
        }
        if !self.files.is_empty() {
            value["layers"] = Value::Array(self.files.iter().map(|p| path_value(p)).collect());
            value["writable"] = Value::Null;
        }
        if self.case_sensitive {
            value["case_sensitive"] = Value::Bool(true);
        }
        non_empty(value)
    }
}

/// Shape of the merged settings before resolution.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    schema: Option<PathBuf>,
    #[serde(default)]
    layers: Vec<PathBuf>,
    writable: Option<usize>,
    #[serde(default)]
    case_sensitive: bool,
    editor: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Settings {
    pub schema: PathBuf,

    /// Config files, lowest precedence first.
    pub layers: Vec<PathBuf>,

    /// Index into `layers` of the file that writes go to.
    pub writable: usize,

    pub case_sensitive: bool,

    pub editor: Option<String>,

    /// Contributing layers in precedence order.
    pub sources: Vec<SettingsSource>,
}

impl Settings {
    /// Resolve settings from the environment and CLI flags.
    ///
    /// An explicitly named settings file must exist; the per-user default
    /// location is only used when present.
    pub fn resolve(cli: &CliOverrides, env: &EnvOverrides) -> Result<Self, SettingsError> {
        let explicit = cli.settings.as_ref().or(env.settings.as_ref());
        match explicit {
            Some(path) => Self::build(Some(path), env, cli),
            None => {
                let default = default_settings_path().filter(|p| p.is_file());
                Self::build(default.as_deref(), env, cli)
            }
        }
    }

    /// Merge builtin defaults, an optional settings file, the environment
    /// and CLI flags.
    pub fn build(
        settings_file: Option<&Path>,
        env: &EnvOverrides,
        cli: &CliOverrides,
    ) -> Result<Self, SettingsError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![SettingsSource {
            origin: SettingsOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = settings_file {
            let (value, digest) = load_settings_file(path)?;
            layers.push(value);
            sources.push(SettingsSource {
                origin: SettingsOrigin::File,
                path: Some(path.display().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(value) = env.to_value() {
            layers.push(value);
            sources.push(SettingsSource {
                origin: SettingsOrigin::Env,
                path: None,
                digest: None,
            });
        }

        if let Some(value) = cli.to_value() {
            layers.push(value);
            sources.push(SettingsSource {
                origin: SettingsOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let raw: RawSettings = serde_json::from_value(merge_all(layers))
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;

        let schema = raw.schema.ok_or(SettingsError::MissingSchema)?;
        if raw.layers.is_empty() {
            return Err(SettingsError::MissingLayers);
        }
        let writable = raw.writable.unwrap_or(raw.layers.len() - 1);
        if writable >= raw.layers.len() {
            return Err(SettingsError::Invalid(format!(
                "writable = {} but only {} layer(s) are configured",
                writable,
                raw.layers.len()
            )));
        }

        let settings = Self {
            schema,
            layers: raw.layers,
            writable,
            case_sensitive: raw.case_sensitive,
            editor: raw.editor,
            sources,
        };
        tracing::debug!(
            schema = %settings.schema.display(),
            layers = settings.layers.len(),
            writable = settings.writable,
            "resolved settings"
        );
        Ok(settings)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            case_sensitive: self.case_sensitive,
            writable: Some(self.writable),
        }
    }

    pub fn writable_path(&self) -> &Path {
        &self.layers[self.writable]
    }
}

/// `<config dir>/iniguard/settings.toml`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("iniguard").join("settings.toml"))
}

/// Read a TOML settings file, resolving relative paths against its
/// directory. Returns the value and the SHA-256 of the raw bytes.
fn load_settings_file(path: &Path) -> Result<(Value, String), SettingsError> {
    let bytes = fs::read(path).map_err(|e| SettingsError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let parse_error = |reason: String| SettingsError::Parse {
        path: path.to_path_buf(),
        reason,
    };
    let text = String::from_utf8(bytes).map_err(|e| parse_error(format!("invalid UTF-8: {}", e)))?;
    let mut value: Value = toml::from_str(&text).map_err(|e| parse_error(e.to_string()))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    if let Some(schema) = value.get_mut("schema") {
        rebase(schema, base);
    }
    if let Some(Value::Array(layers)) = value.get_mut("layers") {
        for layer in layers {
            rebase(layer, base);
        }
    }

    Ok((value, digest))
}

fn rebase(value: &mut Value, base: &Path) {
    if let Value::String(s) = value {
        let p = Path::new(s.as_str());
        if p.is_relative() {
            *value = path_value(&base.join(p));
        }
    }
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}

fn non_empty(value: Value) -> Option<Value> {
    match &value {
        Value::Object(map) if map.is_empty() => None,
        _ => Some(value),
    }
}

/// Settings errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("no schema configured (use --schema, INIGUARD_SCHEMA or a settings file)")]
    MissingSchema,

    #[error("no config file configured (use --file, INIGUARD_CONFIG or a settings file)")]
    MissingLayers,

    #[error("invalid settings: {0}")]
    Invalid(String),
}
