//! Built-in settings (layer 1).

use serde_json::{json, Value};

/// Editor used when neither the environment nor the settings name one.
pub const FALLBACK_EDITOR: &str = "vim";

/// Values every other settings layer starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinDefaults {
    /// Names are lowercased unless this is set.
    pub case_sensitive: bool,

    /// Editor for `--edit`, after `VISUAL` and `EDITOR`.
    pub editor: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            editor: FALLBACK_EDITOR.to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// As a JSON object, ready for merging.
    pub fn to_value(&self) -> Value {
        json!({
            "case_sensitive": self.case_sensitive,
            "editor": self.editor,
            "layers": [],
        })
    }
}
