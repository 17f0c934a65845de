//! `--edit`: hand the writable config file to an external editor.

use std::path::Path;
use std::process::Command;

use super::error::CliError;
use crate::config::FALLBACK_EDITOR;

/// Pick the editor command: `VISUAL`, then `EDITOR`, then the configured
/// one, then the built-in fallback. Empty values are skipped.
pub fn resolve_editor(
    visual: Option<String>,
    editor: Option<String>,
    configured: Option<&str>,
) -> String {
    visual
        .into_iter()
        .chain(editor)
        .chain(configured.map(str::to_string))
        .find(|e| !e.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Resolve the editor from the process environment.
pub fn editor_from_env(configured: Option<&str>) -> String {
    resolve_editor(
        std::env::var("VISUAL").ok(),
        std::env::var("EDITOR").ok(),
        configured,
    )
}

/// Run `editor path` and wait for it. The editor string may carry its own
/// arguments (`code --wait`).
pub fn open_in_editor(editor: &str, path: &Path) -> Result<(), CliError> {
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or(editor);

    tracing::debug!(editor, path = %path.display(), "launching editor");
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|source| CliError::EditorLaunch {
            editor: editor.to_string(),
            path: path.to_path_buf(),
            source,
        })?;

    if !status.success() {
        return Err(CliError::EditorFailed {
            editor: editor.to_string(),
            status,
        });
    }
    Ok(())
}
