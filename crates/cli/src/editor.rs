use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

pub const FALLBACK_EDITOR: &str = "vi";

/// `$VISUAL`, then `$EDITOR`, then `vi`.
pub fn editor_command() -> String {
    pick_editor(std::env::var("VISUAL").ok(), std::env::var("EDITOR").ok())
}

fn pick_editor(visual: Option<String>, editor: Option<String>) -> String {
    [visual, editor]
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Opens `path` in the user's editor and blocks until it exits.
/// Extra words in the command (`code --wait`) are passed as arguments.
pub fn edit(path: &Path) -> Result<()> {
    let command = editor_command();
    let mut parts = command.split_whitespace();
    let program = parts.next().unwrap_or(FALLBACK_EDITOR);
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to launch editor {:?}", command))?;
    if !status.success() {
        bail!("editor {:?} exited with {}", command, status);
    }
    Ok(())
}
