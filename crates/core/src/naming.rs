//! Builds collision-free target paths for scratch files.

use crate::classifier::{ClassificationResult, ContentKind};
use crate::config::SaveConfig;
use crate::error::{Result, ScratchError};
use crate::paths;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves the directory, renders the timestamped name, picks the extension
/// and appends `-1`, `-2`, ... until the path is free.
pub fn build_path(
    config: &SaveConfig,
    classification: &ClassificationResult,
    now: &DateTime<Local>,
) -> Result<PathBuf> {
    let dir = target_dir(config, now)?;
    ensure_dir(&dir)?;
    let base = render_base_name(&config.filename_format, now)?;
    let ext = choose_extension(config, classification);
    let path = next_free_path(&dir, &base, &ext);
    debug!(path = %path.display(), tag = %classification.tag, "built scratch path");
    Ok(path)
}

pub fn target_dir(config: &SaveConfig, now: &DateTime<Local>) -> Result<PathBuf> {
    let root = paths::resolve_user_folder(&config.folder)?;
    if config.organize_by_date {
        Ok(root
            .join(now.format("%Y").to_string())
            .join(now.format("%m").to_string()))
    } else {
        Ok(root)
    }
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ScratchError::io(dir, e))
}

/// Renders a strftime pattern, rejecting malformed specifiers and names that
/// would escape the target directory.
pub fn render_base_name(format: &str, now: &DateTime<Local>) -> Result<String> {
    let invalid = |reason: &str| ScratchError::InvalidFormat {
        format: format.to_string(),
        reason: reason.to_string(),
    };

    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid("unrecognized strftime specifier"));
    }

    let mut base = String::new();
    write!(base, "{}", now.format_with_items(items.iter()))
        .map_err(|_| invalid("pattern could not be rendered"))?;

    if base.trim().is_empty() {
        return Err(invalid("pattern renders to an empty name"));
    }
    if base.contains('/') || base.contains('\\') {
        return Err(invalid("pattern renders a path separator"));
    }
    Ok(base)
}

/// Plain text always takes the configured default.
pub fn choose_extension(config: &SaveConfig, classification: &ClassificationResult) -> String {
    if config.auto_detect_extension && classification.tag != ContentKind::Plain {
        classification.extension.clone()
    } else {
        normalize_extension(&config.default_extension)
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

/// A name is taken when any directory entry sits there, including a
/// dangling symlink that `Path::exists` would report as free.
pub fn next_free_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}{}", base, ext));
    let mut counter = 1;
    while fs::symlink_metadata(&candidate).is_ok() {
        candidate = dir.join(format!("{}-{}{}", base, counter, ext));
        counter += 1;
    }
    candidate
}
