//! The classify → build path → write pipeline.

use crate::classifier::{self, ContentKind};
use crate::config::SaveConfig;
use crate::error::Result;
use crate::{naming, writer};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved { path: PathBuf, tag: ContentKind },
    Updated { path: PathBuf },
    Skipped { reason: SkipReason },
}

impl SaveOutcome {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            SaveOutcome::Saved { path, .. } | SaveOutcome::Updated { path } => Some(path),
            SaveOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Trimmed text is shorter than `min_content_length`.
    BelowMinimum,
    /// The buffer belongs to a file outside the scratch folder.
    NotScratch,
    /// The triggering event has auto-save turned off.
    AutoSaveDisabled,
}

/// Upper bound on create attempts when names keep getting taken under us.
const MAX_WRITE_ATTEMPTS: usize = 16;

pub fn meets_minimum(config: &SaveConfig, text: &str) -> bool {
    text.trim().chars().count() >= config.min_content_length
}

/// Saves `text` as a new scratch file.
///
/// Text below the minimum length is skipped without touching the disk.
pub fn save_text(config: &SaveConfig, text: &str, now: &DateTime<Local>) -> Result<SaveOutcome> {
    if !meets_minimum(config, text) {
        debug!(min = config.min_content_length, "content below minimum length, not saving");
        return Ok(SaveOutcome::Skipped {
            reason: SkipReason::BelowMinimum,
        });
    }

    let classification = classifier::classify(text);
    let mut attempt = 1;
    loop {
        let path = naming::build_path(config, &classification, now)?;
        match writer::write_new(&path, text) {
            Ok(()) => {
                info!(path = %path.display(), tag = %classification.tag, "saved scratch file");
                return Ok(SaveOutcome::Saved {
                    path,
                    tag: classification.tag,
                });
            }
            // Someone took the name between the check and the write; pick the next one.
            Err(e) if e.is_already_exists() && attempt < MAX_WRITE_ATTEMPTS => {
                debug!(path = %path.display(), attempt, "name taken, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn config_in(dir: &std::path::Path) -> SaveConfig {
        SaveConfig {
            folder: dir.to_string_lossy().into_owned(),
            ..SaveConfig::default()
        }
    }

    #[test]
    fn blank_text_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let out = save_text(&config_in(tmp.path()), "  \n ", &Local::now()).unwrap();
        assert_eq!(
            out,
            SaveOutcome::Skipped {
                reason: SkipReason::BelowMinimum
            }
        );
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn minimum_counts_trimmed_characters() {
        let cfg = SaveConfig {
            min_content_length: 4,
            ..SaveConfig::default()
        };
        assert!(!meets_minimum(&cfg, "  abc  "));
        assert!(meets_minimum(&cfg, "äbcd"));
    }

    #[test]
    fn saves_with_detected_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2025, 2, 12, 8, 0, 0).single().unwrap();
        let out = save_text(&config_in(tmp.path()), "SELECT * FROM t;", &now).unwrap();
        let path = out.path().unwrap();
        assert_eq!(path.file_name().unwrap(), "scratch_20250212_080000.sql");
        assert_eq!(fs::read_to_string(path).unwrap(), "SELECT * FROM t;");
        assert!(matches!(out, SaveOutcome::Saved { tag: ContentKind::Sql, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_not_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2025, 2, 12, 9, 0, 0).single().unwrap();
        let link = tmp.path().join("scratch_20250212_090000.txt");
        std::os::unix::fs::symlink(tmp.path().join("missing"), &link).unwrap();

        let out = save_text(&config_in(tmp.path()), "hello", &now).unwrap();
        let path = out.path().unwrap();
        assert_eq!(path.file_name().unwrap(), "scratch_20250212_090000-1.txt");
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }

    #[test]
    fn malformed_format_aborts_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = SaveConfig {
            filename_format: "bad_%".to_string(),
            ..config_in(tmp.path())
        };
        let err = save_text(&cfg, "hello", &Local::now()).unwrap_err();
        assert!(err.is_config());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
