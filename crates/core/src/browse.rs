//! Lists saved scratch files, newest first, with a short preview.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, Serialize)]
pub struct BrowseEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub modified: DateTime<Local>,
    pub age: String,
    pub preview: String,
}

/// Walks `folder` recursively, so date-organized subfolders are included.
/// Hidden files and folders (drafts, staged writes) are skipped.
pub fn list_entries(folder: &Path, now: &DateTime<Local>) -> Vec<BrowseEntry> {
    let mut entries: Vec<BrowseEntry> = WalkDir::new(folder)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let modified: DateTime<Local> = e.metadata().ok()?.modified().ok()?.into();
            Some(BrowseEntry {
                path: e.path().to_path_buf(),
                file_name: e.file_name().to_string_lossy().into_owned(),
                age: relative_time(&modified, now),
                preview: preview(e.path()),
                modified,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
    entries
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// First non-empty line, cut to 80 characters.
pub fn preview(path: &Path) -> String {
    let Ok(file) = fs::File::open(path) else {
        return "(empty)".to_string();
    };
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.chars().count() > PREVIEW_CHARS {
                    let cut: String = line.chars().take(PREVIEW_CHARS).collect();
                    return format!("{}…", cut);
                }
                return line.to_string();
            }
        }
    }
    "(empty)".to_string()
}

pub fn relative_time(then: &DateTime<Local>, now: &DateTime<Local>) -> String {
    let seconds = (*now - *then).num_seconds();
    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3_600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3_600)
    } else if seconds < 604_800 {
        format!("{}d ago", seconds / 86_400)
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn relative_time_buckets() {
        let now = Local.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).single().unwrap();
        let ago = |d: Duration| relative_time(&(now - d), &now);
        assert_eq!(ago(Duration::seconds(5)), "just now");
        assert_eq!(ago(Duration::minutes(12)), "12m ago");
        assert_eq!(ago(Duration::hours(5)), "5h ago");
        assert_eq!(ago(Duration::days(3)), "3d ago");
        assert_eq!(ago(Duration::days(30)), "2025-02-18");
    }

    #[test]
    fn preview_takes_first_non_empty_line() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("a.txt");
        fs::write(&p, "\n   \n  first line  \nsecond").unwrap();
        assert_eq!(preview(&p), "first line");

        fs::write(&p, "x".repeat(100)).unwrap();
        assert_eq!(preview(&p), format!("{}…", "x".repeat(80)));

        fs::write(&p, "\n\n").unwrap();
        assert_eq!(preview(&p), "(empty)");
    }

    #[test]
    fn skips_hidden_entries() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(".drafts")).unwrap();
        fs::write(tmp.path().join(".drafts").join("d.txt"), "draft").unwrap();
        fs::write(tmp.path().join(".hidden"), "h").unwrap();
        fs::write(tmp.path().join("seen.txt"), "s").unwrap();

        let entries = list_entries(tmp.path(), &Local::now());
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["seen.txt"]);
    }
}
