//! Folder resolution and containment checks for the scratch directory.

use crate::error::{Result, ScratchError};
use regex::{Captures, Regex};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_FOLDER_NAME: &str = "scratchbook";

/// Resolves the configured folder to an absolute path.
///
/// An empty value means `~/scratchbook`. `~`, `$VAR`, `${VAR}` and `%VAR%`
/// are expanded, and anything still relative is placed under `home`.
pub fn resolve_folder(raw: &str, home: Option<&Path>) -> Result<PathBuf> {
    let home_dir = || home.map(Path::to_path_buf).ok_or(ScratchError::HomeNotFound);
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(home_dir()?.join(DEFAULT_FOLDER_NAME));
    }

    let expanded = PathBuf::from(expand(raw, home));
    if expanded.is_absolute() {
        Ok(normalize(&expanded))
    } else {
        Ok(normalize(&home_dir()?.join(expanded)))
    }
}

/// Same as [`resolve_folder`] with the current user's home directory.
pub fn resolve_user_folder(raw: &str) -> Result<PathBuf> {
    resolve_folder(raw, dirs::home_dir().as_deref())
}

pub fn expand(raw: &str, home: Option<&Path>) -> String {
    expand_with(raw, home, |name| std::env::var(name).ok())
}

/// Expands a leading `~` and environment variables. Unknown variables are
/// left as written.
pub fn expand_with(raw: &str, home: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> String {
    static VARS: OnceLock<Regex> = OnceLock::new();
    let vars = VARS.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_]\w*)\}|\$([A-Za-z_]\w*)|%([A-Za-z_]\w*)%")
            .expect("variable pattern must compile")
    });

    let with_home = match (home, raw.strip_prefix('~')) {
        (Some(h), Some(rest)) if rest.is_empty() => h.to_string_lossy().into_owned(),
        (Some(h), Some(rest)) if rest.starts_with('/') || rest.starts_with('\\') => {
            format!("{}{}", h.to_string_lossy(), rest)
        }
        _ => raw.to_string(),
    };

    vars.replace_all(&with_home, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        lookup(name).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

/// Lexically removes `.` and resolves `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `path` is `folder` itself or lies somewhere beneath it.
pub fn is_within(path: &Path, folder: &Path) -> bool {
    normalize(path).starts_with(normalize(folder))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "NOTES" => Some("/data/notes".to_string()),
            "USER" => Some("ann".to_string()),
            _ => None,
        }
    }

    #[test]
    fn empty_folder_defaults_under_home() {
        let home = Path::new("/home/ann");
        assert_eq!(
            resolve_folder("", Some(home)).unwrap(),
            PathBuf::from("/home/ann/scratchbook")
        );
    }

    #[test]
    fn relative_folder_goes_under_home() {
        let home = Path::new("/home/ann");
        assert_eq!(
            resolve_folder("scratchbook", Some(home)).unwrap(),
            PathBuf::from("/home/ann/scratchbook")
        );
        assert_eq!(
            resolve_folder("~/notes/./scratch", Some(home)).unwrap(),
            PathBuf::from("/home/ann/notes/scratch")
        );
    }

    #[test]
    fn absolute_folder_is_kept() {
        assert_eq!(
            resolve_folder("/var/tmp/scratch", None).unwrap(),
            PathBuf::from("/var/tmp/scratch")
        );
    }

    #[test]
    fn relative_folder_without_home_fails() {
        assert!(matches!(
            resolve_folder("scratch", None),
            Err(ScratchError::HomeNotFound)
        ));
    }

    #[test]
    fn expands_variables_in_all_styles() {
        let home = Path::new("/home/ann");
        assert_eq!(expand_with("$NOTES/x", Some(home), lookup), "/data/notes/x");
        assert_eq!(expand_with("${NOTES}/x", Some(home), lookup), "/data/notes/x");
        assert_eq!(expand_with("%NOTES%/x", Some(home), lookup), "/data/notes/x");
        assert_eq!(expand_with("~/$USER", Some(home), lookup), "/home/ann/ann");
        assert_eq!(expand_with("$MISSING/x", Some(home), lookup), "$MISSING/x");
        assert_eq!(expand_with("~other/x", Some(home), lookup), "~other/x");
    }

    #[test]
    fn containment_uses_whole_components() {
        let folder = Path::new("/home/ann/scratchbook");
        assert!(is_within(Path::new("/home/ann/scratchbook/a.txt"), folder));
        assert!(is_within(Path::new("/home/ann/scratchbook/2025/02/b.md"), folder));
        assert!(!is_within(Path::new("/home/ann/scratchbook-old/a.txt"), folder));
        assert!(!is_within(Path::new("/home/ann/scratchbook/../x.txt"), folder));
    }
}
