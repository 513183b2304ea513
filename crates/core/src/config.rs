use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "SCRATCHBOOK";

/// Every user-facing setting, as read from the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub scratchbook_folder: String,
    pub auto_save_on_close: bool,
    pub auto_save_on_focus_lost: bool,
    pub auto_detect_extension: bool,
    pub default_extension: String,
    pub filename_format: String,
    pub min_content_length: usize,
    pub organize_by_date: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scratchbook_folder: "scratchbook".to_string(),
            auto_save_on_close: true,
            auto_save_on_focus_lost: false,
            auto_detect_extension: true,
            default_extension: ".txt".to_string(),
            filename_format: "scratch_%Y%m%d_%H%M%S".to_string(),
            min_content_length: 1,
            organize_by_date: false,
        }
    }
}

impl Settings {
    pub fn save_config(&self) -> SaveConfig {
        SaveConfig {
            folder: self.scratchbook_folder.clone(),
            filename_format: self.filename_format.clone(),
            default_extension: self.default_extension.clone(),
            min_content_length: self.min_content_length,
            organize_by_date: self.organize_by_date,
            auto_detect_extension: self.auto_detect_extension,
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// The subset of settings the filename builder reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveConfig {
    pub folder: String,
    pub filename_format: String,
    pub default_extension: String,
    pub min_content_length: usize,
    pub organize_by_date: bool,
    pub auto_detect_extension: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Settings::default().save_config()
    }
}

/// Anything that can hand out fresh settings for a single operation.
pub trait SettingsSource {
    fn load(&self) -> Result<Settings>;
}

impl SettingsSource for Settings {
    fn load(&self) -> Result<Settings> {
        Ok(self.clone())
    }
}

/// Settings layered from defaults, a TOML file and `SCRATCHBOOK_*` variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub path: Option<PathBuf>,
}

impl ConfigFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl SettingsSource for ConfigFile {
    fn load(&self) -> Result<Settings> {
        load(self.path.as_deref())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scratchbook").join("config.toml"))
}

pub fn load(path: Option<&Path>) -> Result<Settings> {
    let defaults = Settings::default();
    let mut settings = config::Config::builder()
        .set_default("scratchbook_folder", defaults.scratchbook_folder)?
        .set_default("auto_save_on_close", defaults.auto_save_on_close)?
        .set_default("auto_save_on_focus_lost", defaults.auto_save_on_focus_lost)?
        .set_default("auto_detect_extension", defaults.auto_detect_extension)?
        .set_default("default_extension", defaults.default_extension)?
        .set_default("filename_format", defaults.filename_format)?
        .set_default("min_content_length", defaults.min_content_length as i64)?
        .set_default("organize_by_date", defaults.organize_by_date)?;

    if let Some(p) = path {
        settings = settings.add_source(config::File::from(p));
    } else if let Some(p) = default_config_path() {
        settings = settings.add_source(config::File::from(p).required(false));
    }
    settings = settings.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::sync::Mutex;

    // `load` reads the process environment; tests that touch it run one at a time.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.scratchbook_folder, "scratchbook");
        assert!(s.auto_save_on_close);
        assert!(!s.auto_save_on_focus_lost);
        assert!(s.auto_detect_extension);
        assert_eq!(s.default_extension, ".txt");
        assert_eq!(s.filename_format, "scratch_%Y%m%d_%H%M%S");
        assert_eq!(s.min_content_length, 1);
        assert!(!s.organize_by_date);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratchbook.toml");
        fs::write(
            &path,
            "scratchbook_folder = \"/tmp/notes\"\norganize_by_date = true\nmin_content_length = 5\n",
        )
        .unwrap();

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let s = load(Some(&path)).unwrap();
        assert_eq!(s.scratchbook_folder, "/tmp/notes");
        assert!(s.organize_by_date);
        assert_eq!(s.min_content_length, 5);
        assert_eq!(s.default_extension, ".txt");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let err = load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn environment_overrides_file_with_typed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratchbook.toml");
        fs::write(
            &path,
            "organize_by_date = false\nmin_content_length = 3\ndefault_extension = \".md\"\n",
        )
        .unwrap();

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var("SCRATCHBOOK_ORGANIZE_BY_DATE", "true");
        env::set_var("SCRATCHBOOK_MIN_CONTENT_LENGTH", "7");
        let loaded = load(Some(&path));
        env::remove_var("SCRATCHBOOK_ORGANIZE_BY_DATE");
        env::remove_var("SCRATCHBOOK_MIN_CONTENT_LENGTH");

        let s = loaded.unwrap();
        assert!(s.organize_by_date);
        assert_eq!(s.min_content_length, 7);
        assert_eq!(s.default_extension, ".md");
    }

    #[test]
    fn settings_render_as_toml() {
        let out = Settings::default().to_toml().unwrap();
        assert!(out.contains("filename_format = \"scratch_%Y%m%d_%H%M%S\""));
    }
}
