use crate::error::{Result, ScratchError};
use crate::paths;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const FOLDER_LABEL: &str = "ScratchBook";

/// A project document of the form `{ "folders": [ { "path": ..., "name": ... } ] }`.
/// Unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default)]
    pub folders: Vec<ProjectFolder>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFolder {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderOutcome {
    Added,
    AlreadyPresent,
}

impl ProjectData {
    /// A missing file reads as an empty project.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|e| ScratchError::io(path, e))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(self)?;
        crate::writer::overwrite(path, &body)
    }

    pub fn contains_folder(&self, folder: &Path) -> bool {
        let wanted = paths::normalize(folder);
        self.folders
            .iter()
            .any(|f| paths::normalize(Path::new(&f.path)) == wanted)
    }

    pub fn add_folder(&mut self, folder: &Path) -> FolderOutcome {
        if self.contains_folder(folder) {
            return FolderOutcome::AlreadyPresent;
        }
        self.folders.push(ProjectFolder {
            path: folder.to_string_lossy().into_owned(),
            name: Some(FOLDER_LABEL.to_string()),
            extra: Map::new(),
        });
        FolderOutcome::Added
    }
}
