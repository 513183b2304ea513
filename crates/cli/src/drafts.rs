//! On-disk stand-ins for untitled buffers.
//!
//! A draft lives under `<scratch folder>/.drafts/` until it is saved into the
//! scratch book, at which point it is removed. The folder is hidden so browse
//! never lists it.

use anyhow::{Context, Result};
use scratchbook_core::session::ScratchView;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DRAFTS_DIR: &str = ".drafts";

#[derive(Debug)]
pub struct DraftView {
    id: u64,
    draft: PathBuf,
    text: String,
    target: Option<PathBuf>,
    name: String,
    scratch: bool,
}

impl DraftView {
    /// Loads the draft's current text. A draft that cannot be read is an
    /// error rather than an empty buffer, so it is never discarded unread.
    pub fn open(id: u64, draft: &Path) -> Result<Self> {
        let text = fs::read_to_string(draft)
            .with_context(|| format!("Failed to read draft {:?}", draft))?;
        let name = draft
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            id,
            draft: draft.to_path_buf(),
            text,
            target: None,
            name,
            scratch: false,
        })
    }

    pub fn draft_path(&self) -> &Path {
        &self.draft
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_scratch(&self) -> bool {
        self.scratch
    }
}

impl ScratchView for DraftView {
    fn id(&self) -> u64 {
        self.id
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn file_name(&self) -> Option<PathBuf> {
        self.target.clone()
    }

    fn retarget(&mut self, path: &Path) {
        self.target = Some(path.to_path_buf());
    }

    fn set_scratch(&mut self, scratch: bool) {
        self.scratch = scratch;
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn close(self) {
        match fs::remove_file(&self.draft) {
            Ok(()) => debug!(draft = %self.draft.display(), "removed draft"),
            Err(e) => warn!(draft = %self.draft.display(), error = %e, "could not remove draft"),
        }
    }
}

pub fn drafts_dir(folder: &Path) -> PathBuf {
    folder.join(DRAFTS_DIR)
}

/// Creates an empty draft file and returns its path.
pub fn create_draft(folder: &Path) -> Result<PathBuf> {
    let dir = drafts_dir(folder);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let (_file, path) = tempfile::Builder::new()
        .prefix("draft-")
        .suffix(".txt")
        .tempfile_in(&dir)
        .with_context(|| format!("Failed to create a draft in {:?}", dir))?
        .keep()
        .context("Failed to keep draft file")?;
    Ok(path)
}

/// Every draft still waiting to be saved, oldest name first.
pub fn pending_drafts(folder: &Path) -> Result<Vec<DraftView>> {
    let dir = drafts_dir(folder);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("Failed to list {:?}", dir))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    paths
        .iter()
        .enumerate()
        .map(|(i, p)| DraftView::open(i as u64, p))
        .collect()
}
