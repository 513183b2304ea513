//! Editor bindings: buffer-close and focus-lost handlers plus the commands.
//!
//! The host supplies buffers through [`ScratchView`]. Settings are reloaded
//! from the [`SettingsSource`] on every call.

use crate::browse::{self, BrowseEntry};
use crate::config::{Settings, SettingsSource};
use crate::error::Result;
use crate::project::{FolderOutcome, ProjectData};
use crate::save::{self, SaveOutcome, SkipReason};
use crate::{naming, paths, writer};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SCRATCH_NAME: &str = "Scratch";

/// An editor buffer as seen by the scratch book.
pub trait ScratchView {
    fn id(&self) -> u64;
    fn text(&self) -> String;
    /// `None` for an untitled buffer.
    fn file_name(&self) -> Option<PathBuf>;
    /// Points the buffer at a file on disk so later saves update it.
    fn retarget(&mut self, path: &Path);
    /// A scratch buffer closes without a "save changes?" prompt.
    fn set_scratch(&mut self, scratch: bool);
    fn set_name(&mut self, name: &str);
    fn close(self)
    where
        Self: Sized,
    {
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CloseSummary {
    pub closed: usize,
    pub saved: Vec<PathBuf>,
    pub failed: usize,
}

pub struct ScratchBook<S> {
    settings: S,
}

impl<S: SettingsSource> ScratchBook<S> {
    pub fn new(settings: S) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> Result<Settings> {
        self.settings.load()
    }

    pub fn folder(&self) -> Result<PathBuf> {
        folder_of(&self.settings()?)
    }

    pub fn is_scratch_file(&self, path: &Path) -> Result<bool> {
        Ok(paths::is_within(path, &self.folder()?))
    }

    /// Manual save: first save creates a file and links the view to it, later
    /// saves rewrite that file in place.
    pub fn save_view<V: ScratchView>(&self, view: &mut V, now: &DateTime<Local>) -> Result<SaveOutcome> {
        let settings = self.settings()?;
        save_linked_or_new(&settings, view, now)
    }

    pub fn on_pre_close<V: ScratchView>(&self, view: &mut V, now: &DateTime<Local>) -> Result<SaveOutcome> {
        let settings = self.settings()?;
        let enabled = settings.auto_save_on_close;
        auto_save(&settings, enabled, view, now)
    }

    pub fn on_deactivated<V: ScratchView>(&self, view: &mut V, now: &DateTime<Local>) -> Result<SaveOutcome> {
        let settings = self.settings()?;
        let enabled = settings.auto_save_on_focus_lost;
        auto_save(&settings, enabled, view, now)
    }

    /// Saves then closes every untitled or scratch-linked view. Views that fail
    /// to save stay open so their text is not lost.
    pub fn close_all<V: ScratchView>(&self, views: &mut Vec<V>, now: &DateTime<Local>) -> Result<CloseSummary> {
        let settings = self.settings()?;
        let folder = folder_of(&settings)?;
        let mut summary = CloseSummary::default();
        let mut kept = Vec::with_capacity(views.len());

        for mut view in views.drain(..) {
            let candidate = view
                .file_name()
                .map_or(true, |f| paths::is_within(&f, &folder));
            if !candidate {
                kept.push(view);
                continue;
            }
            match save_linked_or_new(&settings, &mut view, now) {
                Ok(outcome) => {
                    if let Some(path) = outcome.path() {
                        summary.saved.push(path.clone());
                    }
                    view.set_scratch(true);
                    view.close();
                    summary.closed += 1;
                }
                Err(e) => {
                    warn!(view = view.id(), error = %e, "could not save scratch view, leaving it open");
                    summary.failed += 1;
                    kept.push(view);
                }
            }
        }

        *views = kept;
        info!(closed = summary.closed, failed = summary.failed, "closed scratch views");
        Ok(summary)
    }

    /// Recursive listing of saved files, newest first.
    pub fn browse(&self, now: &DateTime<Local>) -> Result<Vec<BrowseEntry>> {
        let folder = self.folder()?;
        naming::ensure_dir(&folder)?;
        Ok(browse::list_entries(&folder, now))
    }

    /// Adds the scratch folder to a project's folder list once.
    pub fn open_folder(&self, project: &mut ProjectData) -> Result<FolderOutcome> {
        let folder = self.folder()?;
        naming::ensure_dir(&folder)?;
        let outcome = project.add_folder(&folder);
        debug!(folder = %folder.display(), ?outcome, "open folder");
        Ok(outcome)
    }
}

pub fn prepare_new<V: ScratchView>(view: &mut V) {
    view.set_scratch(true);
    view.set_name(SCRATCH_NAME);
}

pub fn new_scratch<V: ScratchView + Default>() -> V {
    let mut view = V::default();
    prepare_new(&mut view);
    view
}

fn auto_save<V: ScratchView>(
    settings: &Settings,
    enabled: bool,
    view: &mut V,
    now: &DateTime<Local>,
) -> Result<SaveOutcome> {
    if !enabled {
        return Ok(SaveOutcome::Skipped {
            reason: SkipReason::AutoSaveDisabled,
        });
    }
    let folder = folder_of(settings)?;
    match view.file_name() {
        None => save_linked_or_new(settings, view, now),
        // Linked scratch files are written as-is, even when emptied.
        Some(existing) if paths::is_within(&existing, &folder) => rewrite(view, &existing),
        Some(_) => Ok(SaveOutcome::Skipped {
            reason: SkipReason::NotScratch,
        }),
    }
}

fn folder_of(settings: &Settings) -> Result<PathBuf> {
    paths::resolve_user_folder(&settings.scratchbook_folder)
}

fn save_linked_or_new<V: ScratchView>(
    settings: &Settings,
    view: &mut V,
    now: &DateTime<Local>,
) -> Result<SaveOutcome> {
    let config = settings.save_config();
    let text = view.text();
    if !save::meets_minimum(&config, &text) {
        return Ok(SaveOutcome::Skipped {
            reason: SkipReason::BelowMinimum,
        });
    }

    let folder = folder_of(settings)?;
    match view.file_name() {
        Some(existing) if paths::is_within(&existing, &folder) => rewrite(view, &existing),
        Some(_) => Ok(SaveOutcome::Skipped {
            reason: SkipReason::NotScratch,
        }),
        None => {
            let outcome = save::save_text(&config, &text, now)?;
            if let SaveOutcome::Saved { path, .. } = &outcome {
                view.retarget(path);
                view.set_scratch(true);
            }
            Ok(outcome)
        }
    }
}

fn rewrite<V: ScratchView>(view: &mut V, path: &Path) -> Result<SaveOutcome> {
    writer::overwrite(path, &view.text())?;
    view.set_scratch(true);
    info!(path = %path.display(), "updated scratch file");
    Ok(SaveOutcome::Updated {
        path: path.to_path_buf(),
    })
}
