//! Application state and the transitions that change it
//!
//! [`Store::dispatch`] computes a complete new [`AppState`] from the old one
//! and swaps it in, then asks the persistence mirror what to write. Nothing
//! here touches the disk. Work that needs I/O (loading the next chapter after
//! a rename or delete) comes back as a [`Request`] for the caller to run and
//! feed back as a fresh transition.
//!
//! Transitions produced by async work carry the folder they were started
//! for. A transition whose folder is no longer the active one is dropped.

use std::path::{Path, PathBuf};

use super::assets;
use super::book_config::{keys, BookConfig};
use super::chapters::{self, ChapterEntry, LoadedChapter};
use super::document::Document;
use super::front_matter;
use super::mirror::{self, Write};

/// Single source of truth for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Open book folder
    pub folder: Option<PathBuf>,
    /// Chapter list, in book order
    pub chapters: Vec<ChapterEntry>,
    /// Chapter in the editor
    pub document: Document,
    pub config: BookConfig,
    pub explorer_open: bool,
    pub settings_open: bool,
    pub paginated: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            folder: None,
            chapters: Vec::new(),
            document: Document::placeholder(),
            config: BookConfig::new(),
            explorer_open: true,
            settings_open: false,
            paginated: false,
        }
    }
}

impl AppState {
    /// Chapter names in list order
    pub fn chapter_names(&self) -> Vec<String> {
        self.chapters.iter().map(|entry| entry.name.clone()).collect()
    }

    fn chapter_index(&self, name: &str) -> Option<usize> {
        self.chapters.iter().position(|entry| entry.name == name)
    }

    fn is_active(&self, folder: &Path) -> bool {
        self.folder.as_deref() == Some(folder)
    }

    fn is_open(&self, name: &str) -> bool {
        self.document.file_name.as_deref() == Some(name)
    }

    /// Make the config's chapter list match the entries
    fn sync_input_files(&mut self) {
        let names = self.chapter_names();
        self.config.set_input_files(names);
    }
}

/// A discrete change to [`AppState`]
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Switch to a newly chosen folder, clearing everything from the last one
    SelectFolder { folder: PathBuf },
    /// Replace folder and chapter list
    InitFileList { folder: PathBuf, chapters: Vec<ChapterEntry> },
    /// Open a chapter in the editor
    InitDocument { chapter: LoadedChapter },
    /// Replace the configuration
    InitConfig { folder: PathBuf, config: BookConfig },
    /// Merge a partial configuration tagged with its folder
    UpdateConfig { patch: BookConfig },
    /// Editor text changed
    UpdateText { text: String },
    /// An image was stored for the chapter at `path`; append a reference to it
    InsertImage { path: PathBuf, reference: String },
    /// A chapter file was created; it goes after the open chapter
    AddChapter { folder: PathBuf, entry: ChapterEntry },
    /// A chapter file was renamed; `entry` describes the new file
    RenameChapter {
        folder: PathBuf,
        old_name: String,
        entry: ChapterEntry,
    },
    /// A chapter file was deleted
    RemoveChapter { folder: PathBuf, name: String },
    /// Move a chapter within the list
    ReorderChapters { folder: PathBuf, from: usize, to: usize },
    ToggleSettings,
    ToggleExplorer,
    TogglePagination,
}

impl Transition {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Transition::SelectFolder { .. } => "select-folder",
            Transition::InitFileList { .. } => "init-file-list",
            Transition::InitDocument { .. } => "init-document",
            Transition::InitConfig { .. } => "init-config",
            Transition::UpdateConfig { .. } => "update-config",
            Transition::UpdateText { .. } => "update-text",
            Transition::InsertImage { .. } => "insert-image",
            Transition::AddChapter { .. } => "add-chapter",
            Transition::RenameChapter { .. } => "rename-chapter",
            Transition::RemoveChapter { .. } => "remove-chapter",
            Transition::ReorderChapters { .. } => "reorder-chapters",
            Transition::ToggleSettings => "toggle-settings",
            Transition::ToggleExplorer => "toggle-explorer",
            Transition::TogglePagination => "toggle-pagination",
        }
    }
}

/// Follow-up work requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Load a chapter and dispatch [`Transition::InitDocument`]
    OpenChapter { folder: PathBuf, name: String },
}

/// What a dispatch did
#[derive(Debug, Default, PartialEq)]
pub struct Outcome {
    /// False when the transition was dropped and the state is unchanged
    pub applied: bool,
    /// Disk writes planned by the persistence mirror
    pub writes: Vec<Write>,
    pub requests: Vec<Request>,
}

/// Owner of the application state
#[derive(Debug, Default)]
pub struct Store {
    state: AppState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply one transition atomically
    pub fn dispatch(&mut self, transition: Transition) -> Outcome {
        match reduce(&self.state, &transition) {
            Ok((state, requests)) => {
                self.state = state;
                let writes = mirror::plan(&transition, &self.state);
                tracing::debug!(
                    "Applied {} ({} writes, {} requests)",
                    transition.name(),
                    writes.len(),
                    requests.len()
                );
                Outcome {
                    applied: true,
                    writes,
                    requests,
                }
            }
            Err(reason) => {
                tracing::warn!("Dropped {}: {}", transition.name(), reason);
                Outcome::default()
            }
        }
    }
}

type Reduced = Result<(AppState, Vec<Request>), String>;

fn reduce(state: &AppState, transition: &Transition) -> Reduced {
    let mut next = state.clone();
    let mut requests = Vec::new();

    match transition {
        Transition::SelectFolder { folder } => {
            next = AppState {
                folder: Some(folder.clone()),
                explorer_open: state.explorer_open,
                paginated: state.paginated,
                ..AppState::default()
            };
        }
        Transition::InitFileList { folder, chapters } => {
            ensure_active_or_unset(state, folder)?;
            next.folder = Some(folder.clone());
            next.chapters = chapters.clone();
            next.sync_input_files();
        }
        Transition::InitDocument { chapter } => {
            if let Some(active) = &state.folder {
                if !chapter.path.starts_with(active) {
                    return Err(format!("{} is outside the open folder", chapter.path.display()));
                }
            }
            next.document = Document::new(
                chapter.raw.clone(),
                Some(chapter.name.clone()),
                Some(chapter.path.clone()),
            );
        }
        Transition::InitConfig { folder, config } => {
            ensure_active_or_unset(state, folder)?;
            next.folder = Some(folder.clone());
            next.config = config.clone();
            next.config.set(keys::CURRENT_DIR, folder.to_string_lossy().into_owned());
            if !next.chapters.is_empty() {
                next.sync_input_files();
            }
        }
        Transition::UpdateConfig { patch } => {
            match patch.folder() {
                Some(origin) if state.is_active(&origin) => {}
                Some(origin) => return Err(format!("stale update from {}", origin.display())),
                None => return Err("update carries no folder marker".to_string()),
            }
            let mut patch = patch.clone();
            // The chapter order only changes through chapter transitions
            if patch.remove(keys::INPUT_FILES).is_some() {
                tracing::warn!("Ignoring {} in a config update", keys::INPUT_FILES);
            }
            patch.remove(keys::CURRENT_DIR);
            next.config.merge(&patch);
        }
        Transition::UpdateText { text } => {
            next.document.set_raw(text.clone());
            refresh_open_entry(&mut next);
        }
        Transition::InsertImage { path, reference } => {
            if state.document.path.as_ref() != Some(path) {
                return Err(format!("{} is no longer open", path.display()));
            }
            let mut body = state.document.body().to_string();
            if !body.is_empty() && !body.ends_with('\n') {
                body.push('\n');
            }
            body.push_str(&assets::image_markdown(reference));
            body.push('\n');
            next.document.set_raw(front_matter::encode(state.document.front_matter(), &body));
            refresh_open_entry(&mut next);
        }
        Transition::AddChapter { folder, entry } => {
            ensure_active(state, folder)?;
            if state.chapter_index(&entry.name).is_some() {
                return Err(format!("{} is already in the book", entry.name));
            }
            let at = state
                .document
                .file_name
                .as_deref()
                .and_then(|open| state.chapter_index(open))
                .map_or(state.chapters.len(), |open| open + 1);
            next.chapters.insert(at, entry.clone());
            next.sync_input_files();
            requests.push(Request::OpenChapter {
                folder: folder.clone(),
                name: entry.name.clone(),
            });
        }
        Transition::RenameChapter {
            folder,
            old_name,
            entry,
        } => {
            ensure_active(state, folder)?;
            let index = state
                .chapter_index(old_name)
                .ok_or_else(|| format!("{old_name} is not in the book"))?;
            next.chapters[index] = entry.clone();
            next.sync_input_files();
            if state.is_open(old_name) {
                // Point the editor at the new file right away so no edit
                // lands on the old path, then reload its content.
                next.document.file_name = Some(entry.name.clone());
                next.document.path = Some(folder.join(&entry.name));
                requests.push(Request::OpenChapter {
                    folder: folder.clone(),
                    name: entry.name.clone(),
                });
            }
        }
        Transition::RemoveChapter { folder, name } => {
            ensure_active(state, folder)?;
            let index = state
                .chapter_index(name)
                .ok_or_else(|| format!("{name} is not in the book"))?;
            next.chapters.remove(index);
            next.sync_input_files();
            if state.is_open(name) {
                next.document = Document::placeholder();
                if !next.chapters.is_empty() {
                    let successor = index.min(next.chapters.len() - 1);
                    requests.push(Request::OpenChapter {
                        folder: folder.clone(),
                        name: next.chapters[successor].name.clone(),
                    });
                }
            }
        }
        Transition::ReorderChapters { folder, from, to } => {
            ensure_active(state, folder)?;
            let len = state.chapters.len();
            if *from >= len || *to >= len {
                return Err(format!("move {from} -> {to} out of range for {len} chapters"));
            }
            if from == to {
                return Err("chapter did not move".to_string());
            }
            next.chapters = chapters::reorder(&state.chapters, *from, *to);
            next.sync_input_files();
        }
        Transition::ToggleSettings => next.settings_open = !state.settings_open,
        Transition::ToggleExplorer => next.explorer_open = !state.explorer_open,
        Transition::TogglePagination => next.paginated = !state.paginated,
    }

    Ok((next, requests))
}

/// Re-derive the list entry of the open chapter from the editor text
fn refresh_open_entry(state: &mut AppState) {
    let Some(name) = state.document.file_name.clone() else {
        return;
    };
    let entry = ChapterEntry::from_content(name.clone(), state.document.raw());
    if let Some(slot) = state.chapters.iter_mut().find(|slot| slot.name == name) {
        *slot = entry;
    }
}

fn ensure_active(state: &AppState, folder: &Path) -> Result<(), String> {
    if state.is_active(folder) {
        Ok(())
    } else {
        Err(format!("{} is not the open folder", folder.display()))
    }
}

fn ensure_active_or_unset(state: &AppState, folder: &Path) -> Result<(), String> {
    match &state.folder {
        None => Ok(()),
        Some(_) => ensure_active(state, folder),
    }
}
