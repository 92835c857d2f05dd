//! Persistence mirror
//!
//! Runs after every applied transition and decides what goes to disk. This
//! is the only place document and config writes originate from; the UI never
//! saves either directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use super::book_config::{self, BookConfig};
use super::dialogs::{Dialogs, NoticeLevel};
use super::store::{AppState, Transition};

/// A disk write planned after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Document { path: PathBuf, text: String },
    Config { folder: PathBuf, config: BookConfig },
}

/// Writes owed for `transition`, judged against the state it produced
pub fn plan(transition: &Transition, state: &AppState) -> Vec<Write> {
    match transition {
        Transition::UpdateText { .. } | Transition::InsertImage { .. } => {
            document_write(state).into_iter().collect()
        }
        Transition::UpdateConfig { patch } => match patch.folder() {
            Some(origin) => config_write(&origin, state).into_iter().collect(),
            None => Vec::new(),
        },
        // These rewrite the chapter list inside the configuration
        Transition::AddChapter { folder, .. }
        | Transition::RenameChapter { folder, .. }
        | Transition::RemoveChapter { folder, .. }
        | Transition::ReorderChapters { folder, .. } => config_write(folder, state).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn document_write(state: &AppState) -> Option<Write> {
    let path = state.document.path.clone()?;
    let folder = state.folder.as_deref()?;
    if !state.document.is_inside(folder) {
        tracing::warn!("Not saving {}: outside {}", path.display(), folder.display());
        return None;
    }
    Some(Write::Document {
        path,
        text: state.document.raw().to_string(),
    })
}

fn config_write(origin: &Path, state: &AppState) -> Option<Write> {
    let folder = state.folder.as_deref()?;
    if origin != folder {
        tracing::warn!("Not saving config from {}: {} is open", origin.display(), folder.display());
        return None;
    }
    Some(Write::Config {
        folder: folder.to_path_buf(),
        config: state.config.clone(),
    })
}

/// Perform a planned write; failures are reported to the user
pub async fn execute(write: Write, dialogs: &impl Dialogs) {
    match write {
        Write::Document { path, text } => {
            if let Err(e) = tokio::fs::write(&path, text).await {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::error!("Failed to save {}: {}", path.display(), e);
                dialogs
                    .notify(NoticeLevel::Error, &format!("Could not save file: {name}"), &e.to_string())
                    .await;
            } else {
                tracing::debug!("Saved {}", path.display());
            }
        }
        Write::Config { folder, config } => {
            if let Err(e) = book_config::save(&folder, &config).await {
                tracing::error!("{}", e);
                dialogs
                    .notify(NoticeLevel::Error, "Could not save book settings", &e.to_string())
                    .await;
            }
        }
    }
}

enum Job {
    Write(Write),
    Flush(oneshot::Sender<()>),
}

/// Performs planned writes one at a time, in the order they were queued
#[derive(Clone)]
pub struct WriteQueue {
    jobs: mpsc::UnboundedSender<Job>,
}

impl WriteQueue {
    /// Start the writer task on `runtime`
    pub fn spawn<D: Dialogs>(runtime: &Handle, dialogs: Arc<D>) -> Self {
        let (jobs, mut queue) = mpsc::unbounded_channel();
        runtime.spawn(async move {
            while let Some(job) = queue.recv().await {
                match job {
                    Job::Write(write) => execute(write, dialogs.as_ref()).await,
                    Job::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { jobs }
    }

    pub fn push(&self, write: Write) {
        if self.jobs.send(Job::Write(write)).is_err() {
            tracing::error!("Writer task stopped; a change was not saved");
        }
    }

    /// Wait until every write queued before this call is on disk.
    /// Reads of chapter files go through here so they never see older text.
    pub async fn flushed(&self) {
        let (done, wait) = oneshot::channel();
        if self.jobs.send(Job::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::book_config::keys;
    use crate::core::dialogs::testing::ScriptedDialogs;
    use crate::core::document::Document;

    fn state_for(folder: &Path, doc_path: Option<PathBuf>) -> AppState {
        AppState {
            folder: Some(folder.to_path_buf()),
            document: Document::new("text", Some("a.md".into()), doc_path),
            config: BookConfig::for_folder(folder),
            ..AppState::default()
        }
    }

    #[test]
    fn test_document_write_requires_active_folder() {
        let folder = Path::new("/books/one");
        let edit = Transition::UpdateText { text: "text".into() };

        let inside = state_for(folder, Some(folder.join("a.md")));
        assert_eq!(plan(&edit, &inside).len(), 1);

        let switched = state_for(Path::new("/books/two"), Some(folder.join("a.md")));
        assert!(plan(&edit, &switched).is_empty());

        let unsaved = state_for(folder, None);
        assert!(plan(&edit, &unsaved).is_empty());
    }

    #[test]
    fn test_config_write_requires_matching_marker() {
        let folder = Path::new("/books/one");
        let state = state_for(folder, None);

        let current = Transition::UpdateConfig {
            patch: BookConfig::for_folder(folder).with(keys::TITLE, "x"),
        };
        assert!(matches!(plan(&current, &state).as_slice(), [Write::Config { .. }]));

        let stale = Transition::UpdateConfig {
            patch: BookConfig::for_folder(Path::new("/books/old")).with(keys::TITLE, "x"),
        };
        assert!(plan(&stale, &state).is_empty());
    }

    #[test]
    fn test_other_transitions_write_nothing() {
        let folder = Path::new("/books/one");
        let state = state_for(folder, Some(folder.join("a.md")));
        for transition in [
            Transition::ToggleExplorer,
            Transition::ToggleSettings,
            Transition::TogglePagination,
            Transition::SelectFolder {
                folder: folder.to_path_buf(),
            },
            Transition::InitConfig {
                folder: folder.to_path_buf(),
                config: BookConfig::new(),
            },
        ] {
            assert!(plan(&transition, &state).is_empty());
        }
    }

    #[tokio::test]
    async fn test_execute_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let dialogs = ScriptedDialogs::default();

        execute(
            Write::Document {
                path: dir.path().join("a.md"),
                text: "# A".into(),
            },
            &dialogs,
        )
        .await;
        execute(
            Write::Config {
                folder: dir.path().to_path_buf(),
                config: BookConfig::for_folder(dir.path()).with(keys::TITLE, "Book"),
            },
            &dialogs,
        )
        .await;

        assert_eq!(std::fs::read_to_string(dir.path().join("a.md")).unwrap(), "# A");
        let yaml = std::fs::read_to_string(dir.path().join(book_config::CONFIG_FILE)).unwrap();
        assert!(yaml.contains("title: Book"));
        assert!(dialogs.errors().is_empty());
    }

    #[tokio::test]
    async fn test_execute_failure_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let dialogs = ScriptedDialogs::default();
        execute(
            Write::Document {
                path: dir.path().join("missing").join("a.md"),
                text: "# A".into(),
            },
            &dialogs,
        )
        .await;
        assert_eq!(dialogs.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_queued_writes_land_before_a_flush_returns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        let dialogs = Arc::new(ScriptedDialogs::default());
        let queue = WriteQueue::spawn(&Handle::current(), Arc::clone(&dialogs));

        for text in ["one", "two", "three"] {
            queue.push(Write::Document {
                path: path.clone(),
                text: text.to_string(),
            });
        }
        queue.flushed().await;

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "three");
        assert!(dialogs.errors().is_empty());
    }
}
