//! User-interaction collaborator: pickers, confirmations and notifications
//!
//! The registry and the persistence layer never report failures to their
//! callers; they go through [`Dialogs::notify`] and return a sentinel.

use std::future::Future;
use std::path::{Path, PathBuf};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// File type filter offered by a save dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    /// Chapter files
    Markdown,
    /// Export destinations
    Export,
}

/// Native dialogs, or a scripted stand-in under test
pub trait Dialogs: Send + Sync + 'static {
    /// Ask for a book folder; `None` when cancelled
    fn pick_folder(&self) -> impl Future<Output = Option<PathBuf>> + Send;

    /// Ask for a destination file; `None` when cancelled
    fn save_file(
        &self,
        directory: &Path,
        default_name: &str,
        filter: FileFilter,
    ) -> impl Future<Output = Option<PathBuf>> + Send;

    /// Yes/no question; `true` only on an explicit yes
    fn confirm(&self, message: &str) -> impl Future<Output = bool> + Send;

    /// Show a message to the user
    fn notify(&self, level: NoticeLevel, message: &str, detail: &str) -> impl Future<Output = ()> + Send;
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Dialogs that answer from a script and record notifications
    #[derive(Default)]
    pub struct ScriptedDialogs {
        pub folder: Option<PathBuf>,
        pub save_answers: Mutex<VecDeque<Option<PathBuf>>>,
        pub confirm_answer: bool,
        pub notices: Mutex<Vec<(NoticeLevel, String)>>,
    }

    impl ScriptedDialogs {
        pub fn saving(answers: impl IntoIterator<Item = PathBuf>) -> Self {
            Self {
                save_answers: Mutex::new(answers.into_iter().map(Some).collect()),
                ..Self::default()
            }
        }

        pub fn confirming(answer: bool) -> Self {
            Self {
                confirm_answer: answer,
                ..Self::default()
            }
        }

        pub fn errors(&self) -> Vec<String> {
            self.notices
                .lock()
                .unwrap()
                .iter()
                .filter(|(level, _)| *level == NoticeLevel::Error)
                .map(|(_, message)| message.clone())
                .collect()
        }
    }

    impl Dialogs for ScriptedDialogs {
        async fn pick_folder(&self) -> Option<PathBuf> {
            self.folder.clone()
        }

        async fn save_file(&self, _directory: &Path, _default_name: &str, _filter: FileFilter) -> Option<PathBuf> {
            self.save_answers.lock().unwrap().pop_front().flatten()
        }

        async fn confirm(&self, _message: &str) -> bool {
            self.confirm_answer
        }

        async fn notify(&self, level: NoticeLevel, message: &str, detail: &str) {
            self.notices
                .lock()
                .unwrap()
                .push((level, format!("{message}: {detail}")));
        }
    }
}
