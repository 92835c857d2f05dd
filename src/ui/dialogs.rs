//! Native dialogs backed by rfd

use std::path::{Path, PathBuf};

use rfd::{AsyncFileDialog, AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};

use crate::core::chapters::CHAPTER_EXTENSIONS;
use crate::core::dialogs::{Dialogs, FileFilter, NoticeLevel};

/// Export destinations offered by the save dialog
const EXPORT_FORMATS: &[(&str, &[&str])] = &[
    ("PDF (pdf)", &["pdf"]),
    ("EPUB (epub)", &["epub"]),
    ("HTML (html)", &["html"]),
    ("Word (docx)", &["docx"]),
    ("OpenDocument (odt)", &["odt"]),
    ("LaTeX (tex)", &["tex"]),
];

/// Platform file pickers and message boxes
#[derive(Debug, Default)]
pub struct NativeDialogs;

impl Dialogs for NativeDialogs {
    async fn pick_folder(&self) -> Option<PathBuf> {
        AsyncFileDialog::new()
            .set_title("Open book folder")
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    async fn save_file(&self, directory: &Path, default_name: &str, filter: FileFilter) -> Option<PathBuf> {
        let mut dialog = AsyncFileDialog::new()
            .set_directory(directory)
            .set_file_name(default_name);
        match filter {
            FileFilter::Markdown => dialog = dialog.add_filter("Markdown", CHAPTER_EXTENSIONS),
            FileFilter::Export => {
                for (name, extensions) in EXPORT_FORMATS {
                    dialog = dialog.add_filter(*name, *extensions);
                }
            }
        }
        dialog.save_file().await.map(|handle| handle.path().to_path_buf())
    }

    async fn confirm(&self, message: &str) -> bool {
        let answer = AsyncMessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("Confirm")
            .set_description(message)
            .set_buttons(MessageButtons::YesNo)
            .show()
            .await;
        answer == MessageDialogResult::Yes
    }

    async fn notify(&self, level: NoticeLevel, message: &str, detail: &str) {
        let level = match level {
            NoticeLevel::Info => MessageLevel::Info,
            NoticeLevel::Error => MessageLevel::Error,
        };
        AsyncMessageDialog::new()
            .set_level(level)
            .set_title(message)
            .set_description(detail)
            .set_buttons(MessageButtons::Ok)
            .show()
            .await;
    }
}
