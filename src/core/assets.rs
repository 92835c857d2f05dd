//! Images pasted into a chapter

use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::dialogs::{Dialogs, NoticeLevel};
use super::error::FileSetError;

/// Folder inside the book where pasted images go
pub const ASSETS_DIR: &str = "assets";

/// Copy the image at `source` into the book's assets folder under a random
/// name. Returns the path to reference from markdown, relative to the book.
pub async fn paste_image(dialogs: &impl Dialogs, folder: &Path, source: &Path) -> Option<String> {
    match store_image(folder, source).await {
        Ok(relative) => {
            tracing::info!("Stored image {} as {}", source.display(), relative);
            Some(relative)
        }
        Err(e) => {
            tracing::error!("Failed to store image: {}", e);
            dialogs
                .notify(NoticeLevel::Error, "Could not paste image", &e.to_string())
                .await;
            None
        }
    }
}

async fn store_image(folder: &Path, source: &Path) -> Result<String, FileSetError> {
    let bytes = tokio::fs::read(source)
        .await
        .map_err(FileSetError::io("Could not read", source))?;
    let format = image::guess_format(&bytes).map_err(|_| FileSetError::NotAnImage {
        path: source.to_path_buf(),
    })?;
    let extension = format.extensions_str().first().copied().unwrap_or("img");

    let assets = folder.join(ASSETS_DIR);
    tokio::fs::create_dir_all(&assets)
        .await
        .map_err(FileSetError::io("Could not create", &assets))?;

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let target: PathBuf = assets.join(&file_name);
    tokio::fs::write(&target, &bytes)
        .await
        .map_err(FileSetError::io("Could not write", &target))?;
    Ok(format!("{ASSETS_DIR}/{file_name}"))
}

/// Markdown image reference for a stored asset
pub fn image_markdown(relative: &str) -> String {
    format!("![]({relative})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialogs::testing::ScriptedDialogs;

    // Smallest valid PNG header is enough for format detection
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[tokio::test]
    async fn test_paste_png_normalizes_extension() {
        let book = tempfile::tempdir().unwrap();
        let source = book.path().join("clipboard.dat");
        std::fs::write(&source, PNG_MAGIC).unwrap();

        let dialogs = ScriptedDialogs::default();
        let relative = paste_image(&dialogs, book.path(), &source).await.unwrap();
        assert!(relative.starts_with("assets/"));
        assert!(relative.ends_with(".png"));
        assert_eq!(std::fs::read(book.path().join(&relative)).unwrap(), PNG_MAGIC);

        let again = paste_image(&dialogs, book.path(), &source).await.unwrap();
        assert_ne!(relative, again);
    }

    #[tokio::test]
    async fn test_paste_non_image_fails() {
        let book = tempfile::tempdir().unwrap();
        let source = book.path().join("notes.txt");
        std::fs::write(&source, "just text").unwrap();

        let dialogs = ScriptedDialogs::default();
        assert_eq!(paste_image(&dialogs, book.path(), &source).await, None);
        assert_eq!(dialogs.errors().len(), 1);
        assert!(!book.path().join(ASSETS_DIR).exists());
    }

    #[test]
    fn test_image_markdown() {
        assert_eq!(image_markdown("assets/x.png"), "![](assets/x.png)");
    }
}
