//! Chapter file registry for the open book folder
//!
//! Every operation that touches the disk reports failures through
//! [`Dialogs::notify`] and hands back `None`/`false`, meaning "nothing
//! happened". Callers leave their state untouched on a sentinel.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use super::dialogs::{Dialogs, FileFilter, NoticeLevel};
use super::error::FileSetError;
use super::front_matter;
use super::text;

/// Extensions recognized as chapter files
pub const CHAPTER_EXTENSIONS: &[&str] = &["md", "txt", "markdown"];

/// One row of the chapter list
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterEntry {
    /// File name relative to the book folder
    pub name: String,
    /// Start of the raw file content
    pub preview: String,
    /// Formatted word count of the body
    pub word_count: String,
}

impl ChapterEntry {
    pub fn from_content(name: impl Into<String>, raw: &str) -> Self {
        let body = front_matter::decode(raw).body;
        Self {
            name: name.into(),
            preview: text::truncate(raw),
            word_count: text::format_count(text::count_words(&body)),
        }
    }
}

/// A folder chosen by the user and the chapter files found in it
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedFolder {
    pub folder: PathBuf,
    pub file_names: Vec<String>,
}

/// Raw content of one chapter, ready to become the active document
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedChapter {
    pub name: String,
    pub path: PathBuf,
    pub raw: String,
}

/// Whether `path` names a chapter file by extension
pub fn is_chapter_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| CHAPTER_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Chapter files directly inside `folder`, sorted by name.
/// Directories and symlinks are skipped.
pub fn list_chapters(folder: &Path) -> Result<Vec<String>, FileSetError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_chapter_file(entry.path()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Ask for a book folder and list its chapter files
pub async fn open_folder(dialogs: &impl Dialogs) -> Option<OpenedFolder> {
    let folder = dialogs.pick_folder().await?;
    match list_chapters(&folder) {
        Ok(file_names) => {
            tracing::info!("Opened book folder {} ({} chapters)", folder.display(), file_names.len());
            Some(OpenedFolder { folder, file_names })
        }
        Err(e) => {
            tracing::error!("Failed to list {}: {}", folder.display(), e);
            dialogs
                .notify(NoticeLevel::Error, "Could not open folder", &e.to_string())
                .await;
            None
        }
    }
}

/// Build list entries for `names`. Unreadable files are left out.
pub async fn load_entries(folder: &Path, names: &[String]) -> Vec<ChapterEntry> {
    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        match tokio::fs::read_to_string(folder.join(name)).await {
            Ok(raw) => entries.push(ChapterEntry::from_content(name.clone(), &raw)),
            Err(e) => tracing::warn!("Skipping chapter {}: {}", name, e),
        }
    }
    entries
}

/// Read one chapter for the editor
pub async fn load_chapter(dialogs: &impl Dialogs, folder: &Path, name: &str) -> Option<LoadedChapter> {
    let path = folder.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(raw) => Some(LoadedChapter {
            name: name.to_string(),
            path,
            raw,
        }),
        Err(e) => {
            let message = format!("Could not load file: {name}");
            tracing::error!("{}: {}", message, e);
            dialogs.notify(NoticeLevel::Error, &message, &e.to_string()).await;
            None
        }
    }
}

/// Ask for a new chapter name and create it with a heading line.
/// Returns the new file name.
pub async fn create_file(dialogs: &impl Dialogs, folder: &Path) -> Option<String> {
    let chosen = dialogs.save_file(folder, "Untitled.md", FileFilter::Markdown).await?;
    match create_chapter(folder, &chosen).await {
        Ok(name) => {
            tracing::info!("Created chapter {}", name);
            Some(name)
        }
        Err(e) => {
            tracing::error!("Failed to create chapter: {}", e);
            dialogs
                .notify(NoticeLevel::Error, "Could not create file", &e.to_string())
                .await;
            None
        }
    }
}

async fn create_chapter(folder: &Path, chosen: &Path) -> Result<String, FileSetError> {
    let (path, name) = resolve_in_folder(folder, chosen)?;
    let heading = Path::new(&name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());

    // Never clobber an existing chapter
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(FileSetError::io("Could not create", &path))?;
    file.write_all(format!("# {heading}\n").as_bytes())
        .await
        .map_err(FileSetError::io("Could not write", &path))?;
    file.flush().await.map_err(FileSetError::io("Could not write", &path))?;
    Ok(name)
}

/// Ask for a new name for `old_name` and rename it. Returns the new file name.
pub async fn rename_file(dialogs: &impl Dialogs, folder: &Path, old_name: &str) -> Option<String> {
    let chosen = dialogs.save_file(folder, old_name, FileFilter::Markdown).await?;
    match rename_chapter(folder, old_name, &chosen).await {
        Ok(Some(name)) => {
            tracing::info!("Renamed chapter {} to {}", old_name, name);
            Some(name)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::error!("Failed to rename {}: {}", old_name, e);
            dialogs
                .notify(NoticeLevel::Error, &format!("Could not rename file: {old_name}"), &e.to_string())
                .await;
            None
        }
    }
}

async fn rename_chapter(folder: &Path, old_name: &str, chosen: &Path) -> Result<Option<String>, FileSetError> {
    let (new_path, new_name) = resolve_in_folder(folder, chosen)?;
    if new_name == old_name {
        return Ok(None);
    }
    if tokio::fs::try_exists(&new_path).await.unwrap_or(false) {
        return Err(FileSetError::Io {
            action: "Could not rename to",
            path: new_path,
            source: ErrorKind::AlreadyExists.into(),
        });
    }
    let old_path = folder.join(old_name);
    tokio::fs::rename(&old_path, &new_path)
        .await
        .map_err(FileSetError::io("Could not rename", &old_path))?;
    Ok(Some(new_name))
}

/// Delete a chapter after the user confirms. Declining is not an error.
pub async fn delete_file(dialogs: &impl Dialogs, folder: &Path, name: &str) -> bool {
    let question = format!("Are you sure you want to delete {name}? This action can not be undone.");
    if !dialogs.confirm(&question).await {
        return false;
    }
    let path = folder.join(name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            tracing::info!("Deleted chapter {}", path.display());
            true
        }
        Err(e) => {
            tracing::error!("Failed to delete {}: {}", path.display(), e);
            dialogs
                .notify(NoticeLevel::Error, &format!("Could not delete file: {name}"), &e.to_string())
                .await;
            false
        }
    }
}

/// Move the element at `from` to `to`, keeping the relative order of the rest.
/// Out-of-range indices leave the order unchanged.
pub fn reorder<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut result = items.to_vec();
    if from >= result.len() || to >= result.len() {
        return result;
    }
    let moved = result.remove(from);
    result.insert(to, moved);
    result
}

/// Resolve a dialog answer to a file directly inside `folder`.
/// Relative answers are taken relative to the folder.
fn resolve_in_folder(folder: &Path, chosen: &Path) -> Result<(PathBuf, String), FileSetError> {
    let outside = || FileSetError::OutsideFolder {
        folder: folder.to_path_buf(),
    };
    let resolved = normalize(&folder.join(chosen));
    let parent = resolved.parent().ok_or_else(outside)?;
    if !same_dir(parent, &normalize(folder)) {
        return Err(outside());
    }
    let name = resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(outside)?;
    Ok((resolved, name))
}

/// Lexically drop `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn same_dir(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    matches!((a.canonicalize(), b.canonicalize()), (Ok(a), Ok(b)) if a == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialogs::testing::ScriptedDialogs;

    fn book() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("01-intro.md"), "# Intro\n\nHello there").unwrap();
        std::fs::write(dir.path().join("02-middle.txt"), "middle").unwrap();
        std::fs::write(dir.path().join("notes.pdf"), "binary").unwrap();
        std::fs::create_dir(dir.path().join("drafts.md")).unwrap();
        dir
    }

    #[test]
    fn test_list_chapters_filters_extensions_and_directories() {
        let dir = book();
        let names = list_chapters(dir.path()).unwrap();
        assert_eq!(names, vec!["01-intro.md".to_string(), "02-middle.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_open_folder_cancelled() {
        let dialogs = ScriptedDialogs::default();
        assert_eq!(open_folder(&dialogs).await, None);
        assert!(dialogs.errors().is_empty());
    }

    #[tokio::test]
    async fn test_open_folder_lists_chapters() {
        let dir = book();
        let dialogs = ScriptedDialogs {
            folder: Some(dir.path().to_path_buf()),
            ..ScriptedDialogs::default()
        };
        let opened = open_folder(&dialogs).await.unwrap();
        assert_eq!(opened.folder, dir.path());
        assert_eq!(opened.file_names.len(), 2);
    }

    #[tokio::test]
    async fn test_load_entries_skips_unreadable_files() {
        let dir = book();
        let names = vec!["01-intro.md".to_string(), "missing.md".to_string(), "02-middle.txt".to_string()];
        let entries = load_entries(dir.path(), &names).await;
        let loaded: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(loaded, vec!["01-intro.md", "02-middle.txt"]);
        assert_eq!(entries[0].word_count, "3");
        assert_eq!(entries[0].preview, "# Intro\n\nHello there");
    }

    #[tokio::test]
    async fn test_load_chapter_failure_notifies() {
        let dir = book();
        let dialogs = ScriptedDialogs::default();
        assert_eq!(load_chapter(&dialogs, dir.path(), "missing.md").await, None);
        assert_eq!(dialogs.errors().len(), 1);

        let chapter = load_chapter(&dialogs, dir.path(), "02-middle.txt").await.unwrap();
        assert_eq!(chapter.raw, "middle");
        assert_eq!(chapter.path, dir.path().join("02-middle.txt"));
    }

    #[tokio::test]
    async fn test_create_file_seeds_heading() {
        let dir = book();
        let dialogs = ScriptedDialogs::saving([dir.path().join("03-end.md")]);
        let name = create_file(&dialogs, dir.path()).await.unwrap();
        assert_eq!(name, "03-end.md");
        let content = std::fs::read_to_string(dir.path().join("03-end.md")).unwrap();
        assert_eq!(content, "# 03-end\n");
    }

    #[tokio::test]
    async fn test_create_file_outside_folder_is_rejected() {
        let dir = book();
        let other = tempfile::tempdir().unwrap();
        let dialogs = ScriptedDialogs::saving([
            other.path().join("escape.md"),
            dir.path().join("..").join("escape.md"),
            dir.path().join("drafts.md").join("nested.md"),
        ]);
        for _ in 0..3 {
            assert_eq!(create_file(&dialogs, dir.path()).await, None);
        }
        assert_eq!(dialogs.errors().len(), 3);
        assert!(!other.path().join("escape.md").exists());
    }

    #[tokio::test]
    async fn test_create_file_never_overwrites() {
        let dir = book();
        let dialogs = ScriptedDialogs::saving([dir.path().join("01-intro.md")]);
        assert_eq!(create_file(&dialogs, dir.path()).await, None);
        assert_eq!(dialogs.errors().len(), 1);
        let content = std::fs::read_to_string(dir.path().join("01-intro.md")).unwrap();
        assert_eq!(content, "# Intro\n\nHello there");
    }

    #[tokio::test]
    async fn test_rename_file() {
        let dir = book();
        let dialogs = ScriptedDialogs::saving([dir.path().join("01-opening.md")]);
        let name = rename_file(&dialogs, dir.path(), "01-intro.md").await.unwrap();
        assert_eq!(name, "01-opening.md");
        assert!(dir.path().join("01-opening.md").exists());
        assert!(!dir.path().join("01-intro.md").exists());
    }

    #[tokio::test]
    async fn test_rename_onto_existing_chapter_fails() {
        let dir = book();
        let dialogs = ScriptedDialogs::saving([dir.path().join("02-middle.txt")]);
        assert_eq!(rename_file(&dialogs, dir.path(), "01-intro.md").await, None);
        assert_eq!(dialogs.errors().len(), 1);
        assert!(dir.path().join("01-intro.md").exists());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let dir = book();
        let declining = ScriptedDialogs::confirming(false);
        assert!(!delete_file(&declining, dir.path(), "01-intro.md").await);
        assert!(dir.path().join("01-intro.md").exists());
        assert!(declining.errors().is_empty());

        let accepting = ScriptedDialogs::confirming(true);
        assert!(delete_file(&accepting, dir.path(), "01-intro.md").await);
        assert!(!dir.path().join("01-intro.md").exists());

        assert!(!delete_file(&accepting, dir.path(), "01-intro.md").await);
        assert_eq!(accepting.errors().len(), 1);
    }

    #[test]
    fn test_reorder_moves_single_element() {
        let list = ["A", "B", "C"];
        assert_eq!(reorder(&list, 0, 2), vec!["B", "C", "A"]);
        assert_eq!(reorder(&list, 2, 0), vec!["C", "A", "B"]);
        assert_eq!(reorder(&list, 1, 1), vec!["A", "B", "C"]);
        assert_eq!(reorder(&list, 5, 0), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_entry_counts_body_words_only() {
        let entry = ChapterEntry::from_content("a.md", "---\ntitle: Skip these words\n---\none two");
        assert_eq!(entry.word_count, "2");
    }
}
