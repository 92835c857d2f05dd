//! The chapter open in the editor

use std::path::{Path, PathBuf};

use super::front_matter::{self, MetadataStatus};
use super::value::{Map, Value};

/// Shown whenever no chapter is open
pub const PLACEHOLDER_TEXT: &str = "# Welcome to Bookless

Open a book folder to start writing.

- Every markdown file in the folder is a chapter.
- Drag chapters in the explorer to change their order.
- Book settings live in `_bookless.yaml` inside the folder.
- Export a chapter or the whole book as PDF, EPUB or HTML.
";

/// A markdown document
///
/// `raw` is always `front_matter` followed by `body`, and `metadata` is
/// always the decoded `front_matter`. Both are recomputed from the full
/// text on every edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Full file content
    raw: String,
    /// Exact front matter block, empty if none
    front_matter: String,
    /// Content after the front matter
    body: String,
    metadata: Map,
    metadata_status: MetadataStatus,
    /// File name relative to the book folder
    pub file_name: Option<String>,
    pub path: Option<PathBuf>,
}

impl Document {
    /// Create a document from raw text
    pub fn new(raw: impl Into<String>, file_name: Option<String>, path: Option<PathBuf>) -> Self {
        let mut doc = Self {
            raw: String::new(),
            front_matter: String::new(),
            body: String::new(),
            metadata: Map::new(),
            metadata_status: MetadataStatus::Absent,
            file_name,
            path,
        };
        doc.set_raw(raw.into());
        doc
    }

    /// The instructional document shown without an open chapter
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_TEXT, None, None)
    }

    /// Replace the text and re-derive front matter, body and metadata
    pub fn set_raw(&mut self, raw: String) {
        let decoded = front_matter::decode(&raw);
        self.front_matter = decoded.block;
        self.body = decoded.body;
        self.metadata = decoded.metadata;
        self.metadata_status = decoded.status;
        self.raw = raw;
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn front_matter(&self) -> &str {
        &self.front_matter
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn metadata(&self) -> &Map {
        &self.metadata
    }

    pub fn metadata_status(&self) -> &MetadataStatus {
        &self.metadata_status
    }

    /// Whether this document is backed by a file
    pub fn is_saved(&self) -> bool {
        self.path.is_some()
    }

    /// Whether the backing file lies inside `folder`
    pub fn is_inside(&self, folder: &Path) -> bool {
        self.path.as_deref().is_some_and(|path| path.starts_with(folder))
    }

    /// Metadata title, else the file stem
    pub fn title(&self) -> String {
        self.metadata
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                self.file_name
                    .as_deref()
                    .and_then(|name| Path::new(name).file_stem())
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "Untitled".to_string())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frontmatter() {
        let content = r#"---
title: "Test Document"
tags: [rust, markdown]
---

# Content here
"#;
        let doc = Document::new(content, Some("test.md".into()), None);
        assert_eq!(doc.title(), "Test Document");
        assert_eq!(doc.body(), "\n# Content here\n");
        assert_eq!(format!("{}{}", doc.front_matter(), doc.body()), content);
    }

    #[test]
    fn test_edit_recomputes_metadata() {
        let mut doc = Document::new("---\ntitle: One\n---\nText", None, None);
        doc.set_raw("No front matter any more".to_string());
        assert!(doc.metadata().is_empty());
        assert_eq!(doc.front_matter(), "");
        assert_eq!(doc.body(), "No front matter any more");
        assert_eq!(doc.metadata_status(), &MetadataStatus::Absent);
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let doc = Document::new("# Heading", Some("03-storm.md".into()), None);
        assert_eq!(doc.title(), "03-storm");
        assert_eq!(Document::placeholder().title(), "Untitled");
    }

    #[test]
    fn test_is_inside() {
        let doc = Document::new("", Some("a.md".into()), Some(PathBuf::from("/books/one/a.md")));
        assert!(doc.is_inside(Path::new("/books/one")));
        assert!(!doc.is_inside(Path::new("/books/two")));
        assert!(!Document::placeholder().is_inside(Path::new("/books/one")));
    }
}
