//! Application preferences, shared by every book

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// How many recently opened folders to remember
const MAX_RECENT: usize = 10;

/// Application preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Last opened book folder
    pub last_folder: Option<PathBuf>,
    /// Recently opened book folders, newest first
    pub recent_folders: Vec<PathBuf>,
    /// Document converter executable
    pub pandoc_path: PathBuf,
    /// Editor settings
    pub editor: EditorConfig,
}

/// Editor-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Font size in points
    pub font_size: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_folder: None,
            recent_folders: Vec::new(),
            pandoc_path: PathBuf::from("pandoc"),
            editor: EditorConfig::default(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { font_size: 14.0 }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "bookless", "Bookless").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load preferences from the platform config directory
    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config directory")?;
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save preferences to the platform config directory
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("Could not determine config directory")?;
        self.save_to(&path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Saved preferences to: {}", path.display());
        Ok(())
    }

    /// Remember `path` as the most recently opened folder
    pub fn add_recent_folder(&mut self, path: PathBuf) {
        self.recent_folders.retain(|p| p != &path);
        self.recent_folders.insert(0, path.clone());
        self.recent_folders.truncate(MAX_RECENT);
        self.last_folder = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_folders_are_unique_and_bounded() {
        let mut config = AppConfig::default();
        for i in 0..12 {
            config.add_recent_folder(PathBuf::from(format!("/books/{i}")));
        }
        config.add_recent_folder(PathBuf::from("/books/5"));
        assert_eq!(config.recent_folders.len(), MAX_RECENT);
        assert_eq!(config.recent_folders[0], PathBuf::from("/books/5"));
        assert_eq!(config.recent_folders.iter().filter(|p| p.ends_with("5")).count(), 1);
        assert_eq!(config.last_folder, Some(PathBuf::from("/books/5")));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.pandoc_path = PathBuf::from("/opt/pandoc/bin/pandoc");
        config.add_recent_folder(PathBuf::from("/books/novel"));

        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"last_folder": "/books/novel"}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.last_folder, Some(PathBuf::from("/books/novel")));
        assert_eq!(config.pandoc_path, PathBuf::from("pandoc"));
        assert_eq!(config.editor, EditorConfig::default());
    }
}
