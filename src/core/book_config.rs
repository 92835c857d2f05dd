//! Per-folder book configuration and its on-disk mapping
//!
//! In memory the configuration is a flat map of dotted camelCase keys such as
//! `variables.fontSize`. On disk (`_bookless.yaml`) the same data is a nested
//! YAML document with kebab-case segments:
//!
//! ```yaml
//! variables:
//!   font-size: 12px
//! ```
//!
//! [`BookConfig::to_persisted`] and [`BookConfig::from_persisted`] convert
//! between the two and are exact inverses for camelCase keys with non-object
//! values.

use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::value::{Map, Value};

/// Name of the configuration file inside a book folder
pub const CONFIG_FILE: &str = "_bookless.yaml";

/// Well-known configuration keys
pub mod keys {
    /// Runtime marker of the folder a configuration belongs to; never persisted
    pub const CURRENT_DIR: &str = "currentDir";
    /// Ordered chapter file names
    pub const INPUT_FILES: &str = "inputFiles";
    pub const TITLE: &str = "variables.title";
    pub const AUTHOR: &str = "variables.author";
    pub const DATE: &str = "variables.date";
    pub const LANG: &str = "variables.lang";
    pub const FONT_FAMILY: &str = "variables.fontfamily";
    pub const FONT_SIZE: &str = "variables.fontsize";
    pub const LINE_HEIGHT: &str = "variables.linestretch";
    pub const HEADER_INCLUDES: &str = "variables.headerIncludes";
}

/// Flat, dot-addressable book configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookConfig {
    entries: Map,
}

impl BookConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty configuration tagged with the folder it originates from.
    /// Used to build partial updates.
    pub fn for_folder(folder: &Path) -> Self {
        let mut config = Self::new();
        config.set(keys::CURRENT_DIR, folder.to_string_lossy().into_owned());
        config
    }

    /// Builder form of [`BookConfig::set`]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordered chapter file names; empty when unset or not a string list
    pub fn input_files(&self) -> Vec<String> {
        self.get(keys::INPUT_FILES)
            .and_then(Value::as_str_list)
            .unwrap_or_default()
    }

    pub fn set_input_files(&mut self, names: Vec<String>) {
        self.set(keys::INPUT_FILES, names);
    }

    /// Folder marker carried by this configuration, if any
    pub fn folder(&self) -> Option<PathBuf> {
        self.get(keys::CURRENT_DIR)
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    /// Shallow merge: every key of `patch` overwrites the same key here
    pub fn merge(&mut self, patch: &BookConfig) {
        for (key, value) in &patch.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Fill in what a freshly opened folder needs: the chapter list from the
    /// directory scan, a title from the folder name, and the folder marker.
    pub fn with_defaults(mut self, folder: &Path, scanned: &[String]) -> Self {
        if self.get(keys::INPUT_FILES).and_then(Value::as_str_list).is_none() {
            self.set_input_files(scanned.to_vec());
        }
        if self.get(keys::TITLE).is_none() {
            let title = folder
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "my-book".to_string());
            self.set(keys::TITLE, title);
        }
        self.set(keys::CURRENT_DIR, folder.to_string_lossy().into_owned());
        self
    }

    /// Nested kebab-case form written to disk. The folder marker is dropped.
    pub fn to_persisted(&self) -> Result<Map, ConfigError> {
        let mut root = Map::new();
        for (key, value) in &self.entries {
            if key == keys::CURRENT_DIR {
                continue;
            }
            let segments: Vec<String> = key.split('.').map(camel_to_kebab).collect();
            insert_nested(&mut root, &segments, value.clone())
                .ok_or_else(|| ConfigError::KeyConflict(key.clone()))?;
        }
        Ok(root)
    }

    /// Flatten a nested on-disk document into dotted camelCase keys.
    /// Objects are descended into; scalars and lists are leaves.
    pub fn from_persisted(persisted: &Map) -> Self {
        let mut entries = Map::new();
        flatten_into(&mut entries, persisted, None);
        Self { entries }
    }
}

fn insert_nested(map: &mut Map, segments: &[String], value: Value) -> Option<()> {
    let (first, rest) = segments.split_first()?;
    if rest.is_empty() {
        if map.contains_key(first) {
            return None;
        }
        map.insert(first.clone(), value);
        return Some(());
    }
    let child = map
        .entry(first.clone())
        .or_insert_with(|| Value::Map(Map::new()));
    match child {
        Value::Map(inner) => insert_nested(inner, rest, value),
        _ => None,
    }
}

fn flatten_into(out: &mut Map, map: &Map, prefix: Option<&str>) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Map(inner) => flatten_into(out, inner, Some(&path)),
            leaf => {
                out.insert(kebab_to_camel(&path), leaf.clone());
            }
        }
    }
}

/// `fontSize` -> `font-size`
pub fn camel_to_kebab(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    for c in segment.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `font-size` -> `fontSize`
pub fn kebab_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars();
    while let Some(c) = chars.next() {
        if c == '-' {
            match chars.next() {
                Some(next) => out.extend(next.to_uppercase()),
                None => out.push('-'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Read `<folder>/_bookless.yaml`. A missing file is an empty configuration.
pub async fn load(folder: &Path) -> Result<BookConfig, ConfigError> {
    let path = folder.join(CONFIG_FILE);
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BookConfig::new()),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    if text.trim().is_empty() {
        return Ok(BookConfig::new());
    }
    let value: Value = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.clone(),
        source,
    })?;
    match value {
        Value::Map(map) => Ok(BookConfig::from_persisted(&map)),
        _ => {
            tracing::warn!("Config file {} is not a mapping, ignoring it", path.display());
            Ok(BookConfig::new())
        }
    }
}

/// Write `config` to `<folder>/_bookless.yaml`
pub async fn save(folder: &Path, config: &BookConfig) -> Result<(), ConfigError> {
    let path = folder.join(CONFIG_FILE);
    let yaml = serde_yaml::to_string(&config.to_persisted()?)?;
    tokio::fs::write(&path, yaml)
        .await
        .map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;
    tracing::info!("Saved config to: {}", path.display());
    Ok(())
}
