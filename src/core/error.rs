//! Error types for the book core

use std::path::PathBuf;

use thiserror::Error;

/// Failures while touching chapter files
#[derive(Error, Debug)]
pub enum FileSetError {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not create file outside of {}", folder.display())]
    OutsideFolder { folder: PathBuf },

    #[error("Could not list folder: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Not a supported image: {}", path.display())]
    NotAnImage { path: PathBuf },
}

impl FileSetError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| FileSetError::Io {
            action,
            path,
            source,
        }
    }
}

/// Failures while reading, writing or mapping the book configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error loading config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error saving config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Config key `{0}` collides with another key when nested")]
    KeyConflict(String),
}
