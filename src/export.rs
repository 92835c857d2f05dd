//! Export through pandoc
//!
//! Chapters are streamed to the converter on stdin, front matter stripped,
//! in book order. Book settings under `variables` become `--variable` flags.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::book_config::BookConfig;
use crate::core::dialogs::{Dialogs, FileFilter, NoticeLevel};
use crate::core::error::ConfigError;
use crate::core::front_matter;
use crate::core::value::Value;

/// Markdown dialect handed to pandoc
const INPUT_FORMAT: &str = "markdown+header_attributes+footnotes+tex_math_dollars";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {}", .0.display())]
    UnknownFormat(PathBuf),

    #[error("Could not read chapter {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Could not run {command}: {source}\n\nInstall pandoc, and LaTeX to export PDF: https://www.latex-project.org/get/")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Called: {command}\n\n{stderr}")]
    Failed { command: String, stderr: String },

    #[error("Lost contact with the converter: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format, inferred from the destination extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Epub,
    Html,
    Docx,
    Odt,
    Latex,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "epub" => Ok(Self::Epub),
            "html" | "htm" => Ok(Self::Html),
            "docx" => Ok(Self::Docx),
            "odt" => Ok(Self::Odt),
            "tex" | "latex" => Ok(Self::Latex),
            _ => Err(ExportError::UnknownFormat(path.to_path_buf())),
        }
    }

    /// Value for `--to`; pandoc picks the PDF route from the output name
    pub fn writer(self) -> Option<&'static str> {
        match self {
            Self::Pdf => None,
            Self::Epub => Some("epub"),
            Self::Html => Some("html"),
            Self::Docx => Some("docx"),
            Self::Odt => Some("odt"),
            Self::Latex => Some("latex"),
        }
    }
}

/// What to export
#[derive(Debug, Clone, PartialEq)]
pub enum ExportScope {
    /// A single chapter by file name
    Chapter(String),
    /// All chapters in list order
    Book,
}

/// A fully described export, built from a state snapshot
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub folder: PathBuf,
    pub scope: ExportScope,
    pub output: PathBuf,
    pub config: BookConfig,
}

impl ExportJob {
    /// Converter arguments; the content itself goes to stdin
    pub fn args(&self) -> Result<Vec<String>, ExportError> {
        let format = ExportFormat::from_path(&self.output)?;
        let mut args = vec!["--from".to_string(), INPUT_FORMAT.to_string()];
        if let Some(writer) = format.writer() {
            args.push("--to".into());
            args.push(writer.into());
        }
        args.push("--output".into());
        args.push(self.output.to_string_lossy().into_owned());
        args.push("--standalone".into());
        if self.scope == ExportScope::Book {
            args.push("--toc".into());
        }
        args.push("--number-sections".into());
        args.push("--top-level-division".into());
        args.push("chapter".into());

        let persisted = self.config.to_persisted()?;
        if let Some(variables) = persisted.get("variables").and_then(Value::as_map) {
            for (key, value) in variables {
                for text in variable_values(value) {
                    args.push("--variable".into());
                    args.push(format!("{key}={text}"));
                }
            }
        }
        Ok(args)
    }

    /// Chapter bodies to convert, joined by blank lines
    pub async fn input(&self) -> Result<String, ExportError> {
        let names = match &self.scope {
            ExportScope::Chapter(name) => vec![name.clone()],
            ExportScope::Book => self.config.input_files(),
        };
        let mut bodies = Vec::with_capacity(names.len());
        for name in names {
            let path = self.folder.join(&name);
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| ExportError::Read { path, source })?;
            bodies.push(front_matter::decode(&raw).body);
        }
        Ok(bodies.join("\n\n"))
    }
}

fn variable_values(value: &Value) -> Vec<String> {
    match value {
        Value::List(items) => items.iter().filter_map(Value::scalar_text).collect(),
        Value::Null => Vec::new(),
        other => other.scalar_text().into_iter().collect(),
    }
}

/// Shell-like rendering of a command for error messages
fn command_line(program: &Path, args: &[String]) -> String {
    std::iter::once(program.to_string_lossy().into_owned())
        .chain(args.iter().map(|arg| {
            if arg.contains(' ') {
                format!("'{arg}'")
            } else {
                arg.clone()
            }
        }))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run the converter. Returns a success message.
pub async fn run(program: &Path, job: &ExportJob) -> Result<String, ExportError> {
    let args = job.args()?;
    let input = job.input().await?;
    let command = command_line(program, &args);
    tracing::info!("Exporting: {}", command);

    let mut child = Command::new(program)
        .args(&args)
        .current_dir(&job.folder)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ExportError::Spawn {
            command: command.clone(),
            source,
        })?;

    let stdin = child.stdin.take();
    let feed = async move {
        if let Some(mut stdin) = stdin {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await?;
        }
        Ok::<(), std::io::Error>(())
    };
    let (fed, output) = tokio::join!(feed, child.wait_with_output());
    let output = output?;

    if !output.status.success() {
        return Err(ExportError::Failed {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    // A converter that exits cleanly without reading all input is fine
    if let Err(e) = fed {
        tracing::warn!("Converter closed its input early: {}", e);
    }
    Ok(format!("Created file: {}", job.output.display()))
}

/// Ask for a destination and export, reporting the result to the user
pub async fn export_with_dialog(
    dialogs: &impl Dialogs,
    program: &Path,
    folder: PathBuf,
    scope: ExportScope,
    config: BookConfig,
) {
    let default_name = match &scope {
        ExportScope::Chapter(name) => Path::new(name)
            .file_stem()
            .map(|stem| format!("{}.pdf", stem.to_string_lossy()))
            .unwrap_or_else(|| "chapter.pdf".to_string()),
        ExportScope::Book => "book.pdf".to_string(),
    };
    let Some(output) = dialogs.save_file(&folder, &default_name, FileFilter::Export).await else {
        return;
    };
    let job = ExportJob {
        folder,
        scope,
        output,
        config,
    };
    match run(program, &job).await {
        Ok(message) => dialogs.notify(NoticeLevel::Info, "Success!", &message).await,
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            dialogs
                .notify(NoticeLevel::Error, "Failed to export", &e.to_string())
                .await;
        }
    }
}
