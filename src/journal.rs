//! Append-only activity log.
//!
//! One line per operation and store access, formatted
//! `[YYYY-MM-DD HH:MM:SS] LEVEL - message`. The journal is opened once at
//! startup (parent directory created, append mode), every line is flushed
//! on write, and `close` fsyncs at shutdown. The handle is passed explicitly
//! into whatever needs to log; there is no ambient singleton.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

#[derive(Debug, Error)]
#[error("journal I/O at {path}: {source}")]
pub struct JournalError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// Severity tag on a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Process-wide activity log sink.
pub struct Journal {
    file: File,
    path: PathBuf,
}

impl Journal {
    /// Open the journal in append mode, creating parent directories.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| JournalError {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| JournalError {
                path: path.clone(),
                source: e,
            })?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one level-tagged line and flush it.
    pub async fn append(&mut self, level: Level, message: &str) -> Result<(), JournalError> {
        let line = format!(
            "[{}] {} - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            level,
            message
        );

        self.file
            .write_all(line.as_bytes())
            .await
            .map_err(|e| JournalError {
                path: self.path.clone(),
                source: e,
            })?;
        self.file.flush().await.map_err(|e| JournalError {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Append, downgrading failures to a tracing warning.
    ///
    /// Activity logging must never abort the operation being logged.
    pub async fn record(&mut self, level: Level, message: impl AsRef<str>) {
        if let Err(e) = self.append(level, message.as_ref()).await {
            warn!(error = %e, "failed to write journal line");
        }
    }

    pub async fn info(&mut self, message: impl AsRef<str>) {
        self.record(Level::Info, message).await;
    }

    pub async fn warning(&mut self, message: impl AsRef<str>) {
        self.record(Level::Warning, message).await;
    }

    pub async fn error(&mut self, message: impl AsRef<str>) {
        self.record(Level::Error, message).await;
    }

    /// Fsync and close; call once at shutdown.
    pub async fn close(self) -> Result<(), JournalError> {
        self.file.sync_all().await.map_err(|e| JournalError {
            path: self.path,
            source: e,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs/app.log");

        let journal = Journal::open(&path).await.unwrap();
        journal.close().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn lines_are_level_tagged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app.log");

        let mut journal = Journal::open(&path).await.unwrap();
        journal.append(Level::Info, "machine added").await.unwrap();
        journal.append(Level::Warning, "validation failed").await.unwrap();
        journal.append(Level::Error, "backup failed").await.unwrap();
        journal.close().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("INFO - machine added"));
        assert!(lines[1].contains("WARNING - validation failed"));
        assert!(lines[2].contains("ERROR - backup failed"));
        for line in lines {
            assert!(line.starts_with('['), "missing timestamp: {line}");
        }
    }

    #[tokio::test]
    async fn reopening_appends() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app.log");

        {
            let mut journal = Journal::open(&path).await.unwrap();
            journal.append(Level::Info, "first").await.unwrap();
            journal.close().await.unwrap();
        }
        {
            let mut journal = Journal::open(&path).await.unwrap();
            journal.append(Level::Info, "second").await.unwrap();
            journal.close().await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
