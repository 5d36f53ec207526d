// src/editor/lines.rs
// Line store: file content <-> ordered lines
//
// Lines are split on '\n' (a preceding '\r' is dropped) and joined back with
// '\n' without a trailing newline, so "a\nb" and "a\nb\n" read the same.

use std::path::Path;

use super::EditError;
use crate::file_system;

/// Ordered physical lines of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSequence {
    lines: Vec<String>,
}

impl LineSequence {
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_owned).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join every line back into file content
    pub fn join(&self) -> String {
        self.lines.join("\n")
    }

    /// Join the 0-based half-open slice `start..end`
    pub fn join_range(&self, start: usize, end: usize) -> String {
        self.lines[start..end].join("\n")
    }

    /// Insert `text` as a new line after 1-based line `after` (0 prepends).
    ///
    /// Callers validate `after <= len()`.
    pub fn insert_after(&mut self, after: usize, text: &str) {
        self.lines.insert(after, text.to_owned());
    }
}

/// Read a file as a line sequence
pub async fn read(path: &Path) -> Result<LineSequence, EditError> {
    let content = read_to_string(path).await?;
    Ok(LineSequence::parse(&content))
}

/// Read a whole file as one string
pub async fn read_to_string(path: &Path) -> Result<String, EditError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| EditError::from_io(path, e))
}

/// Replace the file content atomically
pub async fn write(path: &Path, content: &str) -> Result<(), EditError> {
    file_system::write_file_with_dirs(path, content)
        .await
        .map_err(|e| EditError::from_io(path, e))
}

/// Create a new file. Returns `Ok(false)` when something already exists at `path`.
pub async fn create(path: &Path, content: &str) -> Result<bool, EditError> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => return Ok(false),
        Ok(false) => {}
        Err(e) => return Err(EditError::from_io(path, e)),
    }

    match file_system::create_file_exclusive(path, content).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(EditError::from_io(path, e)),
    }
}
