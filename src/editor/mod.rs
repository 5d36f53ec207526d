// src/editor/mod.rs
// Line-oriented file editing engine with bounded undo history
//
// Every operation runs under a per-path lock, so the read / snapshot / write
// sequence of one call never interleaves with another call on the same path.

pub mod history;
pub mod lines;
pub mod locks;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use history::{HistoryLedger, DEFAULT_HISTORY_CAPACITY};
pub use lines::LineSequence;
pub use locks::PathLocks;

/// When str_replace / insert record an undo snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Snapshot as soon as the file is read, even if the edit is then refused
    #[default]
    OnAttempt,
    /// Snapshot only when the edit is going to write
    OnMutation,
}

impl std::str::FromStr for HistoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "on_attempt" | "attempt" => Ok(HistoryPolicy::OnAttempt),
            "on_mutation" | "mutation" => Ok(HistoryPolicy::OnMutation),
            other => Err(format!(
                "unknown history policy '{}' (expected on_attempt or on_mutation)",
                other
            )),
        }
    }
}

impl std::fmt::Display for HistoryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryPolicy::OnAttempt => write!(f, "on_attempt"),
            HistoryPolicy::OnMutation => write!(f, "on_mutation"),
        }
    }
}

/// One edit command with exactly the fields it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    /// Show the file, optionally only the 1-based inclusive `range`
    View {
        path: PathBuf,
        range: Option<(i64, i64)>,
    },
    /// Create a new file; never overwrites
    Create { path: PathBuf, text: String },
    /// Replace every occurrence of `old` with `new`
    StrReplace {
        path: PathBuf,
        old: String,
        new: String,
    },
    /// Insert `text` as a new line after line `line` (0 prepends)
    Insert {
        path: PathBuf,
        line: i64,
        text: String,
    },
    /// Restore the most recent snapshot
    UndoEdit { path: PathBuf },
}

impl EditOperation {
    pub fn path(&self) -> &Path {
        match self {
            EditOperation::View { path, .. }
            | EditOperation::Create { path, .. }
            | EditOperation::StrReplace { path, .. }
            | EditOperation::Insert { path, .. }
            | EditOperation::UndoEdit { path } => path,
        }
    }

    /// Wire name of the command
    pub fn command(&self) -> &'static str {
        match self {
            EditOperation::View { .. } => "view",
            EditOperation::Create { .. } => "create",
            EditOperation::StrReplace { .. } => "str_replace",
            EditOperation::Insert { .. } => "insert",
            EditOperation::UndoEdit { .. } => "undo_edit",
        }
    }
}

/// Result of an edit that ran to completion.
///
/// `success == false` means the request was well-formed but deliberately not
/// carried out (duplicate create, missing search string, bad line number,
/// empty history).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_range: Option<[usize; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EditOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Hard failures: the operation was aborted
#[derive(Debug, Error)]
pub enum EditError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EditError {
    pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            EditError::NotFound(path.to_path_buf())
        } else {
            EditError::Io {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }
}

/// Snapshot pushed ahead of a write; retracted if the write fails
struct Checkpoint {
    evicted: Option<String>,
}

/// The edit engine. Owns the undo history and the per-path locks.
#[derive(Debug, Default)]
pub struct FileEditor {
    history: HistoryLedger,
    locks: PathLocks,
    policy: HistoryPolicy,
}

impl FileEditor {
    pub fn new(history: HistoryLedger, policy: HistoryPolicy) -> Self {
        Self {
            history,
            locks: PathLocks::new(),
            policy,
        }
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn locks(&self) -> &PathLocks {
        &self.locks
    }

    pub fn policy(&self) -> HistoryPolicy {
        self.policy
    }

    /// Run one edit operation
    pub async fn apply(&self, op: EditOperation) -> Result<EditOutcome, EditError> {
        let path = op.path().to_path_buf();
        let command = op.command();
        let guard = self.locks.acquire(&path).await;

        let result = match op {
            EditOperation::View { path, range } => self.view(&path, range).await,
            EditOperation::Create { path, text } => self.create(&path, &text).await,
            EditOperation::StrReplace { path, old, new } => self.str_replace(&path, &old, &new).await,
            EditOperation::Insert { path, line, text } => self.insert(&path, line, &text).await,
            EditOperation::UndoEdit { path } => self.undo_edit(&path).await,
        };

        drop(guard);
        self.locks.release(&path).await;

        match &result {
            Ok(outcome) if outcome.success => {
                debug!(command, path = %path.display(), "Edit applied");
            }
            Ok(outcome) => {
                info!(
                    command,
                    path = %path.display(),
                    reason = outcome.message.as_deref().unwrap_or(""),
                    "Edit refused"
                );
            }
            Err(e) => warn!(command, path = %path.display(), error = %e, "Edit failed"),
        }
        result
    }

    async fn view(&self, path: &Path, range: Option<(i64, i64)>) -> Result<EditOutcome, EditError> {
        let lines = lines::read(path).await?;
        let total = lines.len();

        let (start, end) = match range {
            Some((start, end)) => clamp_range(start, end, total),
            None => (0, total),
        };

        Ok(EditOutcome {
            success: true,
            content: Some(lines.join_range(start, end)),
            lines: Some(total),
            view_range: Some([start + 1, end]),
            message: Some(format!("Showing lines {}-{} of {}", start + 1, end, total)),
            ..Default::default()
        })
    }

    async fn create(&self, path: &Path, text: &str) -> Result<EditOutcome, EditError> {
        if !lines::create(path, text).await? {
            return Ok(EditOutcome::rejected("File already exists"));
        }

        info!(path = %path.display(), bytes = text.len(), "File created");
        Ok(EditOutcome::ok(format!("File created: {}", path.display())))
    }

    async fn str_replace(&self, path: &Path, old: &str, new: &str) -> Result<EditOutcome, EditError> {
        let content = lines::read_to_string(path).await?;
        let found = !old.is_empty() && content.contains(old);

        let checkpoint = self.checkpoint(path, content.clone(), found).await;

        if !found {
            return Ok(EditOutcome::rejected("String not found in file"));
        }

        let count = content.matches(old).count();
        let updated = content.replace(old, new);
        self.write_or_rollback(path, &updated, checkpoint).await?;

        info!(path = %path.display(), count, "Replaced occurrences");
        Ok(EditOutcome {
            replaced: Some(count),
            ..EditOutcome::ok(format!("Replaced {} occurrence(s)", count))
        })
    }

    async fn insert(&self, path: &Path, line: i64, text: &str) -> Result<EditOutcome, EditError> {
        let mut lines = lines::read(path).await?;
        let total = lines.len();
        let after = usize::try_from(line).ok().filter(|n| *n <= total);

        let checkpoint = self.checkpoint(path, lines.join(), after.is_some()).await;

        let Some(after) = after else {
            return Ok(EditOutcome::rejected(format!(
                "Invalid line number: {} (valid range: [0, {}])",
                line, total
            )));
        };

        lines.insert_after(after, text);
        self.write_or_rollback(path, &lines.join(), checkpoint).await?;

        info!(path = %path.display(), after, "Inserted line");
        Ok(EditOutcome::ok(format!("Inserted line after line {}", after)))
    }

    async fn undo_edit(&self, path: &Path) -> Result<EditOutcome, EditError> {
        let Some(snapshot) = self.history.pop(path).await else {
            return Ok(EditOutcome::rejected("No edit history to undo"));
        };

        let written = lines::write(path, &snapshot).await;
        if let Err(e) = written {
            self.history.restore(path, snapshot).await;
            return Err(e);
        }

        let remaining = self.history.depth(path).await;
        info!(path = %path.display(), remaining, "Edit undone");
        Ok(EditOutcome::ok("Edit undone successfully"))
    }

    /// Push the pre-edit snapshot according to the history policy
    async fn checkpoint(&self, path: &Path, snapshot: String, will_write: bool) -> Option<Checkpoint> {
        if !will_write && self.policy == HistoryPolicy::OnMutation {
            return None;
        }
        let evicted = self.history.push(path, snapshot).await;
        Some(Checkpoint { evicted })
    }

    async fn write_or_rollback(
        &self,
        path: &Path,
        content: &str,
        checkpoint: Option<Checkpoint>,
    ) -> Result<(), EditError> {
        let written = lines::write(path, content).await;
        if written.is_err() {
            if let Some(checkpoint) = checkpoint {
                self.history.retract(path, checkpoint.evicted).await;
            }
        }
        written
    }
}

/// Convert a 1-based inclusive range into a 0-based half-open slice within `0..=total`
fn clamp_range(start: i64, end: i64, total: usize) -> (usize, usize) {
    let max = i64::try_from(total).unwrap_or(i64::MAX);
    let mut lo = start.saturating_sub(1).clamp(0, max);
    let mut hi = end.clamp(0, max);
    if lo > hi {
        std::mem::swap(&mut lo, &mut hi);
    }
    // Both values are within 0..=total here
    (lo as usize, hi as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clamp_range_plain() {
        assert_eq!(clamp_range(2, 4, 10), (1, 4));
    }

    #[test]
    fn test_clamp_range_out_of_bounds() {
        assert_eq!(clamp_range(-5, 1000, 5), (0, 5));
        assert_eq!(clamp_range(50, 60, 5), (5, 5));
    }

    #[test]
    fn test_clamp_range_reversed() {
        assert_eq!(clamp_range(5, 2, 10), (2, 4));
        assert_eq!(clamp_range(8, -3, 10), (0, 7));
    }

    #[test]
    fn test_operation_command_names() {
        let path = PathBuf::from("x");
        assert_eq!(EditOperation::UndoEdit { path: path.clone() }.command(), "undo_edit");
        assert_eq!(
            EditOperation::StrReplace { path: path.clone(), old: "a".into(), new: "b".into() }.command(),
            "str_replace"
        );
        assert_eq!(EditOperation::View { path, range: None }.path(), Path::new("x"));
    }

    #[test]
    fn test_history_policy_parsing() {
        assert_eq!("on_attempt".parse::<HistoryPolicy>(), Ok(HistoryPolicy::OnAttempt));
        assert_eq!("On-Mutation".parse::<HistoryPolicy>(), Ok(HistoryPolicy::OnMutation));
        assert!("sometimes".parse::<HistoryPolicy>().is_err());
        assert_eq!(HistoryPolicy::OnMutation.to_string(), "on_mutation");
    }

    #[test]
    fn test_outcome_serialization_skips_empty_fields() {
        let json = serde_json::to_value(EditOutcome::rejected("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "message": "nope" }));
    }

    #[test]
    fn test_io_error_mapping() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(EditError::from_io(Path::new("a"), missing), EditError::NotFound(_)));

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = EditError::from_io(Path::new("a"), denied);
        assert!(matches!(err, EditError::Io { .. }));
        assert!(err.to_string().contains("denied"));
    }

    #[tokio::test]
    async fn test_insert_snapshot_is_joined_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "a\nb\n").unwrap();
        let editor = FileEditor::default();

        editor
            .apply(EditOperation::Insert { path: path.clone(), line: 1, text: "x".into() })
            .await
            .unwrap();
        editor.apply(EditOperation::UndoEdit { path: path.clone() }).await.unwrap();

        // The snapshot is the joined line sequence, so the trailing newline is gone
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb");
    }

    #[tokio::test]
    async fn test_undo_recreates_deleted_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "old").unwrap();
        let editor = FileEditor::default();

        editor
            .apply(EditOperation::StrReplace { path: path.clone(), old: "old".into(), new: "new".into() })
            .await
            .unwrap();
        std::fs::remove_file(&path).unwrap();
        let outcome = editor.apply(EditOperation::UndoEdit { path: path.clone() }).await.unwrap();

        assert!(outcome.success);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_write_retracts_snapshot() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("ro");
        std::fs::create_dir(&sub).unwrap();
        let path = sub.join("f.txt");
        std::fs::write(&path, "abc").unwrap();
        std::fs::set_permissions(&sub, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores directory permissions, so only assert when the write really fails
        let writable = std::fs::File::create(sub.join("check")).is_ok();
        let editor = FileEditor::default();
        let result = editor
            .apply(EditOperation::StrReplace { path: path.clone(), old: "a".into(), new: "z".into() })
            .await;

        std::fs::set_permissions(&sub, std::fs::Permissions::from_mode(0o755)).unwrap();
        if !writable {
            assert!(matches!(result, Err(EditError::Io { .. })));
            assert_eq!(editor.history().depth(&path).await, 0);
            assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc");
        }
    }
}
