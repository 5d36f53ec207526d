// src/file_system/operations.rs
// Low-level file operations shared by the editor and the transfer endpoints

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

/// Write file to disk ensuring parent directories exist and using a temp-file + rename strategy
/// for best-effort atomic replacement. Mirrors existing permissions on Unix.
///
/// On failure the destination is left untouched and the temp file is removed.
pub async fn write_file_with_dirs<P: AsRef<Path>>(path: P, bytes: impl AsRef<[u8]>) -> std::io::Result<()> {
    let path = path.as_ref();

    ensure_parent_dirs(path).await?;

    let temp_path = temp_sibling(path)?;
    let written = async {
        let mut file = open_temp(&temp_path).await?;
        file.write_all(bytes.as_ref()).await?;
        file.sync_all().await?;
        set_mode_like(&temp_path, path).await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    // Rename temp -> dest (same directory, so same filesystem)
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }
    sync_parent(path);

    debug!(path = %path.display(), bytes = bytes.as_ref().len(), "Wrote file");
    Ok(())
}

/// Create a file that must not exist yet, creating parent directories first.
///
/// Returns an error of kind `AlreadyExists` if anything occupies the path.
pub async fn create_file_exclusive<P: AsRef<Path>>(path: P, bytes: impl AsRef<[u8]>) -> std::io::Result<()> {
    let path = path.as_ref();

    ensure_parent_dirs(path).await?;

    let mut file = tokio::fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(path)
        .await?;

    file.write_all(bytes.as_ref()).await?;
    file.sync_all().await?;
    Ok(())
}

/// An upload being streamed to a hidden temp file.
///
/// Nothing is visible under the final name until `commit`. Dropping without
/// committing leaves the temp file behind, so callers `discard` on error.
#[derive(Debug)]
pub struct PendingUpload {
    base: PathBuf,
    temp: PathBuf,
    file: tokio::fs::File,
    written: u64,
}

impl PendingUpload {
    /// Start an upload of `file_name` staged in `staging_dir`.
    ///
    /// Only the basename of `file_name` is kept so an upload can never
    /// escape the directory it is committed into.
    pub async fn begin(staging_dir: &Path, file_name: &str) -> std::io::Result<Self> {
        let base = Path::new(file_name).file_name().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid upload file name: {:?}", file_name),
            )
        })?;
        let base = PathBuf::from(base);

        tokio::fs::create_dir_all(staging_dir).await?;
        let temp = temp_sibling(&staging_dir.join(&base))?;
        let file = open_temp(&temp).await?;

        Ok(Self {
            base,
            temp,
            file,
            written: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Move the upload to `<dir>/<basename>`, replacing any existing file
    pub async fn commit(self, dir: &Path) -> std::io::Result<PathBuf> {
        let Self { base, temp, file, written } = self;
        let dest = dir.join(&base);

        let result = async {
            file.sync_all().await?;
            drop(file);
            tokio::fs::create_dir_all(dir).await?;
            set_mode_like(&temp, &dest).await?;
            move_file(&temp, &dest).await
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        sync_parent(&dest);

        info!(path = %dest.display(), bytes = written, "Stored upload");
        Ok(dest)
    }

    /// Drop the partial upload
    pub async fn discard(self) {
        drop(self.file);
        let _ = tokio::fs::remove_file(&self.temp).await;
    }
}

/// Open a regular file for streaming back to a client
pub async fn open_download(path: &Path) -> std::io::Result<(tokio::fs::File, std::fs::Metadata)> {
    let file = tokio::fs::File::open(path).await?;
    let meta = file.metadata().await?;

    if !meta.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }

    Ok((file, meta))
}

async fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Build a hidden temp path next to `path`
fn temp_sibling(path: &Path) -> std::io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;

    let suffix = format!(
        ".{}.tmp.{}.{}",
        name.to_string_lossy(),
        std::process::id(),
        Uuid::new_v4().simple()
    );
    Ok(path.with_file_name(suffix))
}

async fn open_temp(temp_path: &Path) -> std::io::Result<tokio::fs::File> {
    // Create temp exclusively to avoid races
    tokio::fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp_path)
        .await
}

/// Mirror existing permissions of `dest` on Unix, otherwise set 0644
async fn set_mode_like(temp_path: &Path, dest: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = match tokio::fs::metadata(dest).await {
            Ok(meta) => meta.permissions().mode(),
            Err(_) => 0o644,
        };
        tokio::fs::set_permissions(temp_path, std::fs::Permissions::from_mode(mode)).await?;
    }
    #[cfg(not(unix))]
    let _ = (temp_path, dest);

    Ok(())
}

/// Rename, falling back to copy + remove across filesystems
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
        other => other,
    }
}

/// Fsync parent directory entry to reduce risk of metadata loss on crash
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = std::fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}
