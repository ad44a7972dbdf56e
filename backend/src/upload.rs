use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::SagipResult;

/// URL prefix the upload root is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Destination directory for an uploaded form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDir {
    Pests,
    LifeCycle,
    Others,
}

impl UploadDir {
    pub fn for_field(field_name: &str) -> Self {
        match field_name {
            "pestImg" => UploadDir::Pests,
            "lifeCycleImg" => UploadDir::LifeCycle,
            _ => UploadDir::Others,
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            UploadDir::Pests => "pests",
            UploadDir::LifeCycle => "lifecycle",
            UploadDir::Others => "others",
        }
    }
}

/// A file part buffered from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Writes uploads under a root directory and hands back web-relative paths.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root and the per-field directories.
    pub async fn ensure_dirs(&self) -> SagipResult<()> {
        for dir in [UploadDir::Pests, UploadDir::LifeCycle, UploadDir::Others] {
            fs::create_dir_all(self.root.join(dir.dir_name())).await?;
        }
        Ok(())
    }

    /// Saves the file and returns its public path,
    /// e.g. `/uploads/pests/1718000000000.png`.
    pub async fn save(&self, file: &UploadedFile) -> SagipResult<String> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        self.save_at(file, timestamp).await
    }

    /// Removes a file written by [`UploadStore::save`]. Failures are only
    /// logged: the request that wrote it is already failing.
    pub async fn discard(&self, public_path: &str) {
        let Some(relative) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .map(|rest| rest.trim_start_matches('/'))
        else {
            return;
        };
        let target = self.root.join(relative);
        match fs::remove_file(&target).await {
            Ok(()) => tracing::info!("Discarded upload {}", target.display()),
            Err(e) => tracing::warn!("Could not discard upload {}: {}", target.display(), e),
        }
    }

    async fn save_at(&self, file: &UploadedFile, mut timestamp: i64) -> SagipResult<String> {
        let dir = UploadDir::for_field(&file.field_name);
        let target_dir = self.root.join(dir.dir_name());
        fs::create_dir_all(&target_dir).await?;

        let extension = extension_of(&file.file_name);
        loop {
            let stored_name = format!("{timestamp}{extension}");
            let target = target_dir.join(&stored_name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await
            {
                Ok(mut out) => {
                    out.write_all(&file.bytes).await?;
                    out.flush().await?;
                    tracing::info!(
                        "Stored upload {} ({} bytes) at {}",
                        file.field_name,
                        file.bytes.len(),
                        target.display()
                    );
                    return Ok(format!("{PUBLIC_PREFIX}/{}/{stored_name}", dir.dir_name()));
                }
                // Same millisecond as an earlier upload
                Err(e) if e.kind() == ErrorKind::AlreadyExists => timestamp += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Extension of the client-side file name including the dot, or empty.
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}
