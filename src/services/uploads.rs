//! Listing photo storage.
//!
//! Handlers only see the `PhotoStore` trait: give it the bytes of one uploaded
//! part, get back the path to record on the listing. The client's filename is
//! used for its extension only; stored names are generated.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to write photo: {0}")]
    Io(#[from] std::io::Error),
}

/// One uploaded photo part.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Persist a photo and return the path to record on the listing.
    async fn store(&self, photo: UploadedPhoto) -> Result<String, UploadError>;

    /// Delete a previously stored photo. Already-missing files are not an error.
    async fn remove(&self, path: &str) -> Result<(), UploadError>;
}

/// Writes photos under a local directory (served statically by the web tier).
#[derive(Debug, Clone)]
pub struct DiskPhotoStore {
    dir: PathBuf,
}

impl DiskPhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

// Keep a short, alphanumeric extension from the client filename, if any.
fn safe_extension(file_name: Option<&str>) -> Option<String> {
    let ext = Path::new(file_name?).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[async_trait]
impl PhotoStore for DiskPhotoStore {
    async fn store(&self, photo: UploadedPhoto) -> Result<String, UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = match safe_extension(photo.file_name.as_deref()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.dir.join(name);
        tokio::fs::write(&path, &photo.bytes).await?;

        tracing::debug!(path = %path.display(), size = photo.bytes.len(), "stored listing photo");
        Ok(path.to_string_lossy().into_owned())
    }

    async fn remove(&self, path: &str) -> Result<(), UploadError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
