//! # Photo uploads
//!
//! [`UploadStore`] writes an uploaded file into the uploads directory under a fresh
//! UUID name (keeping a sanitised extension from the client's filename) and returns
//! the public reference `/uploads/<name>`. That string is stored verbatim in the
//! record's `photo_ref`; the bytes themselves are never inspected.
//!
//! The directory is served read-only by the server binary at the same prefix.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ApiError;
use crate::records::UploadedFile;

/// URL prefix under which uploaded files are served.
pub const UPLOADS_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

/// Lowercased alphanumeric extension of `file_name`, if it has a usable one.
fn extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `file` and return its public reference.
    pub async fn save(&self, file: &UploadedFile) -> Result<String, ApiError> {
        let name = match file.file_name.as_deref().and_then(extension) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to create uploads dir: {}", e)))?;
        tokio::fs::write(self.dir.join(&name), &file.bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to write upload: {}", e)))?;

        tracing::debug!("Stored upload {} ({} bytes)", name, file.bytes.len());
        Ok(format!("{}/{}", UPLOADS_PREFIX, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[test]
    fn test_extension() {
        assert_eq!(extension("scan.PNG"), Some("png".to_string()));
        assert_eq!(extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension("noext"), None);
        assert_eq!(extension("evil.p/hp"), None);
        assert_eq!(extension("weird.j$g"), None);
    }

    #[tokio::test]
    async fn test_save_writes_file_and_returns_reference() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::new(dir.path().join("uploads"));

        let file = UploadedFile {
            file_name: Some("xray.jpg".to_string()),
            bytes: Bytes::from_static(b"\xff\xd8\xff"),
        };
        let reference = uploads.save(&file).await.unwrap();

        assert!(reference.starts_with("/uploads/"));
        assert!(reference.ends_with(".jpg"));

        let name = reference.trim_start_matches("/uploads/");
        let stored = std::fs::read(uploads.dir().join(name)).unwrap();
        assert_eq!(stored, b"\xff\xd8\xff");
    }
}
