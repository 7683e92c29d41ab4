//! Image files for products and blog posts.
//!
//! Records store only a file name; the bytes live flat in the upload
//! directory, which is also served under `/uploads`. Stored names are
//! `<uuid>_<sanitized original name>` so two uploads of `foto.jpg` never
//! collide.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Accepted image extensions (lowercase).
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Longest stem kept from an uploaded name. With the UUID prefix this keeps
/// stored names well under the 255-byte filesystem and column limits.
pub const MAX_STEM_CHARS: usize = 100;

/// Errors from the image store.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Extension not in [`ALLOWED_EXTENSIONS`].
    #[error("file type not allowed: {0}")]
    NotAllowed(String),

    /// A stored name that could escape the upload directory.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Lowercased extension of `file_name`, if any.
fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Whether `file_name` has an accepted image extension (case-insensitive).
#[must_use]
pub fn is_allowed_image(file_name: &str) -> bool {
    extension(file_name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Make an uploaded file name safe to store.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; whitespace becomes `_`;
/// leading dots are stripped. The extension is lowercased and the stem is cut
/// to [`MAX_STEM_CHARS`].
#[must_use]
pub fn sanitize_filename(file_name: &str) -> String {
    // Browsers on Windows may send the full client path.
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter_map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                Some(ch)
            } else if ch.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();

    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => {
            let stem = stem.trim_start_matches('.');
            let stem = if stem.is_empty() { "image" } else { stem };
            format!("{}.{}", truncate(stem), ext.to_ascii_lowercase())
        }
        _ => {
            let cleaned = cleaned.trim_start_matches('.');
            if cleaned.is_empty() {
                "image".to_string()
            } else {
                truncate(cleaned)
            }
        }
    }
}

fn truncate(stem: &str) -> String {
    stem.chars().take(MAX_STEM_CHARS).collect()
}

/// Flat directory of uploaded images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an upload and return its stored file name.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::NotAllowed` for a non-image extension and
    /// `ImageError::Io` when the file cannot be written.
    pub async fn save(&self, upload: &ImageUpload) -> Result<String, ImageError> {
        if !is_allowed_image(&upload.file_name) {
            return Err(ImageError::NotAllowed(upload.file_name.clone()));
        }

        let stored = format!(
            "{}_{}",
            Uuid::new_v4().simple(),
            sanitize_filename(&upload.file_name)
        );

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&stored), &upload.bytes).await?;

        tracing::debug!(file = %stored, bytes = upload.bytes.len(), "Stored image");
        Ok(stored)
    }

    /// Delete a stored image.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::InvalidName` for names containing path separators
    /// or `..`, and `ImageError::Io` when the file cannot be removed
    /// (including when it does not exist).
    pub async fn remove(&self, stored: &str) -> Result<(), ImageError> {
        if stored.is_empty() || stored.contains(['/', '\\']) || stored.contains("..") {
            return Err(ImageError::InvalidName(stored.to_string()));
        }
        tokio::fs::remove_file(self.dir.join(stored)).await?;
        Ok(())
    }

    /// Delete a stored image, logging instead of failing.
    pub async fn remove_quietly(&self, stored: &str) {
        match self.remove(stored).await {
            Ok(()) => tracing::debug!(file = %stored, "Removed image"),
            Err(e) => tracing::warn!(file = %stored, error = %e, "Failed to remove image"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_allowed_image() {
        assert!(is_allowed_image("foto.jpg"));
        assert!(is_allowed_image("FOTO.JPEG"));
        assert!(is_allowed_image("a.b.Png"));
        assert!(!is_allowed_image("foto.gif"));
        assert!(!is_allowed_image("jpg"));
        assert!(!is_allowed_image(""));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("minha foto.JPG"), "minha_foto.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd.png"), "passwd.png");
        assert_eq!(sanitize_filename("C:\\fotos\\quadro.png"), "quadro.png");
        assert_eq!(sanitize_filename("...hidden.png"), "hidden.png");
        assert_eq!(sanitize_filename("instalação.jpg"), "instalao.jpg");
        assert_eq!(sanitize_filename("çã.png"), "image.png");
        assert_eq!(sanitize_filename("???"), "image");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"));

        let stored = store
            .save(&ImageUpload {
                file_name: "Quadro Novo.PNG".to_string(),
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap();

        assert!(stored.ends_with("_Quadro_Novo.png"));
        let path = store.dir().join(&stored);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![1, 2, 3]);

        store.remove(&stored).await.unwrap();
        assert!(!path.exists());
        assert!(matches!(store.remove(&stored).await, Err(ImageError::Io(_))));
    }

    #[test]
    fn test_sanitize_filename_bounds_length() {
        let long = format!("{}.JPG", "a".repeat(240));
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized, format!("{}.jpg", "a".repeat(MAX_STEM_CHARS)));
        assert_eq!(sanitize_filename(&"b".repeat(300)).len(), MAX_STEM_CHARS);
    }

    #[tokio::test]
    async fn test_save_accepts_long_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let stored = store
            .save(&ImageUpload {
                file_name: format!("{}.jpg", "a".repeat(240)),
                bytes: vec![0xFF, 0xD8],
            })
            .await
            .unwrap();

        assert!(stored.len() < 255);
        assert!(stored.ends_with(".jpg"));
        assert!(store.dir().join(&stored).exists());
    }

    #[tokio::test]
    async fn test_save_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let result = store
            .save(&ImageUpload {
                file_name: "script.sh".to_string(),
                bytes: vec![],
            })
            .await;
        assert!(matches!(result, Err(ImageError::NotAllowed(_))));
    }

    #[tokio::test]
    async fn test_remove_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        assert!(matches!(
            store.remove("../secret.png").await,
            Err(ImageError::InvalidName(_))
        ));
        assert!(matches!(
            store.remove("a/b.png").await,
            Err(ImageError::InvalidName(_))
        ));
    }
}
