//! Blob store writing payloads to a directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use scenery_core::blob::BlobStore;
use scenery_core::error::{Result, SceneryError};

/// Writes each payload to `<dir>/<scene-id>.json` and returns its `file://`
/// URL. A later save of the same scene overwrites the previous payload.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn payload_path(&self, scene_id: &str) -> PathBuf {
        let file_name: String = scene_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

/// Builds a `file://` URL for an absolute path.
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn put(&self, scene_id: &str, payload: Vec<u8>) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.payload_path(scene_id);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &payload).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        let absolute = tokio::fs::canonicalize(&path)
            .await
            .map_err(|e| SceneryError::io(format!("Failed to resolve {}: {}", path.display(), e)))?;

        tracing::info!(
            "[FileBlobStore] Stored {} bytes for scene {} at {}",
            payload.len(),
            scene_id,
            absolute.display()
        );
        Ok(file_url(&absolute))
    }

    async fn remove(&self, url: &str) -> Result<bool> {
        let Some(path) = url.strip_prefix("file://").map(Path::new) else {
            return Ok(false);
        };
        // put() hands out canonical paths
        let inside = path.starts_with(&self.dir)
            || path.starts_with(tokio::fs::canonicalize(&self.dir).await?);
        if !inside {
            return Err(SceneryError::config(format!(
                "{} is not in the blob directory",
                url
            )));
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_writes_payload_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path().join("blobs"));

        let url = store.put("scene-1-abc", b"payload".to_vec()).await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("scene-1-abc.json"));

        let path = temp_dir.path().join("blobs").join("scene-1-abc.json");
        assert_eq!(std::fs::read(path).unwrap(), b"payload".to_vec());
    }

    #[tokio::test]
    async fn test_remove_deletes_payload_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path().join("blobs"));
        let url = store.put("s1", b"payload".to_vec()).await.unwrap();

        assert!(store.remove(&url).await.unwrap());
        assert!(!store.remove(&url).await.unwrap());
        assert!(!temp_dir.path().join("blobs").join("s1.json").exists());

        let outside = file_url(&temp_dir.path().join("other.json"));
        assert!(store.remove(&outside).await.is_err());
    }

    #[tokio::test]
    async fn test_scene_id_is_sanitized() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path());
        let url = store.put("../escape", vec![]).await.unwrap();
        assert!(url.ends_with("___escape.json"));
    }
}
