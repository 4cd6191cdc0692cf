use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}

/// Media files on the local filesystem under the configured media root.
/// Keys are slash-separated relative paths, so they map straight onto
/// the directory layout served under `/recordings/`.
#[derive(Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub async fn new(root: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(root)
            .await
            .with_context(|| format!("create media root {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl StorageClient for MediaStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create media directory {}", parent.display()))?;
        }
        fs::write(&path, &body)
            .await
            .with_context(|| format!("write media file {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // deleting an already-gone file is not an error
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove media file {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("backrecorder-storage-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn put_writes_nested_key_and_delete_removes_it() {
        let root = scratch_root();
        let storage = MediaStorage::new(&root).await.expect("create storage");

        let key = format!("{}/{}", Uuid::new_v4(), Uuid::new_v4());
        storage
            .put_object(&key, Bytes::from_static(b"pcm-data"))
            .await
            .expect("put");

        let on_disk = tokio::fs::read(root.join(&key)).await.expect("read back");
        assert_eq!(on_disk, b"pcm-data");

        storage.delete_object(&key).await.expect("delete");
        assert!(!root.join(&key).exists());

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn delete_of_missing_key_is_ok() {
        let root = scratch_root();
        let storage = MediaStorage::new(&root).await.expect("create storage");

        storage
            .delete_object("nobody/here")
            .await
            .expect("missing file should not error");

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn put_overwrites_existing_key() {
        let root = scratch_root();
        let storage = MediaStorage::new(&root).await.expect("create storage");

        storage
            .put_object("u/r", Bytes::from_static(b"first"))
            .await
            .expect("put");
        storage
            .put_object("u/r", Bytes::from_static(b"second"))
            .await
            .expect("overwrite");

        let on_disk = tokio::fs::read(root.join("u/r")).await.expect("read back");
        assert_eq!(on_disk, b"second");

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}
