//! Local filesystem object store.
//!
//! Layout: `<root>/<container>/<key>`. Keys are relative paths; any key
//! with a `..` component or starting with `/` is rejected before touching
//! the disk. Writes land in a `.tmp-<uuid>` sibling and are renamed into
//! place, so a reader never sees a partial object. Listings skip those
//! temp files.

use super::{ObjectStore, StoreError, StoreResult};
use crate::address::ObjectAddress;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;
use walkdir::WalkDir;

const TMP_PREFIX: &str = ".tmp-";

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StoreError::Config(format!(
                "Failed to create store directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_path(&self, container: &str) -> StoreResult<PathBuf> {
        check_segment(container)?;
        if container.contains('/') {
            return Err(StoreError::InvalidKey(format!(
                "container must be a single path segment: {}",
                container
            )));
        }
        Ok(self.root.join(container))
    }

    fn object_path(&self, address: &ObjectAddress) -> StoreResult<PathBuf> {
        check_segment(&address.key)?;
        Ok(self.container_path(&address.container)?.join(&address.key))
    }
}

fn check_segment(value: &str) -> StoreResult<()> {
    let escapes = Path::new(value)
        .components()
        .any(|c| matches!(c, Component::ParentDir));
    if value.is_empty() || escapes || value.starts_with('/') {
        return Err(StoreError::InvalidKey(value.to_string()));
    }
    Ok(())
}

/// Count files under `dir` whose `/`-separated relative path starts with `prefix`.
fn count_prefixed(dir: &Path, prefix: &str, max_results: usize) -> StoreResult<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut count = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        if count >= max_results {
            break;
        }
        let entry = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
        if !entry.file_type().is_file()
            || entry.file_name().to_string_lossy().starts_with(TMP_PREFIX)
        {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if key.starts_with(prefix) {
            count += 1;
        }
    }
    Ok(count)
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get(&self, address: &ObjectAddress) -> StoreResult<Bytes> {
        let path = self.object_path(address)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(address.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn put(
        &self,
        address: &ObjectAddress,
        data: Bytes,
        _content_type: &str,
    ) -> StoreResult<()> {
        let path = self.object_path(address)?;
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::InvalidKey(address.key.clone()))?;
        fs::create_dir_all(parent).await?;

        let tmp_path = parent.join(format!("{}{}", TMP_PREFIX, Uuid::new_v4().simple()));
        if let Err(err) = write_synced(&tmp_path, &data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }
        if let Err(err) = fs::rename(&tmp_path, &path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&path).await?;
                fs::rename(&tmp_path, &path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StoreError::Io(err));
            }
        }
        tracing::debug!(path = %path.display(), size_bytes = data.len(), "Wrote object");
        Ok(())
    }

    async fn list(&self, container: &str, prefix: &str, max_results: usize) -> StoreResult<usize> {
        let dir = self.container_path(container)?;
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || count_prefixed(&dir, &prefix, max_results))
            .await
            .map_err(|e| StoreError::Backend(format!("listing task failed: {}", e)))?
    }
}
