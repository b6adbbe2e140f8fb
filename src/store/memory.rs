//! In-memory object store.
//!
//! Objects live in a `HashMap` behind a `Mutex`. Every call is appended to an
//! operation log so tests can assert exactly which store calls a resize made,
//! and a one-shot fault can be armed per operation kind.

use super::{ObjectStore, StoreError, StoreResult};
use crate::address::ObjectAddress;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// A call recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get(ObjectAddress),
    Put {
        address: ObjectAddress,
        content_type: String,
        len: usize,
    },
    List {
        container: String,
        prefix: String,
        max_results: usize,
    },
}

/// Which operation a fault injected with [`MemoryStore::fail_next`] hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Get,
    Put,
    List,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<ObjectAddress, StoredObject>>,
    operations: Mutex<Vec<StoreOp>>,
    faults: Mutex<Vec<OpKind>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording an operation.
    pub fn insert(&self, address: ObjectAddress, data: impl Into<Bytes>, content_type: &str) {
        self.lock_objects().insert(
            address,
            StoredObject {
                data: data.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn object(&self, address: &ObjectAddress) -> Option<StoredObject> {
        self.lock_objects().get(address).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations
            .lock()
            .map(|ops| ops.clone())
            .unwrap_or_default()
    }

    /// Number of recorded writes.
    pub fn put_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, StoreOp::Put { .. }))
            .count()
    }

    /// Make the next call of `kind` fail with a backend error.
    pub fn fail_next(&self, kind: OpKind) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(kind);
        }
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, HashMap<ObjectAddress, StoredObject>> {
        // A poisoned map is still structurally valid; keep serving it.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, op: StoreOp, kind: OpKind) -> StoreResult<()> {
        if let Ok(mut ops) = self.operations.lock() {
            ops.push(op);
        }
        let mut faults = self
            .faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(pos) = faults.iter().position(|k| *k == kind) {
            faults.remove(pos);
            return Err(StoreError::Backend(format!("injected {:?} failure", kind)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, address: &ObjectAddress) -> StoreResult<Bytes> {
        self.record(StoreOp::Get(address.clone()), OpKind::Get)?;
        self.lock_objects()
            .get(address)
            .map(|obj| obj.data.clone())
            .ok_or_else(|| StoreError::NotFound(address.to_string()))
    }

    async fn put(
        &self,
        address: &ObjectAddress,
        data: Bytes,
        content_type: &str,
    ) -> StoreResult<()> {
        self.record(
            StoreOp::Put {
                address: address.clone(),
                content_type: content_type.to_string(),
                len: data.len(),
            },
            OpKind::Put,
        )?;
        self.insert(address.clone(), data, content_type);
        Ok(())
    }

    async fn list(&self, container: &str, prefix: &str, max_results: usize) -> StoreResult<usize> {
        self.record(
            StoreOp::List {
                container: container.to_string(),
                prefix: prefix.to_string(),
                max_results,
            },
            OpKind::List,
        )?;
        let count = self
            .lock_objects()
            .keys()
            .filter(|addr| addr.container == container && addr.key.starts_with(prefix))
            .take(max_results)
            .count();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(key: &str) -> ObjectAddress {
        ObjectAddress::new("bucket", key)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryStore::new();
        store
            .put(&addr("a.png"), Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert_eq!(store.get(&addr("a.png")).await.unwrap(), &b"png"[..]);
        assert_eq!(store.object(&addr("a.png")).unwrap().content_type, "image/png");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get(&addr("missing.jpg")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref s) if s == "s3://bucket/missing.jpg"));
    }

    #[tokio::test]
    async fn list_counts_prefix_matches_up_to_limit() {
        let store = MemoryStore::new();
        store.insert(addr("thumbnail/a.jpg"), "1", "image/jpeg");
        store.insert(addr("thumbnail/a.jpg.bak"), "2", "image/jpeg");
        store.insert(addr("other/a.jpg"), "3", "image/jpeg");
        store.insert(ObjectAddress::new("elsewhere", "thumbnail/a.jpg"), "4", "image/jpeg");

        assert_eq!(store.list("bucket", "thumbnail/a.jpg", 1).await.unwrap(), 1);
        assert_eq!(store.list("bucket", "thumbnail/a.jpg", 10).await.unwrap(), 2);
        assert_eq!(store.list("bucket", "thumbnail/b", 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn operations_are_recorded_in_order() {
        let store = MemoryStore::new();
        let _ = store.get(&addr("x")).await;
        let _ = store.list("bucket", "x", 1).await;
        assert_eq!(
            store.operations(),
            vec![
                StoreOp::Get(addr("x")),
                StoreOp::List {
                    container: "bucket".into(),
                    prefix: "x".into(),
                    max_results: 1
                }
            ]
        );
    }

    #[tokio::test]
    async fn injected_fault_fires_once() {
        let store = MemoryStore::new();
        store.fail_next(OpKind::Put);
        let first = store.put(&addr("k"), Bytes::new(), "image/png").await;
        assert!(matches!(first, Err(StoreError::Backend(_))));
        assert!(store.is_empty());
        store.put(&addr("k"), Bytes::new(), "image/png").await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.put_count(), 2);
    }
}
