//! In-process key-value store with switchable write failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::db::KvStore;
use crate::errors::AppError;

/// In-process store. Writes can be switched off to exercise storage failures.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
    revision: AtomicI64,
    fail_writes: AtomicBool,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put`/`remove` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StorageUnavailable {
                message: "Storage quota exceeded".to_string(),
                unsaved: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.check_writable()?;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        self.revision.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.check_writable()?;
        if self.entries.lock().await.remove(key).is_some() {
            self.revision.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn revision(&self) -> Result<i64, AppError> {
        Ok(self.revision.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_write_failure() {
        let kv = MemoryKv::new();
        kv.put("k", "v1").await.unwrap();

        kv.set_fail_writes(true);
        let err = kv.put("k", "v2").await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable { .. }));
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v1"));
        assert_eq!(kv.revision().await.unwrap(), 1);

        kv.set_fail_writes(false);
        kv.put("k", "v2").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v2"));
    }
}
