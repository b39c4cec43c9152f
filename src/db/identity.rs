//! Persistence of the active identity across restarts.

use std::sync::Arc;

use crate::db::KvStore;
use crate::errors::AppError;
use crate::models::Identity;

/// Storage key of the active identity record.
pub const IDENTITY_KEY: &str = "hp_user";

#[derive(Clone)]
pub struct IdentityStore {
    kv: Arc<dyn KvStore>,
}

impl IdentityStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Load the identity saved by a previous process, if any.
    ///
    /// An unreadable record is logged and treated as signed out.
    pub async fn restore(&self) -> Result<Option<Identity>, AppError> {
        let Some(raw) = self.kv.get(IDENTITY_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable stored identity: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, identity: &Identity) -> Result<(), AppError> {
        let raw = serde_json::to_string(identity)?;
        self.kv.put(IDENTITY_KEY, &raw).await
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        self.kv.remove(IDENTITY_KEY).await
    }
}
