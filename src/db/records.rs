//! Per-identity grievance lists merged with the reference dataset.

use std::sync::Arc;

use crate::db::KvStore;
use crate::errors::AppError;
use crate::models::{reference_grievances, Grievance};

/// Storage key for an identity's private grievance list.
pub fn grievances_key(contact_key: &str) -> String {
    format!("hp_grievances_{}", contact_key)
}

/// Durable grievance lists, partitioned by contact key.
///
/// Every mutating call is a full read-modify-write of one partition. There is
/// no locking: concurrent writers to the same partition resolve as last
/// writer wins.
#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KvStore>,
    reference: Arc<Vec<Grievance>>,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_reference(kv, reference_grievances().to_vec())
    }

    pub fn with_reference(kv: Arc<dyn KvStore>, reference: Vec<Grievance>) -> Self {
        Self {
            kv,
            reference: Arc::new(reference),
        }
    }

    /// Current store revision, reported in API envelopes.
    pub async fn revision(&self) -> Result<i64, AppError> {
        self.kv.revision().await
    }

    async fn load_private(&self, contact_key: &str) -> Result<Vec<Grievance>, AppError> {
        match self.kv.get(&grievances_key(contact_key)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn store_private(&self, contact_key: &str, list: &[Grievance]) -> Result<(), AppError> {
        let raw = serde_json::to_string(list)?;
        self.kv.put(&grievances_key(contact_key), &raw).await
    }

    /// Private records first, then the reference dataset. No deduplication
    /// and no sorting.
    pub async fn list_for(&self, contact_key: &str) -> Result<Vec<Grievance>, AppError> {
        let mut all = self.load_private(contact_key).await?;
        all.extend(self.reference.iter().cloned());
        Ok(all)
    }

    /// Look a grievance up in the merged view; private records shadow
    /// reference records with the same id.
    pub async fn find(&self, contact_key: &str, id: &str) -> Result<Grievance, AppError> {
        self.list_for(contact_key)
            .await?
            .into_iter()
            .find(|g| g.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Grievance {} not found", id)))
    }

    /// Prepend a grievance to the identity's private list.
    pub async fn append(&self, contact_key: &str, grievance: Grievance) -> Result<(), AppError> {
        let mut list = match self.load_private(contact_key).await {
            Ok(list) => list,
            Err(e) => return Err(e.with_unsaved(grievance)),
        };
        list.insert(0, grievance);

        if let Err(e) = self.store_private(contact_key, &list).await {
            tracing::error!("Failed to persist new grievance {}: {}", list[0].id, e);
            return Err(e.with_unsaved(list.swap_remove(0)));
        }

        tracing::debug!(
            "Stored grievance {} ({} private records)",
            list[0].id,
            list.len()
        );
        Ok(())
    }

    /// Replace the private entry with the given id.
    ///
    /// Returns `Ok(false)` without writing when the id only exists in the
    /// reference dataset (or nowhere): reference records are not stored per
    /// identity, so there is nothing to replace.
    pub async fn replace_one(
        &self,
        contact_key: &str,
        grievance_id: &str,
        updated: Grievance,
    ) -> Result<bool, AppError> {
        let mut list = match self.load_private(contact_key).await {
            Ok(list) => list,
            Err(e) => return Err(e.with_unsaved(updated)),
        };

        let Some(slot) = list.iter_mut().find(|g| g.id == grievance_id) else {
            tracing::debug!(
                "Grievance {} is not privately stored; update not persisted",
                grievance_id
            );
            return Ok(false);
        };
        *slot = updated.clone();

        if let Err(e) = self.store_private(contact_key, &list).await {
            tracing::error!("Failed to persist grievance {}: {}", grievance_id, e);
            return Err(e.with_unsaved(updated));
        }
        Ok(true)
    }
}
