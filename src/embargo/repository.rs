//! Embargo repository interface and in-memory store
//!
//! The engine only reads embargo records. `EmbargoRepository` is the
//! narrow read interface it depends on; `InMemoryEmbargoStore` implements
//! it on top of `tokio::sync::RwLock` and also carries the authoring
//! operations (upsert, grant, revoke) that bump record versions.

use super::exemption::ExemptionChange;
use super::types::{EmbargoId, EmbargoRecord, NodeId, PrincipalId, StoredEmbargo};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Read access to embargo records.
#[async_trait]
pub trait EmbargoRepository: Send + Sync {
    /// Ids of every embargo whose owning node is `node`, current or not.
    async fn embargo_ids_for_node(&self, node: NodeId) -> Result<Vec<EmbargoId>>;

    /// Load one record. `Ok(None)` means the id is unknown.
    async fn load(&self, id: EmbargoId) -> Result<Option<EmbargoRecord>>;
}

/// In-memory embargo store
#[derive(Clone)]
pub struct InMemoryEmbargoStore {
    records: Arc<RwLock<HashMap<EmbargoId, EmbargoRecord>>>,
}

impl InMemoryEmbargoStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert or replace a record.
    ///
    /// Replacing an existing record bumps its version past the stored one.
    pub async fn upsert(&self, mut record: EmbargoRecord) -> EmbargoId {
        let id = record.id;
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&id) {
            record.version = record.version.max(existing.version + 1);
        }
        records.insert(id, record);
        id
    }

    /// Convert and insert a raw stored record
    pub async fn insert_stored(&self, raw: StoredEmbargo) -> Result<EmbargoId> {
        let record = EmbargoRecord::try_from(raw)?;
        Ok(self.upsert(record).await)
    }

    /// Remove a record, returning it if it existed
    pub async fn remove(&self, id: EmbargoId) -> Option<EmbargoRecord> {
        self.records.write().await.remove(&id)
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Grant `principal` an explicit exemption from embargo `id`
    pub async fn grant_exemption(
        &self,
        id: EmbargoId,
        principal: PrincipalId,
    ) -> Result<ExemptionChange> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| Error::Repository(format!("embargo {} not found", id)))?;
        let change = record.grant_exemption(principal);
        if change.is_effective() {
            record.version += 1;
            tracing::info!(embargo = %id, principal = %principal, "Granted embargo exemption");
        }
        Ok(change)
    }

    /// Withdraw an explicit exemption from embargo `id`
    pub async fn revoke_exemption(
        &self,
        id: EmbargoId,
        principal: PrincipalId,
    ) -> Result<ExemptionChange> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| Error::Repository(format!("embargo {} not found", id)))?;
        let change = record.revoke_exemption(principal);
        if change.is_effective() {
            record.version += 1;
            tracing::info!(embargo = %id, principal = %principal, "Revoked embargo exemption");
        }
        Ok(change)
    }
}

impl Default for InMemoryEmbargoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbargoRepository for InMemoryEmbargoStore {
    async fn embargo_ids_for_node(&self, node: NodeId) -> Result<Vec<EmbargoId>> {
        let mut ids: Vec<EmbargoId> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.owning_node == node)
            .map(|r| r.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn load(&self, id: EmbargoId) -> Result<Option<EmbargoRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }
}
