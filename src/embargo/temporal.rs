//! Temporal filter: which embargoes on a set of nodes are in force now
//!
//! Independent of any principal. Lookups for different nodes, and the
//! record loads that follow, are issued concurrently.

use super::repository::EmbargoRepository;
use super::types::{EmbargoId, EmbargoRecord, NodeId};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};

/// Current embargoes governing any of `nodes`, as of `now`.
///
/// The result is deduplicated by embargo id and ordered by id. Records
/// that were listed but cannot be loaded, or that the repository reports
/// as malformed, are logged and left out.
pub async fn current_embargoes_at(
    nodes: &BTreeSet<NodeId>,
    repo: &dyn EmbargoRepository,
    now: DateTime<Utc>,
) -> Result<Vec<EmbargoRecord>> {
    let listed = try_join_all(nodes.iter().map(|node| repo.embargo_ids_for_node(*node))).await?;
    let ids: BTreeSet<EmbargoId> = listed.into_iter().flatten().collect();

    let loaded = try_join_all(ids.iter().map(|id| load_checked(repo, *id))).await?;

    let current: BTreeMap<EmbargoId, EmbargoRecord> = loaded
        .into_iter()
        .flatten()
        .filter(|record| record.is_current_at(now))
        .map(|record| (record.id, record))
        .collect();

    tracing::debug!(
        nodes = nodes.len(),
        listed = ids.len(),
        current = current.len(),
        "Filtered current embargoes"
    );
    Ok(current.into_values().collect())
}

/// Current embargoes governing any of `nodes`, as of now
pub async fn current_embargoes(
    nodes: &BTreeSet<NodeId>,
    repo: &dyn EmbargoRepository,
) -> Result<Vec<EmbargoRecord>> {
    current_embargoes_at(nodes, repo, Utc::now()).await
}

/// Ids only, for callers that do not need the records
pub async fn current_embargo_ids(
    nodes: &BTreeSet<NodeId>,
    repo: &dyn EmbargoRepository,
    now: DateTime<Utc>,
) -> Result<BTreeSet<EmbargoId>> {
    Ok(current_embargoes_at(nodes, repo, now)
        .await?
        .into_iter()
        .map(|record| record.id)
        .collect())
}

async fn load_checked(repo: &dyn EmbargoRepository, id: EmbargoId) -> Result<Option<EmbargoRecord>> {
    match repo.load(id).await {
        Ok(Some(record)) => Ok(Some(record)),
        Ok(None) => {
            let err = Error::Integrity {
                embargo: id,
                reason: "listed for a node but could not be loaded".to_string(),
            };
            tracing::warn!("Excluding embargo from decision: {}", err);
            Ok(None)
        }
        Err(err @ (Error::Integrity { .. } | Error::InvalidRecord { .. })) => {
            tracing::warn!("Excluding embargo from decision: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embargo::{EmbargoKind, InMemoryEmbargoStore};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn nodes(ids: &[u64]) -> BTreeSet<NodeId> {
        ids.iter().copied().map(NodeId).collect()
    }

    async fn seeded() -> InMemoryEmbargoStore {
        let store = InMemoryEmbargoStore::new();
        store
            .upsert(EmbargoRecord::new(EmbargoId(1), NodeId(1), EmbargoKind::FilesOnly))
            .await;
        store
            .upsert(
                EmbargoRecord::new(EmbargoId(2), NodeId(1), EmbargoKind::WholeResource)
                    .with_expiration(now() - Duration::seconds(1)),
            )
            .await;
        store
            .upsert(
                EmbargoRecord::new(EmbargoId(3), NodeId(2), EmbargoKind::WholeResource)
                    .with_expiration(now() + Duration::seconds(1)),
            )
            .await;
        store
    }

    #[tokio::test]
    async fn test_filters_expired() {
        let store = seeded().await;
        let ids = current_embargo_ids(&nodes(&[1, 2]), &store, now()).await.unwrap();
        assert_eq!(ids, [EmbargoId(1), EmbargoId(3)].into_iter().collect());
    }

    #[tokio::test]
    async fn test_empty_nodes() {
        let store = seeded().await;
        let current = current_embargoes_at(&BTreeSet::new(), &store, now())
            .await
            .unwrap();
        assert!(current.is_empty());
    }

    struct Dangling;

    #[async_trait]
    impl EmbargoRepository for Dangling {
        async fn embargo_ids_for_node(&self, node: NodeId) -> Result<Vec<EmbargoId>> {
            Ok(vec![EmbargoId(node.0), EmbargoId(99), EmbargoId(100)])
        }

        async fn load(&self, id: EmbargoId) -> Result<Option<EmbargoRecord>> {
            match id.0 {
                99 => Ok(None),
                100 => Err(Error::InvalidRecord {
                    embargo: id,
                    reason: "unknown embargo type 4".into(),
                }),
                n => Ok(Some(EmbargoRecord::new(id, NodeId(n), EmbargoKind::WholeResource))),
            }
        }
    }

    #[tokio::test]
    async fn test_integrity_problems_are_excluded() {
        let current = current_embargoes_at(&nodes(&[5, 6]), &Dangling, now())
            .await
            .unwrap();
        let ids: Vec<EmbargoId> = current.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![EmbargoId(5), EmbargoId(6)]);
    }

    struct Down;

    #[async_trait]
    impl EmbargoRepository for Down {
        async fn embargo_ids_for_node(&self, _node: NodeId) -> Result<Vec<EmbargoId>> {
            Err(Error::Repository("connection refused".into()))
        }

        async fn load(&self, _id: EmbargoId) -> Result<Option<EmbargoRecord>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_repository_failure_propagates() {
        let err = current_embargoes_at(&nodes(&[1]), &Down, now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Repository(_)));
    }
}
