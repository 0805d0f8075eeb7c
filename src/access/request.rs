//! Access-request routing
//!
//! When a principal is blocked, a request for access goes to the
//! administrators of the group owning each blocking embargo's node.
//! Composing and sending the request is left to the caller.

use super::engine::{Decision, EmbargoEngine};
use super::principal::Principal;
use crate::embargo::{EmbargoId, NodeId, PrincipalId, ResourceRef};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where one access request should be sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequestTarget {
    pub embargo: EmbargoId,
    /// Node the embargo governs
    pub node: NodeId,
    /// Group administrators who may grant an exemption; empty without groups
    pub administrators: Vec<PrincipalId>,
}

impl EmbargoEngine {
    /// One target per embargo currently blocking `principal` from `resource`
    pub async fn access_request_targets(
        &self,
        resource: ResourceRef,
        principal: &Principal,
    ) -> Result<Vec<AccessRequestTarget>> {
        self.access_request_targets_at(resource, principal, Utc::now())
            .await
    }

    pub async fn access_request_targets_at(
        &self,
        resource: ResourceRef,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Vec<AccessRequestTarget>> {
        let decision = self.decide_at(resource, principal, now).await?;
        Ok(self.access_request_targets_for(&decision).await)
    }

    /// Targets for the embargoes blocking an already computed decision
    pub async fn access_request_targets_for(&self, decision: &Decision) -> Vec<AccessRequestTarget> {
        let mut targets = Vec::with_capacity(decision.applicable.len());
        for embargo in decision.applicable_embargoes() {
            let administrators = self.policy().administrators_of(embargo.owning_node).await;
            if administrators.is_empty() {
                tracing::debug!(
                    embargo = %embargo.id,
                    node = %embargo.owning_node,
                    "No group administrators to route access request to"
                );
            }
            targets.push(AccessRequestTarget {
                embargo: embargo.id,
                node: embargo.owning_node,
                administrators,
            });
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::StaticGroupDirectory;
    use crate::embargo::{EmbargoKind, EmbargoRecord, FileId, InMemoryEmbargoStore};
    use crate::graph::{FileUsage, InMemoryContentGraph};
    use std::sync::Arc;

    async fn engine(with_groups: bool) -> (EmbargoEngine, InMemoryEmbargoStore) {
        let store = InMemoryEmbargoStore::new();
        store
            .upsert(EmbargoRecord::new(EmbargoId(1), NodeId(1), EmbargoKind::FilesOnly))
            .await;
        store
            .upsert(EmbargoRecord::new(EmbargoId(2), NodeId(2), EmbargoKind::WholeResource))
            .await;

        let graph = InMemoryContentGraph::new();
        graph.add_file_usage(FileId(1), FileUsage::Node(NodeId(1))).await;
        graph.add_file_usage(FileId(1), FileUsage::Node(NodeId(2))).await;

        let groups = StaticGroupDirectory::new();
        groups.assign_node(NodeId(1), "alpha").await;
        groups
            .add_member("alpha", PrincipalId(40), "project_group-administrator")
            .await;
        groups
            .add_member("alpha", PrincipalId(41), "project_group-editor")
            .await;

        let mut builder = EmbargoEngine::builder()
            .repository(Arc::new(store.clone()))
            .graph(Arc::new(graph));
        if with_groups {
            builder = builder.groups(Arc::new(groups));
        }
        (builder.build().unwrap(), store)
    }

    #[tokio::test]
    async fn test_targets_per_blocking_embargo() {
        let (engine, _) = engine(true).await;
        let targets = engine
            .access_request_targets(ResourceRef::File(FileId(1)), &Principal::new(7u64))
            .await
            .unwrap();

        assert_eq!(
            targets,
            vec![
                AccessRequestTarget {
                    embargo: EmbargoId(1),
                    node: NodeId(1),
                    administrators: vec![PrincipalId(40)],
                },
                AccessRequestTarget {
                    embargo: EmbargoId(2),
                    node: NodeId(2),
                    administrators: vec![],
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_no_targets_when_exempt() {
        let (engine, store) = engine(false).await;
        store.grant_exemption(EmbargoId(1), PrincipalId(7)).await.unwrap();
        store.grant_exemption(EmbargoId(2), PrincipalId(7)).await.unwrap();

        let targets = engine
            .access_request_targets(ResourceRef::File(FileId(1)), &Principal::new(7u64))
            .await
            .unwrap();
        assert!(targets.is_empty());
    }

    #[tokio::test]
    async fn test_targets_follow_the_given_decision() {
        let (engine, store) = engine(true).await;
        let decision = engine
            .decide(ResourceRef::File(FileId(1)), &Principal::new(7u64))
            .await
            .unwrap();

        // Later exemptions do not change targets built from the earlier decision
        store.grant_exemption(EmbargoId(1), PrincipalId(7)).await.unwrap();
        let targets = engine.access_request_targets_for(&decision).await;
        assert_eq!(
            targets.iter().map(|t| t.embargo).collect::<Vec<_>>(),
            vec![EmbargoId(1), EmbargoId(2)]
        );

        let unrestricted = Decision::unrestricted(ResourceRef::File(FileId(9)));
        assert!(engine.access_request_targets_for(&unrestricted).await.is_empty());
    }

    #[tokio::test]
    async fn test_targets_without_groups_have_no_administrators() {
        let (engine, _) = engine(false).await;
        let targets = engine
            .access_request_targets(ResourceRef::File(FileId(1)), &Principal::new(7u64))
            .await
            .unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| t.administrators.is_empty()));
    }
}
