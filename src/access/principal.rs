//! Requesting principal and the group membership collaborator
//!
//! The engine trusts the identity and permission set it is handed;
//! authentication happens elsewhere. Group roles are looked up per
//! embargoed node through `GroupMembership`, which may be absent.

use crate::embargo::{NodeId, PrincipalId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// An already-authenticated (or anonymous) requester
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    /// Permission tokens held through roles
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Anonymous visitors cannot request access
    #[serde(default = "default_authenticated")]
    pub authenticated: bool,
}

fn default_authenticated() -> bool {
    true
}

impl Principal {
    /// An authenticated principal with no permissions
    pub fn new(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            permissions: BTreeSet::new(),
            authenticated: true,
        }
    }

    /// The anonymous visitor
    pub fn anonymous() -> Self {
        Self {
            id: PrincipalId(0),
            permissions: BTreeSet::new(),
            authenticated: false,
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Group role lookups for the group that owns a node.
#[async_trait]
pub trait GroupMembership: Send + Sync {
    /// Role tags `principal` holds in the group owning `node`.
    /// Not being a member is an empty set, not an error.
    async fn roles_of(&self, principal: PrincipalId, node: NodeId) -> Result<HashSet<String>>;

    /// Members of the group owning `node` that hold `role`
    async fn members_with_role(&self, node: NodeId, role: &str) -> Result<Vec<PrincipalId>>;
}

#[derive(Default)]
struct Directory {
    node_groups: HashMap<NodeId, String>,
    members: HashMap<String, HashMap<PrincipalId, HashSet<String>>>,
}

/// In-memory group directory
#[derive(Clone, Default)]
pub struct StaticGroupDirectory {
    inner: Arc<RwLock<Directory>>,
}

impl StaticGroupDirectory {
    /// Create a new empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `node` in `group`; a node belongs to at most one group
    pub async fn assign_node(&self, node: NodeId, group: impl Into<String>) {
        self.inner.write().await.node_groups.insert(node, group.into());
    }

    /// Give `principal` a role in `group`
    pub async fn add_member(
        &self,
        group: impl Into<String>,
        principal: PrincipalId,
        role: impl Into<String>,
    ) {
        self.inner
            .write()
            .await
            .members
            .entry(group.into())
            .or_default()
            .entry(principal)
            .or_default()
            .insert(role.into());
    }
}

#[async_trait]
impl GroupMembership for StaticGroupDirectory {
    async fn roles_of(&self, principal: PrincipalId, node: NodeId) -> Result<HashSet<String>> {
        let dir = self.inner.read().await;
        Ok(dir
            .node_groups
            .get(&node)
            .and_then(|group| dir.members.get(group))
            .and_then(|members| members.get(&principal))
            .cloned()
            .unwrap_or_default())
    }

    async fn members_with_role(&self, node: NodeId, role: &str) -> Result<Vec<PrincipalId>> {
        let dir = self.inner.read().await;
        let mut members: Vec<PrincipalId> = dir
            .node_groups
            .get(&node)
            .and_then(|group| dir.members.get(group))
            .map(|members| {
                members
                    .iter()
                    .filter(|(_, roles)| roles.contains(role))
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default();
        members.sort();
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_permissions() {
        let principal = Principal::new(4u64).with_permission("bypass embargoes restrictions");
        assert!(principal.has_permission("bypass embargoes restrictions"));
        assert!(!principal.has_permission("administer nodes"));
        assert!(!Principal::anonymous().authenticated);
    }

    #[tokio::test]
    async fn test_directory_roles() {
        let dir = StaticGroupDirectory::new();
        dir.assign_node(NodeId(1), "project-a").await;
        dir.add_member("project-a", PrincipalId(5), "project_group-editor")
            .await;
        dir.add_member("project-a", PrincipalId(6), "project_group-administrator")
            .await;
        dir.add_member("project-b", PrincipalId(7), "project_group-administrator")
            .await;

        let roles = dir.roles_of(PrincipalId(5), NodeId(1)).await.unwrap();
        assert!(roles.contains("project_group-editor"));
        assert!(dir.roles_of(PrincipalId(7), NodeId(1)).await.unwrap().is_empty());
        assert!(dir.roles_of(PrincipalId(5), NodeId(2)).await.unwrap().is_empty());

        let admins = dir
            .members_with_role(NodeId(1), "project_group-administrator")
            .await
            .unwrap();
        assert_eq!(admins, vec![PrincipalId(6)]);
    }
}
