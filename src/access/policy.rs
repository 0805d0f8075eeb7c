//! Exemption policy: does an embargo bypass a given principal
//!
//! A principal is exempt from an embargo if any of these hold:
//! - they are on the embargo's explicit exemption list
//! - they hold the bypass permission
//! - they administer the group owning the embargoed node
//! - they are an editor in that group
//!
//! Group lookups fail closed: a missing, disabled or failing group
//! collaborator contributes no exemption.

use super::principal::{GroupMembership, Principal};
use crate::config::{EmbargoConfig, GroupConfig};
use crate::embargo::{EmbargoRecord, NodeId, PrincipalId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Why a principal is exempt from an embargo
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionReason {
    /// Listed on the embargo itself
    Explicit,
    /// Holds the bypass permission
    BypassPermission,
    /// Administrator of the owning group
    GroupAdministrator,
    /// Editor in the owning group
    GroupEditor,
}

/// Evaluates exemptions for one principal against one embargo
#[derive(Clone)]
pub struct ExemptionPolicy {
    bypass_permission: String,
    group_config: GroupConfig,
    groups: Option<Arc<dyn GroupMembership>>,
}

impl ExemptionPolicy {
    pub fn new(config: &EmbargoConfig, groups: Option<Arc<dyn GroupMembership>>) -> Self {
        Self {
            bypass_permission: config.bypass_permission.clone(),
            group_config: config.groups.clone(),
            groups,
        }
    }

    /// Whether group roles can ever contribute an exemption
    pub fn groups_available(&self) -> bool {
        self.group_config.enabled && self.groups.is_some()
    }

    /// True iff any exemption condition holds.
    ///
    /// Checks that need no lookup run first.
    pub async fn is_exempt(&self, embargo: &EmbargoRecord, principal: &Principal) -> bool {
        if embargo.lists_exempt(principal.id) || principal.has_permission(&self.bypass_permission)
        {
            return true;
        }
        let roles = self.group_roles(principal, embargo.owning_node).await;
        roles.contains(&self.group_config.administrator_role)
            || roles.contains(&self.group_config.editor_role)
    }

    /// Every exemption condition that holds
    pub async fn exemption_reasons(
        &self,
        embargo: &EmbargoRecord,
        principal: &Principal,
    ) -> BTreeSet<ExemptionReason> {
        let mut reasons = BTreeSet::new();
        if embargo.lists_exempt(principal.id) {
            reasons.insert(ExemptionReason::Explicit);
        }
        if principal.has_permission(&self.bypass_permission) {
            reasons.insert(ExemptionReason::BypassPermission);
        }
        let roles = self.group_roles(principal, embargo.owning_node).await;
        if roles.contains(&self.group_config.administrator_role) {
            reasons.insert(ExemptionReason::GroupAdministrator);
        }
        if roles.contains(&self.group_config.editor_role) {
            reasons.insert(ExemptionReason::GroupEditor);
        }
        reasons
    }

    /// Group roles of `principal` on `node`; empty when unavailable
    pub async fn group_roles(&self, principal: &Principal, node: NodeId) -> HashSet<String> {
        if !self.group_config.enabled {
            return HashSet::new();
        }
        let Some(groups) = &self.groups else {
            return HashSet::new();
        };
        match groups.roles_of(principal.id, node).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!(
                    principal = %principal.id,
                    node = %node,
                    "Group role lookup failed, treating as no roles: {}",
                    e
                );
                HashSet::new()
            }
        }
    }

    /// Members administering the group that owns `node`
    pub async fn administrators_of(&self, node: NodeId) -> Vec<PrincipalId> {
        if !self.group_config.enabled {
            return Vec::new();
        }
        let Some(groups) = &self.groups else {
            return Vec::new();
        };
        match groups
            .members_with_role(node, &self.group_config.administrator_role)
            .await
        {
            Ok(admins) => admins,
            Err(e) => {
                tracing::warn!(node = %node, "Group administrator lookup failed: {}", e);
                Vec::new()
            }
        }
    }
}
