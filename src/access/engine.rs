//! Embargo resolution engine
//!
//! Composes the resolver, the temporal filter and the exemption policy
//! into a single decision per (resource, principal):
//!
//! ```text
//! resource ─► owning nodes ─► current embargoes ─► kind scope ─► exemptions ─► Decision
//! ```
//!
//! Node views are only restricted by whole-resource embargoes; files and
//! media are restricted by both kinds. Decisions are computed fresh on
//! every call and never cached here.

use super::policy::{ExemptionPolicy, ExemptionReason};
use super::principal::{GroupMembership, Principal};
use crate::config::EmbargoConfig;
use crate::embargo::{
    current_embargoes_at, EmbargoId, EmbargoKind, EmbargoRecord, EmbargoRepository, NodeId,
    ResourceKind, ResourceRef,
};
use crate::error::{Error, Result};
use crate::graph::{ContentGraph, GraphResolver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// One current embargo in scope for a resource, with the principal's exemptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbargoAssessment {
    pub embargo: EmbargoRecord,
    /// Empty when the embargo applies to the principal
    pub exemptions: BTreeSet<ExemptionReason>,
}

impl EmbargoAssessment {
    pub fn is_exempt(&self) -> bool {
        !self.exemptions.is_empty()
    }
}

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub resource: ResourceRef,
    pub is_restricted: bool,
    /// Embargoes currently blocking the principal
    pub applicable: BTreeSet<EmbargoId>,
    /// Every current, in-scope embargo, exempt or not
    pub assessments: Vec<EmbargoAssessment>,
    /// Nodes the resource resolved to
    pub owning_nodes: BTreeSet<NodeId>,
}

/// What a decision was derived from, for external cache keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionDependencies {
    pub nodes: BTreeSet<NodeId>,
    /// `(embargo, version)` pairs
    pub embargoes: Vec<(EmbargoId, u64)>,
}

impl Decision {
    /// A decision for a resource nothing governs
    pub fn unrestricted(resource: ResourceRef) -> Self {
        Self {
            resource,
            is_restricted: false,
            applicable: BTreeSet::new(),
            assessments: Vec::new(),
            owning_nodes: BTreeSet::new(),
        }
    }

    /// Records currently blocking the principal
    pub fn applicable_embargoes(&self) -> impl Iterator<Item = &EmbargoRecord> {
        self.assessments
            .iter()
            .filter(|a| !a.is_exempt())
            .map(|a| &a.embargo)
    }

    pub fn dependencies(&self) -> DecisionDependencies {
        DecisionDependencies {
            nodes: self.owning_nodes.clone(),
            embargoes: self
                .assessments
                .iter()
                .map(|a| (a.embargo.id, a.embargo.version))
                .collect(),
        }
    }
}

/// Whether an embargo of `embargo` kind restricts a resource of `resource` kind
pub fn restricts(resource: ResourceKind, embargo: EmbargoKind) -> bool {
    match resource {
        ResourceKind::Node => embargo == EmbargoKind::WholeResource,
        ResourceKind::File | ResourceKind::Media => true,
    }
}

/// The embargo resolution engine
#[derive(Clone)]
pub struct EmbargoEngine {
    config: Arc<EmbargoConfig>,
    resolver: GraphResolver,
    repository: Arc<dyn EmbargoRepository>,
    policy: ExemptionPolicy,
}

impl EmbargoEngine {
    pub fn builder() -> EmbargoEngineBuilder {
        EmbargoEngineBuilder::new()
    }

    pub fn config(&self) -> &EmbargoConfig {
        &self.config
    }

    pub fn resolver(&self) -> &GraphResolver {
        &self.resolver
    }

    pub fn repository(&self) -> &dyn EmbargoRepository {
        self.repository.as_ref()
    }

    pub fn policy(&self) -> &ExemptionPolicy {
        &self.policy
    }

    /// A checker bound to one resource kind
    pub fn access(&self, kind: ResourceKind) -> EmbargoedAccess {
        EmbargoedAccess {
            kind,
            engine: self.clone(),
        }
    }

    /// Owning nodes of `resource`
    pub async fn resolve_owning_nodes(&self, resource: ResourceRef) -> Result<BTreeSet<NodeId>> {
        self.resolver.resolve_owning_nodes(resource).await
    }

    /// Decide access to `resource` for `principal` as of now
    pub async fn decide(&self, resource: ResourceRef, principal: &Principal) -> Result<Decision> {
        self.decide_at(resource, principal, Utc::now()).await
    }

    /// Decide access to `resource` for `principal` as of `now`
    pub async fn decide_at(
        &self,
        resource: ResourceRef,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        let owning_nodes = self.resolver.resolve_owning_nodes(resource).await?;
        if owning_nodes.is_empty() {
            tracing::debug!(resource = %resource, "No owning node, access unrestricted");
            return Ok(Decision::unrestricted(resource));
        }

        let kind = resource.kind();
        let current = current_embargoes_at(&owning_nodes, self.repository.as_ref(), now).await?;
        let in_scope: Vec<EmbargoRecord> = current
            .into_iter()
            .filter(|embargo| restricts(kind, embargo.kind))
            .collect();
        let assessments = self.assess(in_scope, principal).await;

        let applicable: BTreeSet<EmbargoId> = assessments
            .iter()
            .filter(|a| !a.is_exempt())
            .map(|a| a.embargo.id)
            .collect();
        let is_restricted = !applicable.is_empty();

        tracing::debug!(
            resource = %resource,
            principal = %principal.id,
            in_scope = assessments.len(),
            applicable = applicable.len(),
            restricted = is_restricted,
            "Embargo decision"
        );

        Ok(Decision {
            resource,
            is_restricted,
            applicable,
            assessments,
            owning_nodes,
        })
    }

    /// Evaluate exemptions for each embargo, preserving order
    pub async fn assess(
        &self,
        embargoes: Vec<EmbargoRecord>,
        principal: &Principal,
    ) -> Vec<EmbargoAssessment> {
        let mut assessments = Vec::with_capacity(embargoes.len());
        for embargo in embargoes {
            let exemptions = self.policy.exemption_reasons(&embargo, principal).await;
            assessments.push(EmbargoAssessment {
                embargo,
                exemptions,
            });
        }
        assessments
    }
}

/// Access checker for a single resource kind.
///
/// Handing it a resource of another kind is a programming error and is
/// reported, never answered with a neutral decision.
#[derive(Clone)]
pub struct EmbargoedAccess {
    kind: ResourceKind,
    engine: EmbargoEngine,
}

impl EmbargoedAccess {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Decide whether `resource` is actively embargoed against `principal`
    pub async fn is_actively_embargoed(
        &self,
        resource: ResourceRef,
        principal: &Principal,
    ) -> Result<Decision> {
        self.is_actively_embargoed_at(resource, principal, Utc::now())
            .await
    }

    pub async fn is_actively_embargoed_at(
        &self,
        resource: ResourceRef,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        self.check_kind(resource)?;
        self.engine.decide_at(resource, principal, now).await
    }

    fn check_kind(&self, resource: ResourceRef) -> Result<()> {
        if resource.kind() != self.kind {
            return Err(Error::InvalidResourceKind {
                expected: self.kind,
                actual: resource.kind(),
                id: resource.raw_id().to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for `EmbargoEngine`
#[derive(Default)]
pub struct EmbargoEngineBuilder {
    config: Option<EmbargoConfig>,
    repository: Option<Arc<dyn EmbargoRepository>>,
    graph: Option<Arc<dyn ContentGraph>>,
    groups: Option<Arc<dyn GroupMembership>>,
}

impl EmbargoEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EmbargoConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn repository(mut self, repository: Arc<dyn EmbargoRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn graph(mut self, graph: Arc<dyn ContentGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Optional; without it group roles never exempt
    pub fn groups(mut self, groups: Arc<dyn GroupMembership>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn build(self) -> Result<EmbargoEngine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let repository = self
            .repository
            .ok_or_else(|| Error::Config("embargo repository is required".into()))?;
        let graph = self
            .graph
            .ok_or_else(|| Error::Config("content graph is required".into()))?;

        if self.groups.is_none() {
            tracing::debug!("No group membership service, group roles will not exempt");
        }

        Ok(EmbargoEngine {
            resolver: GraphResolver::new(graph, config.graph.clone()),
            policy: ExemptionPolicy::new(&config, self.groups),
            repository,
            config: Arc::new(config),
        })
    }
}
