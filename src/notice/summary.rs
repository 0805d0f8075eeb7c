//! Embargo notification summary for a node
//!
//! Lists every embargo currently in force on a node, whatever its kind
//! and whether or not the viewer is exempt, along with whether the
//! viewer may ask for access.

use super::messages::{compose_notice_messages, format_date};
use crate::access::{
    DecisionDependencies, EmbargoAssessment, EmbargoEngine, ExemptionReason, Principal,
};
use crate::config::MessageConfig;
use crate::embargo::{current_embargoes_at, EmbargoId, EmbargoKind, NodeId};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One embargo as shown in a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbargoNotice {
    pub embargo: EmbargoId,
    pub version: u64,
    /// "Files" or "Node"
    pub type_label: String,
    pub type_message: String,
    /// Policy-listing label, "Disallow Access To: Resource Files" or
    /// "Disallow Access To: Resource"
    pub disallow_label: String,
    /// "Duration: Indefinite" or "Duration: Until <date>"
    pub duration: String,
    pub has_duration: bool,
    /// Explicitly exempt or administering the owning group
    pub user_exempt: bool,
}

/// Notification summary for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeSummary {
    pub node: NodeId,
    pub header: String,
    /// Header of the policy listing, "This resource has N embargo(es):"
    pub policies_header: String,
    pub embargoes: Vec<EmbargoNotice>,
    /// Authenticated and not exempt from at least one embargo
    pub can_request_access: bool,
}

impl NoticeSummary {
    /// Build from assessed embargoes; `None` when there are none
    pub fn from_assessments(
        node: NodeId,
        assessments: &[EmbargoAssessment],
        principal: &Principal,
        config: &MessageConfig,
    ) -> Option<Self> {
        if assessments.is_empty() {
            return None;
        }

        let embargoes: Vec<EmbargoNotice> = assessments
            .iter()
            .map(|assessment| notice_for(assessment, principal, config))
            .collect();
        let can_request_access =
            principal.authenticated && embargoes.iter().any(|notice| !notice.user_exempt);

        Some(Self {
            node,
            header: header(embargoes.len()),
            policies_header: policies_header(embargoes.len()),
            embargoes,
            can_request_access,
        })
    }

    pub fn dependencies(&self) -> DecisionDependencies {
        DecisionDependencies {
            nodes: BTreeSet::from([self.node]),
            embargoes: self
                .embargoes
                .iter()
                .map(|notice| (notice.embargo, notice.version))
                .collect(),
        }
    }
}

fn header(count: usize) -> String {
    if count == 1 {
        "This resource is under 1 embargo:".to_string()
    } else {
        format!("This resource is under {} embargoes:", count)
    }
}

fn policies_header(count: usize) -> String {
    if count == 1 {
        "This resource has 1 embargo:".to_string()
    } else {
        format!("This resource has {} embargoes:", count)
    }
}

fn notice_for(
    assessment: &EmbargoAssessment,
    principal: &Principal,
    config: &MessageConfig,
) -> EmbargoNotice {
    let embargo = &assessment.embargo;
    let (type_label, type_message, disallow_label) = match embargo.kind {
        EmbargoKind::FilesOnly => (
            "Files",
            "Access to all associated files of this resource is restricted",
            "Disallow Access To: Resource Files",
        ),
        EmbargoKind::WholeResource => (
            "Node",
            "Access to this resource and all associated files is restricted",
            "Disallow Access To: Resource",
        ),
    };
    let duration = match embargo.expiration {
        None => "Duration: Indefinite".to_string(),
        Some(until) => format!("Duration: Until {}", format_date(until, &config.date_format)),
    };
    // Editors and bypass holders still see the request link
    let user_exempt = principal.authenticated
        && (assessment.exemptions.contains(&ExemptionReason::Explicit)
            || assessment
                .exemptions
                .contains(&ExemptionReason::GroupAdministrator));

    EmbargoNotice {
        embargo: embargo.id,
        version: embargo.version,
        type_label: type_label.to_string(),
        type_message: type_message.to_string(),
        disallow_label: disallow_label.to_string(),
        duration,
        has_duration: embargo.expiration.is_some(),
        user_exempt,
    }
}

impl EmbargoEngine {
    /// Every current embargo on `node`, assessed for `principal`
    pub async fn node_assessments_at(
        &self,
        node: NodeId,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Vec<EmbargoAssessment>> {
        let nodes = BTreeSet::from([node]);
        let current = current_embargoes_at(&nodes, self.repository(), now).await?;
        Ok(self.assess(current, principal).await)
    }

    /// Notification summary for `node`, `None` when nothing is current
    pub async fn notice_summary(
        &self,
        node: NodeId,
        principal: &Principal,
    ) -> Result<Option<NoticeSummary>> {
        self.notice_summary_at(node, principal, Utc::now()).await
    }

    pub async fn notice_summary_at(
        &self,
        node: NodeId,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Option<NoticeSummary>> {
        let assessments = self.node_assessments_at(node, principal, now).await?;
        Ok(NoticeSummary::from_assessments(
            node,
            &assessments,
            principal,
            &self.config().messages,
        ))
    }

    /// Status lines for every current embargo on `node`
    pub async fn notice_messages(&self, node: NodeId, principal: &Principal) -> Result<Vec<String>> {
        self.notice_messages_at(node, principal, Utc::now()).await
    }

    pub async fn notice_messages_at(
        &self,
        node: NodeId,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        let assessments = self.node_assessments_at(node, principal, now).await?;
        Ok(compose_notice_messages(
            &assessments,
            &self.config().messages,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::StaticGroupDirectory;
    use crate::embargo::{EmbargoRecord, InMemoryEmbargoStore, PrincipalId};
    use crate::graph::InMemoryContentGraph;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    async fn engine() -> EmbargoEngine {
        let store = InMemoryEmbargoStore::new();
        store
            .upsert(
                EmbargoRecord::new(EmbargoId(1), NodeId(5), EmbargoKind::FilesOnly)
                    .with_exempt(PrincipalId(8)),
            )
            .await;
        store
            .upsert(
                EmbargoRecord::new(EmbargoId(2), NodeId(5), EmbargoKind::WholeResource)
                    .with_expiration(Utc.with_ymd_and_hms(2031, 2, 3, 0, 0, 0).unwrap()),
            )
            .await;
        store
            .upsert(
                EmbargoRecord::new(EmbargoId(3), NodeId(5), EmbargoKind::WholeResource)
                    .with_expiration(now() - Duration::days(1)),
            )
            .await;

        let groups = StaticGroupDirectory::new();
        groups.assign_node(NodeId(5), "lab").await;
        groups
            .add_member("lab", PrincipalId(9), "project_group-administrator")
            .await;
        groups
            .add_member("lab", PrincipalId(10), "project_group-editor")
            .await;

        EmbargoEngine::builder()
            .repository(Arc::new(store))
            .graph(Arc::new(InMemoryContentGraph::new()))
            .groups(Arc::new(groups))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_summary_lists_current_embargoes_of_both_kinds() {
        let engine = engine().await;
        let summary = engine
            .notice_summary_at(NodeId(5), &Principal::new(7u64), now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.header, "This resource is under 2 embargoes:");
        assert_eq!(summary.policies_header, "This resource has 2 embargoes:");
        assert!(summary.can_request_access);

        let files = &summary.embargoes[0];
        assert_eq!(files.type_label, "Files");
        assert_eq!(
            files.type_message,
            "Access to all associated files of this resource is restricted"
        );
        assert_eq!(files.disallow_label, "Disallow Access To: Resource Files");
        assert_eq!(files.duration, "Duration: Indefinite");
        assert!(!files.has_duration);

        let whole = &summary.embargoes[1];
        assert_eq!(whole.type_label, "Node");
        assert_eq!(whole.disallow_label, "Disallow Access To: Resource");
        assert_eq!(whole.duration, "Duration: Until 2031-02-03");
        assert!(whole.has_duration);
    }

    #[test]
    fn test_single_embargo_headers() {
        assert_eq!(header(1), "This resource is under 1 embargo:");
        assert_eq!(policies_header(1), "This resource has 1 embargo:");
    }

    #[tokio::test]
    async fn test_exempt_flags() {
        let engine = engine().await;

        let listed = engine
            .notice_summary_at(NodeId(5), &Principal::new(8u64), now())
            .await
            .unwrap()
            .unwrap();
        assert!(listed.embargoes[0].user_exempt);
        assert!(!listed.embargoes[1].user_exempt);
        assert!(listed.can_request_access);

        let admin = engine
            .notice_summary_at(NodeId(5), &Principal::new(9u64), now())
            .await
            .unwrap()
            .unwrap();
        assert!(admin.embargoes.iter().all(|n| n.user_exempt));
        assert!(!admin.can_request_access);

        let editor = engine
            .notice_summary_at(NodeId(5), &Principal::new(10u64), now())
            .await
            .unwrap()
            .unwrap();
        assert!(editor.embargoes.iter().all(|n| !n.user_exempt));
    }

    #[tokio::test]
    async fn test_anonymous_cannot_request() {
        let engine = engine().await;
        let summary = engine
            .notice_summary_at(NodeId(5), &Principal::anonymous(), now())
            .await
            .unwrap()
            .unwrap();
        assert!(!summary.can_request_access);
        assert!(summary.embargoes.iter().all(|n| !n.user_exempt));
    }

    #[tokio::test]
    async fn test_no_current_embargo_means_no_summary() {
        let engine = engine().await;
        assert!(engine
            .notice_summary_at(NodeId(6), &Principal::new(7u64), now())
            .await
            .unwrap()
            .is_none());
        assert!(engine
            .notice_messages_at(NodeId(6), &Principal::new(7u64), now())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_notice_messages_include_exempt_lines() {
        let engine = engine().await;
        let lines = engine
            .notice_messages_at(NodeId(5), &Principal::new(8u64), now())
            .await
            .unwrap();
        assert_eq!(
            lines,
            vec![
                "This resource is under 2 embargoes",
                "Access to all associated files of this resource is restricted indefinitely.",
                "You have been granted an access exemption to this resource.",
                "Access to this resource and all associated resources is restricted until 2031-02-03.",
            ]
        );
    }

    #[tokio::test]
    async fn test_summary_dependencies() {
        let engine = engine().await;
        let summary = engine
            .notice_summary_at(NodeId(5), &Principal::new(7u64), now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            summary.dependencies().embargoes,
            vec![(EmbargoId(1), 0), (EmbargoId(2), 0)]
        );
    }
}
