//! Restriction message composer
//!
//! Pure formatting: turns assessed embargoes into the lines a
//! presentation layer shows as warnings. One count line, then per
//! embargo a description chosen by (kind × expiration) followed by a
//! line for each exemption the principal holds on it.

use crate::access::{Decision, EmbargoAssessment, ExemptionReason};
use crate::config::MessageConfig;
use crate::embargo::{EmbargoKind, EmbargoRecord};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Messages for a decision; empty unless the resource is restricted
pub fn compose_messages(decision: &Decision, config: &MessageConfig) -> Vec<String> {
    if !decision.is_restricted {
        return Vec::new();
    }
    describe(&decision.assessments, config)
}

/// Messages for every listed embargo, whether or not it restricts anyone
pub fn compose_notice_messages(
    assessments: &[EmbargoAssessment],
    config: &MessageConfig,
) -> Vec<String> {
    if assessments.is_empty() {
        return Vec::new();
    }
    describe(assessments, config)
}

fn describe(assessments: &[EmbargoAssessment], config: &MessageConfig) -> Vec<String> {
    let mut messages = vec![count_line(assessments.len())];
    for assessment in assessments {
        messages.push(format!(
            "{}{}",
            config.bullet,
            describe_embargo(&assessment.embargo, config)
        ));
        for reason in &assessment.exemptions {
            if let Some(line) = exemption_line(*reason) {
                messages.push(format!("{}{}", config.bullet, line));
            }
        }
    }
    messages
}

/// "This resource is under N embargo(es)"
pub fn count_line(count: usize) -> String {
    if count == 1 {
        "This resource is under 1 embargo".to_string()
    } else {
        format!("This resource is under {} embargoes", count)
    }
}

/// Description of one embargo
pub fn describe_embargo(embargo: &EmbargoRecord, config: &MessageConfig) -> String {
    match (embargo.kind, embargo.expiration) {
        (EmbargoKind::FilesOnly, None) => {
            "Access to all associated files of this resource is restricted indefinitely."
                .to_string()
        }
        (EmbargoKind::FilesOnly, Some(until)) => format!(
            "Access to all associated files of this resource is restricted until {}.",
            format_date(until, &config.date_format)
        ),
        (EmbargoKind::WholeResource, None) => {
            "Access to this resource and all associated resources is restricted indefinitely."
                .to_string()
        }
        (EmbargoKind::WholeResource, Some(until)) => format!(
            "Access to this resource and all associated resources is restricted until {}.",
            format_date(until, &config.date_format)
        ),
    }
}

/// Line explaining an exemption. Bypass-permission holders get none.
pub fn exemption_line(reason: ExemptionReason) -> Option<&'static str> {
    match reason {
        ExemptionReason::Explicit => {
            Some("You have been granted an access exemption to this resource.")
        }
        ExemptionReason::GroupAdministrator => {
            Some("You have access to this resource as a Project Administrator.")
        }
        ExemptionReason::GroupEditor => Some("You have access to this resource as a Project Editor."),
        ExemptionReason::BypassPermission => None,
    }
}

/// Falls back to RFC 3339 when `format` cannot be rendered
pub(crate) fn format_date(date: DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    match write!(out, "{}", date.format(format)) {
        Ok(()) => out,
        Err(_) => date.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embargo::{EmbargoId, NodeId, ResourceRef};
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn record(kind: EmbargoKind, dated: bool) -> EmbargoRecord {
        let record = EmbargoRecord::new(EmbargoId(1), NodeId(1), kind);
        if dated {
            record.with_expiration(Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap())
        } else {
            record
        }
    }

    fn assessed(embargo: EmbargoRecord, reasons: &[ExemptionReason]) -> EmbargoAssessment {
        EmbargoAssessment {
            embargo,
            exemptions: reasons.iter().copied().collect(),
        }
    }

    fn decision(restricted: bool, assessments: Vec<EmbargoAssessment>) -> Decision {
        Decision {
            resource: ResourceRef::Node(NodeId(1)),
            is_restricted: restricted,
            applicable: assessments
                .iter()
                .filter(|a| !a.is_exempt())
                .map(|a| a.embargo.id)
                .collect(),
            assessments,
            owning_nodes: BTreeSet::from([NodeId(1)]),
        }
    }

    #[test]
    fn test_kind_expiration_table() {
        let config = MessageConfig::default();
        assert_eq!(
            describe_embargo(&record(EmbargoKind::FilesOnly, false), &config),
            "Access to all associated files of this resource is restricted indefinitely."
        );
        assert_eq!(
            describe_embargo(&record(EmbargoKind::FilesOnly, true), &config),
            "Access to all associated files of this resource is restricted until 2099-01-01."
        );
        assert_eq!(
            describe_embargo(&record(EmbargoKind::WholeResource, false), &config),
            "Access to this resource and all associated resources is restricted indefinitely."
        );
        assert_eq!(
            describe_embargo(&record(EmbargoKind::WholeResource, true), &config),
            "Access to this resource and all associated resources is restricted until 2099-01-01."
        );
    }

    #[test]
    fn test_count_line_pluralizes() {
        assert_eq!(count_line(1), "This resource is under 1 embargo");
        assert_eq!(count_line(3), "This resource is under 3 embargoes");
    }

    #[test]
    fn test_unrestricted_decision_has_no_messages() {
        let d = decision(
            false,
            vec![assessed(
                record(EmbargoKind::WholeResource, false),
                &[ExemptionReason::Explicit],
            )],
        );
        assert!(compose_messages(&d, &MessageConfig::default()).is_empty());
        assert!(compose_messages(&Decision::unrestricted(d.resource), &MessageConfig::default())
            .is_empty());
    }

    #[test]
    fn test_exemption_lines_follow_their_embargo() {
        let mut exempt = record(EmbargoKind::WholeResource, true);
        exempt.id = EmbargoId(2);
        let d = decision(
            true,
            vec![
                assessed(record(EmbargoKind::WholeResource, false), &[]),
                assessed(
                    exempt,
                    &[
                        ExemptionReason::Explicit,
                        ExemptionReason::BypassPermission,
                        ExemptionReason::GroupEditor,
                    ],
                ),
            ],
        );

        let config = MessageConfig {
            bullet: "- ".to_string(),
            ..MessageConfig::default()
        };
        assert_eq!(
            compose_messages(&d, &config),
            vec![
                "This resource is under 2 embargoes",
                "- Access to this resource and all associated resources is restricted indefinitely.",
                "- Access to this resource and all associated resources is restricted until 2099-01-01.",
                "- You have been granted an access exemption to this resource.",
                "- You have access to this resource as a Project Editor.",
            ]
        );
    }

    #[test]
    fn test_custom_date_format() {
        let config = MessageConfig {
            date_format: "%B %-d, %Y".to_string(),
            ..MessageConfig::default()
        };
        assert_eq!(
            describe_embargo(&record(EmbargoKind::FilesOnly, true), &config),
            "Access to all associated files of this resource is restricted until January 1, 2099."
        );
    }

    #[test]
    fn test_notice_messages_ignore_restriction() {
        let all_exempt = vec![assessed(
            record(EmbargoKind::FilesOnly, false),
            &[ExemptionReason::GroupAdministrator],
        )];
        let lines = compose_notice_messages(&all_exempt, &MessageConfig::default());
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[2],
            "You have access to this resource as a Project Administrator."
        );
        assert!(compose_notice_messages(&[], &MessageConfig::default()).is_empty());
    }
}
