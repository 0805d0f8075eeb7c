//! Embargo data model
//!
//! Typed identifiers, resource references and the embargo record itself,
//! plus `StoredEmbargo`, the raw shape an entity store hands back. Raw
//! records are converted with `TryFrom` so that malformed storage never
//! reaches the decision logic.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Content node identifier
    NodeId
);
entity_id!(
    /// Managed file identifier
    FileId
);
entity_id!(
    /// Media item identifier
    MediaId
);
entity_id!(
    /// Paragraph (sub-structure of exactly one node) identifier
    ParagraphId
);
entity_id!(
    /// Embargo record identifier
    EmbargoId
);
entity_id!(
    /// Authenticated principal identifier
    PrincipalId
);

/// Kind of protected resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A content node
    Node,
    /// A file attached to content
    File,
    /// A media item attached to content
    Media,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::File => write!(f, "file"),
            Self::Media => write!(f, "media"),
        }
    }
}

/// Reference to a protected resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ResourceRef {
    Node(NodeId),
    File(FileId),
    Media(MediaId),
}

impl ResourceRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Node(_) => ResourceKind::Node,
            Self::File(_) => ResourceKind::File,
            Self::Media(_) => ResourceKind::Media,
        }
    }

    /// Raw identifier, without the kind
    pub fn raw_id(&self) -> u64 {
        match self {
            Self::Node(id) => id.0,
            Self::File(id) => id.0,
            Self::Media(id) => id.0,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.raw_id())
    }
}

impl FromStr for ResourceRef {
    type Err = String;

    /// Parses `node:12`, `file:3` or `media:9`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <kind>:<id>, got '{}'", s))?;
        let id: u64 = id
            .trim()
            .parse()
            .map_err(|_| format!("invalid resource id '{}'", id))?;
        match kind.trim() {
            "node" => Ok(Self::Node(NodeId(id))),
            "file" => Ok(Self::File(FileId(id))),
            "media" => Ok(Self::Media(MediaId(id))),
            other => Err(format!("unknown resource kind '{}'", other)),
        }
    }
}

/// What an embargo restricts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbargoKind {
    /// Only attached files and media are restricted
    FilesOnly,
    /// The node itself and everything attached to it are restricted
    WholeResource,
}

/// An embargo governing one content node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbargoRecord {
    pub id: EmbargoId,
    /// Node this embargo governs
    pub owning_node: NodeId,
    pub kind: EmbargoKind,
    /// `None` means the embargo never lapses on its own
    pub expiration: Option<DateTime<Utc>>,
    /// Principals explicitly granted a bypass
    #[serde(default)]
    pub exempt_principals: BTreeSet<PrincipalId>,
    /// Bumped by the authoring workflow on every change
    #[serde(default)]
    pub version: u64,
}

impl EmbargoRecord {
    /// Create an indefinite embargo with no exemptions
    pub fn new(id: EmbargoId, owning_node: NodeId, kind: EmbargoKind) -> Self {
        Self {
            id,
            owning_node,
            kind,
            expiration: None,
            exempt_principals: BTreeSet::new(),
            version: 0,
        }
    }

    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_exempt(mut self, principal: PrincipalId) -> Self {
        self.exempt_principals.insert(principal);
        self
    }

    /// Current iff there is no expiration or `now` is strictly before it
    pub fn is_current_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiration {
            None => true,
            Some(expiration) => now < expiration,
        }
    }

    pub fn lists_exempt(&self, principal: PrincipalId) -> bool {
        self.exempt_principals.contains(&principal)
    }
}

/// Raw embargo entity as kept by the content store.
///
/// `embargo_type` is `0` for files-only and `1` for whole-resource;
/// `expiration_type` is `0` for indefinite and `1` for dated, in which
/// case `expiration_date` holds either `YYYY-MM-DD` or an RFC 3339 instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEmbargo {
    pub id: u64,
    pub embargoed_node: Option<u64>,
    pub embargo_type: u8,
    pub expiration_type: u8,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub exempt_users: Vec<u64>,
    #[serde(default)]
    pub version: u64,
}

impl TryFrom<StoredEmbargo> for EmbargoRecord {
    type Error = Error;

    fn try_from(raw: StoredEmbargo) -> Result<Self> {
        let id = EmbargoId(raw.id);
        let invalid = |reason: String| Error::InvalidRecord {
            embargo: id,
            reason,
        };

        let owning_node = raw
            .embargoed_node
            .map(NodeId)
            .ok_or_else(|| invalid("no embargoed node".to_string()))?;

        let kind = match raw.embargo_type {
            0 => EmbargoKind::FilesOnly,
            1 => EmbargoKind::WholeResource,
            other => return Err(invalid(format!("unknown embargo type {}", other))),
        };

        let expiration = match raw.expiration_type {
            0 => None,
            1 => {
                let date = raw
                    .expiration_date
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .ok_or_else(|| invalid("dated expiration without a date".to_string()))?;
                Some(parse_expiration(date).ok_or_else(|| {
                    invalid(format!("unparseable expiration date '{}'", date))
                })?)
            }
            other => return Err(invalid(format!("unknown expiration type {}", other))),
        };

        Ok(Self {
            id,
            owning_node,
            kind,
            expiration,
            exempt_principals: raw.exempt_users.into_iter().map(PrincipalId).collect(),
            version: raw.version,
        })
    }
}

/// Bare dates are taken as midnight UTC
fn parse_expiration(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
