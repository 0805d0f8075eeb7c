//! JSON fixture describing a content store snapshot
//!
//! Seeds the in-memory collaborators so the engine can be exercised
//! without a real content store. Used by the CLI and by tests.
//!
//! ```json
//! {
//!   "embargoes": [
//!     { "id": 1, "embargoed_node": 10, "embargo_type": 1,
//!       "expiration_type": 1, "expiration_date": "2099-01-01",
//!       "exempt_users": [7] }
//!   ],
//!   "media_of": [ { "media": 3, "node": 10 } ],
//!   "reference_fields": [ { "name": "field_media", "target": "media" } ],
//!   "references": [ { "node": 11, "field": "field_media", "target": 4 } ],
//!   "file_usages": [ { "file": 2, "usage": { "type": "paragraph", "id": 5 } } ],
//!   "paragraphs": [ { "paragraph": 5, "node": 10 } ],
//!   "groups": [
//!     { "name": "lab", "nodes": [10],
//!       "members": [ { "principal": 9, "role": "project_group-administrator" } ] }
//!   ]
//! }
//! ```

use crate::access::{EmbargoEngine, StaticGroupDirectory};
use crate::config::EmbargoConfig;
use crate::embargo::{
    FileId, InMemoryEmbargoStore, MediaId, NodeId, ParagraphId, PrincipalId, StoredEmbargo,
};
use crate::error::{Error, Result};
use crate::graph::{FileUsage, InMemoryContentGraph, ReferenceField};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub embargoes: Vec<StoredEmbargo>,
    pub media_of: Vec<MediaOf>,
    pub reference_fields: Vec<ReferenceField>,
    pub references: Vec<Reference>,
    pub file_usages: Vec<FileUsageEntry>,
    pub paragraphs: Vec<ParagraphParent>,
    pub groups: Vec<GroupEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaOf {
    pub media: MediaId,
    pub node: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub node: NodeId,
    pub field: String,
    pub target: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUsageEntry {
    pub file: FileId,
    pub usage: FileUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParagraphParent {
    pub paragraph: ParagraphId,
    pub node: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntry {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeId>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub principal: PrincipalId,
    pub role: String,
}

/// In-memory collaborators seeded from a fixture
#[derive(Clone, Default)]
pub struct Seeded {
    pub store: InMemoryEmbargoStore,
    pub graph: InMemoryContentGraph,
    pub groups: StaticGroupDirectory,
}

impl Seeded {
    /// Engine over the seeded collaborators
    pub fn engine(&self, config: EmbargoConfig) -> Result<EmbargoEngine> {
        EmbargoEngine::builder()
            .config(config)
            .repository(Arc::new(self.store.clone()))
            .graph(Arc::new(self.graph.clone()))
            .groups(Arc::new(self.groups.clone()))
            .build()
    }
}

impl Fixture {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a fixture file
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }

    /// Populate fresh in-memory collaborators.
    ///
    /// Embargoes that do not convert to a typed record are logged and
    /// skipped, the same way a decision skips them.
    pub async fn seed(&self) -> Result<Seeded> {
        let seeded = Seeded::default();

        for raw in &self.embargoes {
            match seeded.store.insert_stored(raw.clone()).await {
                Ok(_) => {}
                Err(e @ Error::InvalidRecord { .. }) => {
                    tracing::warn!("Skipping fixture embargo: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        for entry in &self.media_of {
            seeded.graph.set_media_of(entry.media, entry.node).await;
        }
        for field in &self.reference_fields {
            seeded.graph.add_reference_field(field.clone()).await;
        }
        for reference in &self.references {
            seeded
                .graph
                .add_reference(reference.node, reference.field.clone(), reference.target)
                .await;
        }
        for entry in &self.file_usages {
            seeded.graph.add_file_usage(entry.file, entry.usage).await;
        }
        for entry in &self.paragraphs {
            seeded
                .graph
                .set_paragraph_parent(entry.paragraph, entry.node)
                .await;
        }

        for group in &self.groups {
            for node in &group.nodes {
                seeded.groups.assign_node(*node, group.name.clone()).await;
            }
            for member in &group.members {
                seeded
                    .groups
                    .add_member(group.name.clone(), member.principal, member.role.clone())
                    .await;
            }
        }

        tracing::debug!(
            embargoes = seeded.store.len().await,
            groups = self.groups.len(),
            "Seeded fixture"
        );
        Ok(seeded)
    }
}
