//! Content graph collaborator
//!
//! The relationship data the resolver walks: which node a media item is
//! "media of", which node reference fields target media, which entities
//! use a file, and which node a paragraph belongs to.

use crate::embargo::{FileId, MediaId, NodeId, ParagraphId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Entity type a reference field points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceTarget {
    Node,
    Media,
    File,
    Paragraph,
    User,
    Other(String),
}

/// A node-level entity reference field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceField {
    /// Machine name of the field
    pub name: String,
    /// What the field points at
    pub target: ReferenceTarget,
}

impl ReferenceField {
    pub fn new(name: impl Into<String>, target: ReferenceTarget) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

/// One entity referencing a file, directly or through a rendition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum FileUsage {
    Node(NodeId),
    Paragraph(ParagraphId),
    Media(MediaId),
}

/// Relationship lookups over the content store.
#[async_trait]
pub trait ContentGraph: Send + Sync {
    /// The node named by the media item's own "media of" field, if it has one
    async fn media_of(&self, media: MediaId) -> Result<Option<NodeId>>;

    /// Every entity reference field defined on nodes
    async fn node_reference_fields(&self) -> Result<Vec<ReferenceField>>;

    /// Nodes whose `field` holds a reference to `target`
    async fn nodes_referencing(&self, field: &str, target: u64) -> Result<Vec<NodeId>>;

    /// Every usage of `file`, including usages of its renditions
    async fn file_usages(&self, file: FileId) -> Result<Vec<FileUsage>>;

    /// The single node a paragraph is attached to
    async fn paragraph_parent(&self, paragraph: ParagraphId) -> Result<Option<NodeId>>;
}

#[derive(Default)]
struct GraphData {
    media_of: HashMap<MediaId, NodeId>,
    fields: Vec<ReferenceField>,
    references: HashMap<String, Vec<(NodeId, u64)>>,
    file_usages: HashMap<FileId, Vec<FileUsage>>,
    paragraphs: HashMap<ParagraphId, NodeId>,
}

/// In-memory content graph
#[derive(Clone, Default)]
pub struct InMemoryContentGraph {
    data: Arc<RwLock<GraphData>>,
}

impl InMemoryContentGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a media item's direct "media of" node
    pub async fn set_media_of(&self, media: MediaId, node: NodeId) {
        self.data.write().await.media_of.insert(media, node);
    }

    /// Declare a node reference field
    pub async fn add_reference_field(&self, field: ReferenceField) {
        let mut data = self.data.write().await;
        if !data.fields.iter().any(|f| f.name == field.name) {
            data.fields.push(field);
        }
    }

    /// Record that `node.field` references `target`
    pub async fn add_reference(&self, node: NodeId, field: impl Into<String>, target: u64) {
        self.data
            .write()
            .await
            .references
            .entry(field.into())
            .or_default()
            .push((node, target));
    }

    /// Record one usage of a file
    pub async fn add_file_usage(&self, file: FileId, usage: FileUsage) {
        self.data
            .write()
            .await
            .file_usages
            .entry(file)
            .or_default()
            .push(usage);
    }

    /// Attach a paragraph to its node
    pub async fn set_paragraph_parent(&self, paragraph: ParagraphId, node: NodeId) {
        self.data.write().await.paragraphs.insert(paragraph, node);
    }
}

#[async_trait]
impl ContentGraph for InMemoryContentGraph {
    async fn media_of(&self, media: MediaId) -> Result<Option<NodeId>> {
        Ok(self.data.read().await.media_of.get(&media).copied())
    }

    async fn node_reference_fields(&self) -> Result<Vec<ReferenceField>> {
        Ok(self.data.read().await.fields.clone())
    }

    async fn nodes_referencing(&self, field: &str, target: u64) -> Result<Vec<NodeId>> {
        Ok(self
            .data
            .read()
            .await
            .references
            .get(field)
            .map(|refs| {
                refs.iter()
                    .filter(|(_, t)| *t == target)
                    .map(|(node, _)| *node)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn file_usages(&self, file: FileId) -> Result<Vec<FileUsage>> {
        Ok(self
            .data
            .read()
            .await
            .file_usages
            .get(&file)
            .cloned()
            .unwrap_or_default())
    }

    async fn paragraph_parent(&self, paragraph: ParagraphId) -> Result<Option<NodeId>> {
        Ok(self.data.read().await.paragraphs.get(&paragraph).copied())
    }
}
