//! Graph resolver: resource → owning content nodes
//!
//! A node owns itself. A media item is owned by its "media of" node, or
//! failing that by every node referencing it through a media reference
//! field. A file is owned by whatever its usages resolve to: nodes
//! directly, paragraphs through their parent node, media recursively.
//! No discoverable owner yields an empty set, which callers treat as
//! unrestricted.

use super::store::{ContentGraph, FileUsage, ReferenceTarget};
use crate::config::GraphConfig;
use crate::embargo::{FileId, MediaId, NodeId, ResourceRef};
use crate::error::Result;
use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Resolves resources to the nodes whose embargoes govern them
#[derive(Clone)]
pub struct GraphResolver {
    graph: Arc<dyn ContentGraph>,
    config: GraphConfig,
}

impl GraphResolver {
    pub fn new(graph: Arc<dyn ContentGraph>, config: GraphConfig) -> Self {
        Self { graph, config }
    }

    /// Owning node ids of `resource`, duplicates collapsed
    pub async fn resolve_owning_nodes(&self, resource: ResourceRef) -> Result<BTreeSet<NodeId>> {
        let nodes = match resource {
            ResourceRef::Node(node) => BTreeSet::from([node]),
            ResourceRef::Media(media) => self.media_parents(media).await?,
            ResourceRef::File(file) => self.file_parents(file).await?,
        };
        tracing::debug!(resource = %resource, owners = nodes.len(), "Resolved owning nodes");
        Ok(nodes)
    }

    /// Nodes owning a media item
    pub async fn media_parents(&self, media: MediaId) -> Result<BTreeSet<NodeId>> {
        if let Some(node) = self.graph.media_of(media).await? {
            return Ok(BTreeSet::from([node]));
        }

        let fields: Vec<String> = self
            .graph
            .node_reference_fields()
            .await?
            .into_iter()
            .filter(|f| {
                f.target == ReferenceTarget::Media
                    && f.name.starts_with(&self.config.reference_field_prefix)
            })
            .map(|f| f.name)
            .collect();

        let found = try_join_all(
            fields
                .iter()
                .map(|field| self.graph.nodes_referencing(field, media.0)),
        )
        .await?;
        Ok(found.into_iter().flatten().collect())
    }

    /// Nodes owning a file, through every usage of it
    pub async fn file_parents(&self, file: FileId) -> Result<BTreeSet<NodeId>> {
        let mut nodes = BTreeSet::new();
        for usage in self.graph.file_usages(file).await? {
            match usage {
                FileUsage::Node(node) => {
                    nodes.insert(node);
                }
                FileUsage::Paragraph(paragraph) => {
                    match self.graph.paragraph_parent(paragraph).await? {
                        Some(node) => {
                            nodes.insert(node);
                        }
                        None => tracing::debug!(
                            file = %file,
                            paragraph = %paragraph,
                            "Paragraph using file has no parent node"
                        ),
                    }
                }
                FileUsage::Media(media) => nodes.extend(self.media_parents(media).await?),
            }
        }
        Ok(nodes)
    }
}
