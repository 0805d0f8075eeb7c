//! Ownership graph: which content nodes govern a file, media item or node

mod resolver;
mod store;

pub use resolver::GraphResolver;
pub use store::{ContentGraph, FileUsage, InMemoryContentGraph, ReferenceField, ReferenceTarget};
