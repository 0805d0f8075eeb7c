//! Embargoes - access restriction resolution for embargoed content
//!
//! Decides whether a content node, an attached file or a media item is
//! currently restricted for a principal, and composes the restriction
//! notices shown to them.
//!
//! ## Architecture
//!
//! ```text
//!   ResourceRef (node | file | media)
//!        │
//!   ┌────▼─────────────┐   ContentGraph
//!   │  GraphResolver   │◄── media-of, reference fields,
//!   └────┬─────────────┘    file usages, paragraphs
//!        │ owning nodes
//!   ┌────▼─────────────┐   EmbargoRepository
//!   │ Temporal filter  │◄── records by node
//!   └────┬─────────────┘
//!        │ current embargoes
//!   ┌────▼─────────────┐   GroupMembership (optional)
//!   │ ExemptionPolicy  │◄── administrator / editor roles
//!   └────┬─────────────┘
//!        │ kind scope + exemptions
//!   ┌────▼─────────────┐
//!   │    Decision      │──► notice composer, access-request routing
//!   └──────────────────┘
//! ```
//!
//! The engine is read-only. Every collaborator is an async trait object
//! so a real content store, file usage index and group service can be
//! plugged in; in-memory implementations ship for tests and the CLI.
//!
//! ## Modules
//!
//! - [`embargo`]: embargo records, repository interface, temporal filter
//! - [`graph`]: ownership graph resolution
//! - [`access`]: exemption policy, resolution engine, access requests
//! - [`notice`]: restriction messages and notification summaries
//! - [`fixture`]: JSON snapshots seeding the in-memory collaborators
//! - [`config`]: configuration management

pub mod access;
pub mod config;
pub mod embargo;
pub mod error;
pub mod fixture;
pub mod graph;
pub mod notice;

pub use access::{Decision, EmbargoEngine, EmbargoEngineBuilder, Principal};
pub use config::EmbargoConfig;
pub use embargo::{EmbargoKind, EmbargoRecord, ResourceKind, ResourceRef};
pub use error::{Error, Result};
