//! Embargo records and the principal-independent half of the engine
//!
//! Includes:
//! - Typed embargo records and the adapter from raw stored entities
//! - The read-only repository interface plus an in-memory store
//! - The temporal filter selecting embargoes currently in force
//! - Explicit exemption grant/revoke on records

mod exemption;
mod repository;
pub mod temporal;
mod types;

pub use exemption::ExemptionChange;
pub use repository::{EmbargoRepository, InMemoryEmbargoStore};
pub use temporal::{current_embargo_ids, current_embargoes, current_embargoes_at};
pub use types::{
    EmbargoId, EmbargoKind, EmbargoRecord, FileId, MediaId, NodeId, ParagraphId, PrincipalId,
    ResourceKind, ResourceRef, StoredEmbargo,
};
