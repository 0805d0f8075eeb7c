//! Access decisions for embargoed content
//!
//! Provides the principal model, the layered exemption policy, the
//! resolution engine producing per-request decisions, and routing of
//! access requests to group administrators.

mod engine;
mod policy;
mod principal;
mod request;

pub use engine::{
    restricts, Decision, DecisionDependencies, EmbargoAssessment, EmbargoEngine,
    EmbargoEngineBuilder, EmbargoedAccess,
};
pub use policy::{ExemptionPolicy, ExemptionReason};
pub use principal::{GroupMembership, Principal, StaticGroupDirectory};
pub use request::AccessRequestTarget;
