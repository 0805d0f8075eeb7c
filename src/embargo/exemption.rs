//! Explicit exemption grants and revocations on a single record

use super::types::{EmbargoRecord, PrincipalId};
use serde::{Deserialize, Serialize};

/// Outcome of granting or revoking an explicit exemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionChange {
    /// Principal added to the exemption list
    Granted,
    /// Principal was already listed; nothing changed
    AlreadyExempt,
    /// Principal removed from the exemption list
    Revoked,
    /// Principal was not listed; nothing changed
    NotExempt,
}

impl ExemptionChange {
    /// True when the record was modified
    pub fn is_effective(&self) -> bool {
        matches!(self, Self::Granted | Self::Revoked)
    }
}

impl EmbargoRecord {
    /// Add `principal` to the exemption list
    pub fn grant_exemption(&mut self, principal: PrincipalId) -> ExemptionChange {
        if self.exempt_principals.insert(principal) {
            ExemptionChange::Granted
        } else {
            ExemptionChange::AlreadyExempt
        }
    }

    /// Remove `principal` from the exemption list
    pub fn revoke_exemption(&mut self, principal: PrincipalId) -> ExemptionChange {
        if self.exempt_principals.remove(&principal) {
            ExemptionChange::Revoked
        } else {
            ExemptionChange::NotExempt
        }
    }
}
