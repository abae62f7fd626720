//! Access decision records.

use crate::types::{Action, Resource, Role, Scope};
use serde::{Deserialize, Serialize};

/// The final decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

/// A permission check outcome with enough detail for audit logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
    /// The final decision.
    pub decision: Decision,

    /// Reason for the decision.
    pub reason: String,

    pub role: Role,
    pub resource: Resource,
    pub action: Action,

    /// Scope the caller asked for, if any.
    pub requested_scope: Option<Scope>,

    /// Recorded scope that satisfied the request.
    pub matched_scope: Option<Scope>,
}

impl AccessDecision {
    /// Creates an allow decision.
    pub fn allow(
        role: &Role,
        resource: &Resource,
        action: &Action,
        requested_scope: Option<&Scope>,
        matched_scope: &Scope,
    ) -> Self {
        Self {
            decision: Decision::Allow,
            reason: format!(
                "{} may {} {} (scope '{}')",
                role, action, resource, matched_scope
            ),
            role: role.clone(),
            resource: resource.clone(),
            action: action.clone(),
            requested_scope: requested_scope.cloned(),
            matched_scope: Some(matched_scope.clone()),
        }
    }

    /// Creates a deny decision.
    pub fn deny(
        role: &Role,
        resource: &Resource,
        action: &Action,
        requested_scope: Option<&Scope>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            decision: Decision::Deny,
            reason: reason.into(),
            role: role.clone(),
            resource: resource.clone(),
            action: action.clone(),
            requested_scope: requested_scope.cloned(),
            matched_scope: None,
        }
    }

    /// Returns true if the decision is allow.
    pub fn is_allowed(&self) -> bool {
        matches!(self.decision, Decision::Allow)
    }

    /// Returns true if the decision is deny.
    pub fn is_denied(&self) -> bool {
        matches!(self.decision, Decision::Deny)
    }
}
