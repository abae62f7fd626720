//! Permission evaluation.
//!
//! Every check is a pure function of the caller's role and the immutable
//! matrix. Unknown roles, resources, actions and scopes all resolve to deny;
//! none of them is an error.

use crate::decision::AccessDecision;
use crate::error::{AuthzError, Result};
use crate::matrix::{AuthzConfig, FeatureCapabilities, PermissionMatrix};
use crate::types::{Action, Resource, Role, Scope};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

static DEFAULT_EVALUATOR: OnceLock<Arc<PermissionEvaluator>> = OnceLock::new();

/// Process-wide evaluator over the built-in matrix, parsed on first use.
pub fn default_evaluator() -> Result<Arc<PermissionEvaluator>> {
    if let Some(evaluator) = DEFAULT_EVALUATOR.get() {
        return Ok(Arc::clone(evaluator));
    }

    let config = AuthzConfig::builtin()?;
    tracing::info!(
        fingerprint = %config.fingerprint()?,
        "loaded built-in authorization matrix"
    );
    let evaluator = PermissionEvaluator::from_config(&config);
    Ok(Arc::clone(DEFAULT_EVALUATOR.get_or_init(|| Arc::new(evaluator))))
}

/// Answers "is this allowed" questions against an immutable matrix.
#[derive(Debug, Clone, Default)]
pub struct PermissionEvaluator {
    matrix: PermissionMatrix,
    capabilities: FeatureCapabilities,
}

impl PermissionEvaluator {
    /// Creates an evaluator over the given matrix and feature map.
    pub fn new(matrix: PermissionMatrix, capabilities: FeatureCapabilities) -> Self {
        Self {
            matrix,
            capabilities,
        }
    }

    /// Creates an evaluator from a loaded config.
    pub fn from_config(config: &AuthzConfig) -> Self {
        Self::new(config.matrix(), config.capabilities())
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    pub fn capabilities(&self) -> &FeatureCapabilities {
        &self.capabilities
    }

    /// True iff the matrix grants `action` on `resource` to `role`.
    ///
    /// With no scope (or an empty one) any recorded scope matches. Otherwise
    /// the scope must equal a recorded scope, or the entry must record `any`.
    pub fn has_permission(
        &self,
        role: &Role,
        resource: &Resource,
        action: &Action,
        scope: Option<&Scope>,
    ) -> bool {
        let allowed = self.matching_scope(role, resource, action, scope).is_some();
        tracing::trace!(
            role = role.as_str(),
            resource = resource.as_str(),
            action = action.as_str(),
            scope = scope.map(Scope::as_str),
            allowed,
            "permission check"
        );
        allowed
    }

    /// `has_permission` for callers holding raw strings.
    pub fn has_permission_str(
        &self,
        role: Option<&str>,
        resource: &str,
        action: &str,
        scope: Option<&str>,
    ) -> bool {
        let scope = scope.map(Scope::from);
        self.has_permission(
            &Role::parse(role),
            &Resource::from(resource),
            &Action::from(action),
            scope.as_ref(),
        )
    }

    /// Same check as `has_permission`, returning a decision record.
    pub fn decide(
        &self,
        role: &Role,
        resource: &Resource,
        action: &Action,
        scope: Option<&Scope>,
    ) -> AccessDecision {
        if !role.is_recognized() {
            tracing::debug!(role = role.as_str(), resource = %resource, action = %action, "denied: unrecognized role");
            return AccessDecision::deny(role, resource, action, scope, "Unrecognized role");
        }

        match self.matching_scope(role, resource, action, scope) {
            Some(matched) => AccessDecision::allow(role, resource, action, scope, matched),
            None => {
                tracing::debug!(role = role.as_str(), resource = %resource, action = %action, "denied: no matching grant");
                AccessDecision::deny(
                    role,
                    resource,
                    action,
                    scope,
                    format!("No grant for {} to {} {}", role, action, resource),
                )
            }
        }
    }

    /// True iff `role` is in the allow-set of `feature`.
    pub fn can_access(&self, role: &Role, feature: &str) -> bool {
        match role {
            Role::Unknown(_) => false,
            known => self
                .capabilities
                .roles(feature)
                .is_some_and(|roles| roles.contains(known)),
        }
    }

    /// True iff `role` holds any grant on `resource`.
    pub fn can_access_resource(&self, role: &Role, resource: &Resource) -> bool {
        match role {
            Role::Unknown(_) => false,
            known => !self.matrix.tables(known, resource.as_str()).is_empty(),
        }
    }

    /// Every scope recorded for `role` on `resource`, across all actions.
    pub fn get_allowed_scopes(&self, role: &Role, resource: &Resource) -> BTreeSet<Scope> {
        match role {
            Role::Unknown(_) => BTreeSet::new(),
            known => self
                .matrix
                .tables(known, resource.as_str())
                .into_iter()
                .flat_map(|table| table.values())
                .flatten()
                .cloned()
                .collect(),
        }
    }

    /// Scopes recorded for `role` on `resource` for one action.
    pub fn allowed_scopes_for(&self, role: &Role, resource: &str, action: &str) -> BTreeSet<Scope> {
        match role {
            Role::Unknown(_) => BTreeSet::new(),
            known => self
                .matrix
                .tables(known, resource)
                .into_iter()
                .filter_map(|table| table.get(action))
                .flatten()
                .cloned()
                .collect(),
        }
    }

    /// True iff `role` equals one of `candidate_roles`.
    ///
    /// A missing candidate list is a caller bug and is reported as
    /// `AuthzError::MissingArgument` instead of a quiet `false`.
    pub fn has_any_role(role: &Role, candidate_roles: Option<&[Role]>) -> Result<bool> {
        let candidates = candidate_roles
            .ok_or_else(|| AuthzError::MissingArgument("candidate_roles".to_string()))?;

        Ok(match role {
            Role::Unknown(_) => false,
            known => candidates.contains(known),
        })
    }

    fn matching_scope<'a>(
        &'a self,
        role: &Role,
        resource: &Resource,
        action: &Action,
        scope: Option<&Scope>,
    ) -> Option<&'a Scope> {
        if let Role::Unknown(_) = role {
            return None;
        }

        let requested = scope.filter(|s| !s.is_empty());

        for table in self.matrix.tables(role, resource.as_str()) {
            let Some(scopes) = table.get(action.as_str()) else {
                continue;
            };

            let matched = match requested {
                None => scopes.iter().next(),
                Some(wanted) => scopes
                    .get(wanted.as_str())
                    .or_else(|| scopes.get(Scope::ANY)),
            };

            if matched.is_some() {
                return matched;
            }
        }

        None
    }
}
