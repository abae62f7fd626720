//! Permission matrix and feature capability definitions.

use crate::error::{AuthzError, Result};
use crate::types::{Action, Resource, Role, Scope};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Allowed characters for resource, action and scope tokens in config files.
const TOKEN_PATTERN: &str = r"^[A-Za-z0-9_.:\-]+$";

/// Built-in matrix shipped with the crate.
const BUILTIN_CONFIG: &str = include_str!("../config/default_authz.yaml");

/// One atomic grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub role: Role,
    pub resource: Resource,
    pub action: Action,
    pub scope: Scope,
}

impl PermissionEntry {
    pub fn new(
        role: Role,
        resource: impl Into<Resource>,
        action: impl Into<Action>,
        scope: impl Into<Scope>,
    ) -> Self {
        Self {
            role,
            resource: resource.into(),
            action: action.into(),
            scope: scope.into(),
        }
    }
}

/// Compact config form: one role on one resource, several actions and scopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    pub role: Role,
    pub resource: Resource,
    pub actions: Vec<Action>,
    pub scopes: Vec<Scope>,
}

impl Grant {
    /// Expands into one entry per (action, scope) pair.
    pub fn entries(&self) -> impl Iterator<Item = PermissionEntry> + '_ {
        self.actions.iter().flat_map(move |action| {
            self.scopes.iter().map(move |scope| PermissionEntry {
                role: self.role.clone(),
                resource: self.resource.clone(),
                action: action.clone(),
                scope: scope.clone(),
            })
        })
    }
}

/// Full authorization configuration as loaded from YAML or JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthzConfig {
    /// Config version string.
    pub version: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,

    /// Role grants.
    #[serde(default)]
    pub grants: Vec<Grant>,

    /// Feature key -> roles allowed to use it.
    #[serde(default)]
    pub features: BTreeMap<String, Vec<Role>>,
}

impl AuthzConfig {
    /// The rental platform's default matrix.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CONFIG)
    }

    /// Parses a config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AuthzConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a config from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AuthzConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the config to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| AuthzError::SerializationError(e.to_string()))
    }

    /// Serializes the config to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AuthzError::SerializationError(e.to_string()))
    }

    /// Validates the config.
    ///
    /// Rejects grants to unrecognized roles: nothing may ever be granted to
    /// `Role::Unknown`.
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(AuthzError::ValidationError("Config version is required".to_string()));
        }

        let token = Regex::new(TOKEN_PATTERN)?;

        for (index, grant) in self.grants.iter().enumerate() {
            if !grant.role.is_recognized() {
                return Err(AuthzError::ValidationError(format!(
                    "Grant #{} names unrecognized role '{}'",
                    index,
                    grant.role.as_str()
                )));
            }

            if !grant.resource.is_wildcard() && !token.is_match(grant.resource.as_str()) {
                return Err(AuthzError::ValidationError(format!(
                    "Grant #{} has invalid resource '{}'",
                    index, grant.resource
                )));
            }

            if grant.actions.is_empty() {
                return Err(AuthzError::ValidationError(format!(
                    "Grant #{} ({} on {}) has no actions",
                    index,
                    grant.role.as_str(),
                    grant.resource
                )));
            }

            if grant.scopes.is_empty() {
                return Err(AuthzError::ValidationError(format!(
                    "Grant #{} ({} on {}) has no scopes",
                    index,
                    grant.role.as_str(),
                    grant.resource
                )));
            }

            for action in &grant.actions {
                if !token.is_match(action.as_str()) {
                    return Err(AuthzError::ValidationError(format!(
                        "Grant #{} has invalid action '{}'",
                        index, action
                    )));
                }
            }

            for scope in &grant.scopes {
                if !token.is_match(scope.as_str()) {
                    return Err(AuthzError::ValidationError(format!(
                        "Grant #{} has invalid scope '{}'",
                        index, scope
                    )));
                }
            }
        }

        for (feature, roles) in &self.features {
            if feature.is_empty() {
                return Err(AuthzError::ValidationError("Feature key is required".to_string()));
            }
            if let Some(role) = roles.iter().find(|r| !r.is_recognized()) {
                return Err(AuthzError::ValidationError(format!(
                    "Feature '{}' names unrecognized role '{}'",
                    feature,
                    role.as_str()
                )));
            }
        }

        Ok(())
    }

    /// All entries, grants expanded in declaration order.
    pub fn entries(&self) -> Vec<PermissionEntry> {
        self.grants.iter().flat_map(Grant::entries).collect()
    }

    /// Builds the immutable matrix.
    pub fn matrix(&self) -> PermissionMatrix {
        PermissionMatrix::from_entries(self.entries())
    }

    /// Builds the immutable feature map.
    pub fn capabilities(&self) -> FeatureCapabilities {
        FeatureCapabilities::from_map(
            self.features
                .iter()
                .map(|(key, roles)| (key.clone(), roles.iter().cloned())),
        )
    }

    /// SHA-256 over the canonical JSON form of this config.
    pub fn fingerprint(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        let hash = crate::canonicalization::canonical_hash(&value)?;
        Ok(crate::hash::fingerprint(&hash))
    }
}

type ScopeTable = BTreeMap<Action, BTreeSet<Scope>>;

/// Immutable set of grants indexed by role, resource and action.
#[derive(Debug, Clone, Default)]
pub struct PermissionMatrix {
    entries: Vec<PermissionEntry>,
    index: HashMap<Role, BTreeMap<Resource, ScopeTable>>,
}

impl PermissionMatrix {
    /// Builds a matrix. Entries for unrecognized roles are dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = PermissionEntry>) -> Self {
        let mut kept = Vec::new();
        let mut index: HashMap<Role, BTreeMap<Resource, ScopeTable>> = HashMap::new();

        for entry in entries {
            if !entry.role.is_recognized() {
                tracing::warn!(role = entry.role.as_str(), "dropping grant for unrecognized role");
                continue;
            }

            let inserted = index
                .entry(entry.role.clone())
                .or_default()
                .entry(entry.resource.clone())
                .or_default()
                .entry(entry.action.clone())
                .or_default()
                .insert(entry.scope.clone());

            if inserted {
                kept.push(entry);
            }
        }

        Self { entries: kept, index }
    }

    /// Distinct entries in insertion order.
    pub fn entries(&self) -> &[PermissionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Roles holding at least one grant.
    pub fn roles(&self) -> BTreeSet<Role> {
        self.index.keys().cloned().collect()
    }

    /// Action tables that apply to `resource` for `role`: the exact entry and
    /// the wildcard entry, when present.
    pub(crate) fn tables(&self, role: &Role, resource: &str) -> Vec<&ScopeTable> {
        let Some(resources) = self.index.get(role) else {
            return Vec::new();
        };

        let mut tables = Vec::with_capacity(2);
        if let Some(table) = resources.get(resource) {
            tables.push(table);
        }
        if resource != Resource::WILDCARD {
            if let Some(table) = resources.get(Resource::WILDCARD) {
                tables.push(table);
            }
        }
        tables
    }
}

/// Coarse-grained feature gates: capability key -> allowed roles.
#[derive(Debug, Clone, Default)]
pub struct FeatureCapabilities {
    features: BTreeMap<String, BTreeSet<Role>>,
}

impl FeatureCapabilities {
    pub fn from_map<I, R>(features: I) -> Self
    where
        I: IntoIterator<Item = (String, R)>,
        R: IntoIterator<Item = Role>,
    {
        let features = features
            .into_iter()
            .map(|(key, roles)| {
                let roles = roles.into_iter().filter(Role::is_recognized).collect();
                (key, roles)
            })
            .collect();
        Self { features }
    }

    /// Roles allowed for `feature`, if the feature exists.
    pub fn roles(&self, feature: &str) -> Option<&BTreeSet<Role>> {
        self.features.get(feature)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }
}
