//! Per-request scoping input.

use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Who is asking, built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopingContext {
    /// Role resolved by the identity layer.
    pub role: Role,

    /// Caller's user id.
    pub user_id: String,

    /// Resource ids the caller is assigned to (lofts, reservations, ...).
    #[serde(default)]
    pub assigned_resource_ids: BTreeSet<String>,
}

impl ScopingContext {
    /// Creates a context with no assignments.
    pub fn new(role: Role, user_id: impl Into<String>) -> Self {
        Self {
            role,
            user_id: user_id.into(),
            assigned_resource_ids: BTreeSet::new(),
        }
    }

    /// Sets the assigned resource ids.
    pub fn with_assigned_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assigned_resource_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// True iff `user_id` is non-empty and equals `owner`.
    pub fn owns(&self, owner: Option<&str>) -> bool {
        !self.user_id.is_empty() && owner == Some(self.user_id.as_str())
    }

    /// True iff `id` is one of the assigned ids.
    pub fn is_assigned(&self, id: Option<&str>) -> bool {
        id.is_some_and(|id| self.assigned_resource_ids.contains(id))
    }
}

/// Loose parameter bag passed to the string-keyed dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub assigned_resource_ids: Option<Vec<String>>,
}

impl FilterParams {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            assigned_resource_ids: None,
        }
    }

    pub fn with_assigned_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assigned_resource_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Builds a context, or `None` when the user id is missing or empty.
    pub fn to_context(&self, role: &Role) -> Option<ScopingContext> {
        let user_id = self.user_id.as_deref().filter(|id| !id.is_empty())?;
        Some(self.context_for(role, user_id))
    }

    /// Builds a context with an empty user id, which owns no record.
    /// Assignments are carried over.
    pub fn to_anonymous_context(&self, role: &Role) -> ScopingContext {
        self.context_for(role, "")
    }

    fn context_for(&self, role: &Role, user_id: &str) -> ScopingContext {
        let context = ScopingContext::new(role.clone(), user_id);
        match &self.assigned_resource_ids {
            Some(ids) => context.with_assigned_ids(ids.iter().cloned()),
            None => context,
        }
    }
}
