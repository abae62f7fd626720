//! Per-entity visibility rules.
//!
//! A predicate first resolves how much of its resource the caller's role may
//! read (`Visibility`), then, for narrow grants, tests the record's ownership
//! fields. Records are only ever asked for named top-level fields and those
//! are compared by string equality, never parsed or walked.

use crate::context::ScopingContext;
use crate::evaluator::PermissionEvaluator;
use crate::types::{Action, Resource, Scope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ownership field names read by the built-in predicates.
pub mod fields {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const ASSIGNED_TO: &str = "assigned_to";
}

/// Read access to a record's top-level string fields.
pub trait Record {
    /// Value of `name` if present and a string.
    fn field(&self, name: &str) -> Option<&str>;
}

impl Record for serde_json::Value {
    fn field(&self, name: &str) -> Option<&str> {
        self.as_object()?.get(name)?.as_str()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<&str> {
        (**self).field(name)
    }
}

/// How much of a resource the caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every record.
    Everything,
    /// Records passing the predicate's field test.
    Matching,
    /// No record.
    Nothing,
}

impl Visibility {
    pub fn admits<P: ScopingPredicate + ?Sized>(
        self,
        predicate: &P,
        record: &dyn Record,
        ctx: &ScopingContext,
    ) -> bool {
        match self {
            Visibility::Everything => true,
            Visibility::Matching => predicate.record_matches(record, ctx),
            Visibility::Nothing => false,
        }
    }
}

/// Visibility rule for one entity family.
pub trait ScopingPredicate: Send + Sync + fmt::Debug {
    /// Matrix resource whose `read` grant governs this entity.
    fn resource(&self) -> &str;

    /// Scope under which records are tested field by field, if any.
    fn narrow_scope(&self) -> Option<&str>;

    /// Field test applied under the narrow scope.
    fn record_matches(&self, record: &dyn Record, ctx: &ScopingContext) -> bool;

    /// Whether the field test reads the caller's user id. Predicates that
    /// never do can be evaluated for callers without one.
    fn requires_user_id(&self) -> bool {
        true
    }

    /// Resolves the caller's breadth from the `read` grant.
    fn visibility(&self, ctx: &ScopingContext, evaluator: &PermissionEvaluator) -> Visibility {
        let scopes = evaluator.allowed_scopes_for(&ctx.role, self.resource(), Action::READ);

        if scopes.iter().any(Scope::is_unrestricted) {
            Visibility::Everything
        } else if self.narrow_scope().is_some_and(|narrow| scopes.contains(narrow)) {
            Visibility::Matching
        } else {
            Visibility::Nothing
        }
    }

    /// Whether the caller may see `record`.
    fn is_visible(
        &self,
        record: &dyn Record,
        ctx: &ScopingContext,
        evaluator: &PermissionEvaluator,
    ) -> bool {
        self.visibility(ctx, evaluator).admits(self, record, ctx)
    }
}

/// Tasks: visible to their assignee or their creator under `own`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskOwnership;

impl ScopingPredicate for TaskOwnership {
    fn resource(&self) -> &str {
        Resource::TASKS
    }

    fn narrow_scope(&self) -> Option<&str> {
        Some(Scope::OWN)
    }

    fn record_matches(&self, record: &dyn Record, ctx: &ScopingContext) -> bool {
        ctx.owns(record.field(fields::ASSIGNED_TO)) || ctx.owns(record.field(fields::USER_ID))
    }
}

/// Notifications: visible to their recipient under `own`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationOwnership;

impl ScopingPredicate for NotificationOwnership {
    fn resource(&self) -> &str {
        Resource::NOTIFICATIONS
    }

    fn narrow_scope(&self) -> Option<&str> {
        Some(Scope::OWN)
    }

    fn record_matches(&self, record: &dyn Record, ctx: &ScopingContext) -> bool {
        ctx.owns(record.field(fields::USER_ID))
    }
}

/// Lofts: visible when listed in the caller's assignments under `assigned`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftAssignment;

impl ScopingPredicate for LoftAssignment {
    fn resource(&self) -> &str {
        Resource::LOFTS
    }

    fn narrow_scope(&self) -> Option<&str> {
        Some(Scope::ASSIGNED)
    }

    fn requires_user_id(&self) -> bool {
        false
    }

    fn record_matches(&self, record: &dyn Record, ctx: &ScopingContext) -> bool {
        ctx.is_assigned(record.field(fields::ID))
    }
}

/// Financial records: role-gated. Any grant on `financial` shows everything,
/// no grant shows nothing; record contents are never consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialGate;

impl ScopingPredicate for FinancialGate {
    fn resource(&self) -> &str {
        Resource::FINANCIAL
    }

    fn narrow_scope(&self) -> Option<&str> {
        None
    }

    fn record_matches(&self, _record: &dyn Record, _ctx: &ScopingContext) -> bool {
        false
    }

    fn requires_user_id(&self) -> bool {
        false
    }

    fn visibility(&self, ctx: &ScopingContext, evaluator: &PermissionEvaluator) -> Visibility {
        if evaluator.can_access_resource(&ctx.role, &Resource::from(Resource::FINANCIAL)) {
            Visibility::Everything
        } else {
            Visibility::Nothing
        }
    }
}

/// Maintenance or housekeeping task attached to a loft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub loft_id: Option<String>,
}

impl Record for TaskRecord {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::ID => Some(self.id.as_str()),
            fields::ASSIGNED_TO => self.assigned_to.as_deref(),
            fields::USER_ID => self.user_id.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoftRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Record for LoftRecord {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::ID => Some(self.id.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub is_read: bool,
}

impl Record for NotificationRecord {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::ID => Some(self.id.as_str()),
            fields::USER_ID => self.user_id.as_deref(),
            _ => None,
        }
    }
}

/// Income or expense line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub amount_cents: i64,
    pub currency: String,
    #[serde(default)]
    pub loft_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Record for TransactionRecord {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::ID => Some(self.id.as_str()),
            _ => None,
        }
    }
}
