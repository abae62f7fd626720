//! Collection filtering entry points.

use crate::context::{FilterParams, ScopingContext};
use crate::error::{AuthzError, Result};
use crate::evaluator::PermissionEvaluator;
use crate::scoping::{
    FinancialGate, LoftAssignment, NotificationOwnership, Record, ScopingPredicate, TaskOwnership,
};
use crate::types::Role;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Keeps the items `predicate` accepts, in their original order.
pub fn filter_data<T, I, F>(items: I, mut predicate: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> bool,
{
    items.into_iter().filter(|item| predicate(item)).collect()
}

/// Applies a scoping predicate to typed records.
///
/// The caller's breadth is resolved once for the whole collection.
pub fn filter_records<R, I>(
    items: I,
    predicate: &dyn ScopingPredicate,
    ctx: &ScopingContext,
    evaluator: &PermissionEvaluator,
) -> Vec<R>
where
    R: Record,
    I: IntoIterator<Item = R>,
{
    let visibility = predicate.visibility(ctx, evaluator);
    filter_data(items, |record| visibility.admits(predicate, record, ctx))
}

/// Predicates addressable by string key.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    predicates: BTreeMap<String, Arc<dyn ScopingPredicate>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the rental platform's entity families.
    pub fn with_builtin() -> Self {
        let financial: Arc<dyn ScopingPredicate> = Arc::new(FinancialGate);

        let mut registry = Self::new();
        registry.register("tasks", Arc::new(TaskOwnership));
        registry.register("lofts", Arc::new(LoftAssignment));
        registry.register("notifications", Arc::new(NotificationOwnership));
        registry.register("transactions", Arc::clone(&financial));
        registry.register("financial", financial);
        registry
    }

    /// Registers (or replaces) the predicate for `key`.
    pub fn register(&mut self, key: impl Into<String>, predicate: Arc<dyn ScopingPredicate>) {
        self.predicates.insert(key.into(), predicate);
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn ScopingPredicate>> {
        self.predicates.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }
}

/// What the dispatcher returns when it cannot evaluate a predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Return the input unfiltered.
    #[default]
    FailOpen,
    /// Return an empty collection.
    FailClosed,
}

/// Why a collection went through the dispatcher without being filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfilteredReason {
    UnknownFilterType,
    MissingUserId,
}

impl fmt::Display for UnfilteredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnfilteredReason::UnknownFilterType => f.write_str("unknown filter type"),
            UnfilteredReason::MissingUserId => f.write_str("missing userId"),
        }
    }
}

/// String-keyed dispatcher for callers that only know entity types at runtime.
#[derive(Debug, Clone)]
pub struct RoleFilter {
    evaluator: Arc<PermissionEvaluator>,
    registry: FilterRegistry,
    fallback: FallbackPolicy,
}

impl RoleFilter {
    /// Dispatcher over the built-in registry, failing open.
    pub fn new(evaluator: Arc<PermissionEvaluator>) -> Self {
        Self::with_registry(evaluator, FilterRegistry::with_builtin())
    }

    pub fn with_registry(evaluator: Arc<PermissionEvaluator>, registry: FilterRegistry) -> Self {
        Self {
            evaluator,
            registry,
            fallback: FallbackPolicy::default(),
        }
    }

    /// Sets the fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Filters a JSON array with the predicate registered as `filter_type`.
    ///
    /// `data` must be an array; anything else (including `null`) is a caller
    /// bug and returns `AuthzError::NotAnArray`. An unregistered filter type, or
    /// a missing `userId` for a predicate that reads it, is handled by the
    /// fallback policy: under the default `FailOpen` the input comes back
    /// unfiltered. Role-gated and assignment-based predicates are evaluated
    /// without a user id.
    pub fn with_role_based_filtering(
        &self,
        data: &Value,
        role: &Role,
        filter_type: &str,
        params: &FilterParams,
    ) -> Result<Value> {
        let Value::Array(items) = data else {
            return Err(AuthzError::NotAnArray(json_kind(data).to_string()));
        };

        let Some(predicate) = self.registry.get(filter_type) else {
            return Ok(self.unfiltered(data, filter_type, UnfilteredReason::UnknownFilterType));
        };

        let ctx = match params.to_context(role) {
            Some(ctx) => ctx,
            None if !predicate.requires_user_id() => params.to_anonymous_context(role),
            None => {
                return Ok(self.unfiltered(data, filter_type, UnfilteredReason::MissingUserId));
            }
        };

        let visible: Vec<Value> = filter_records(items.iter(), &**predicate, &ctx, &self.evaluator)
            .into_iter()
            .cloned()
            .collect();

        tracing::debug!(
            filter_type,
            role = role.as_str(),
            total = items.len(),
            visible = visible.len(),
            "role-based filtering"
        );

        Ok(Value::Array(visible))
    }

    fn unfiltered(&self, data: &Value, filter_type: &str, reason: UnfilteredReason) -> Value {
        tracing::warn!(
            filter_type,
            %reason,
            policy = ?self.fallback,
            "role-based filtering skipped"
        );

        match self.fallback {
            FallbackPolicy::FailOpen => data.clone(),
            FallbackPolicy::FailClosed => Value::Array(Vec::new()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::AuthzConfig;
    use crate::scoping::TaskRecord;
    use serde_json::json;
    use tracing_test::traced_test;

    fn role_filter() -> RoleFilter {
        let config = AuthzConfig::builtin().unwrap();
        RoleFilter::new(Arc::new(PermissionEvaluator::from_config(&config)))
    }

    fn tasks() -> Value {
        json!([
            {"id": "t-1", "assigned_to": "u-1", "user_id": "u-2"},
            {"id": "t-2", "assigned_to": "u-3", "user_id": "u-1"},
            {"id": "t-3", "assigned_to": "u-3", "user_id": "u-3"},
            {"id": "t-4"}
        ])
    }

    #[test]
    fn test_filter_data_keeps_order() {
        let evens = filter_data(vec![1, 2, 3, 4, 6, 5], |n| n % 2 == 0);
        assert_eq!(evens, vec![2, 4, 6]);

        let empty: Vec<i32> = filter_data(Vec::new(), |_| true);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_filter_records_typed() {
        let filter = role_filter();
        let records = vec![
            TaskRecord {
                id: "t-1".into(),
                title: "Replace smoke detector".into(),
                assigned_to: Some("u-1".into()),
                ..Default::default()
            },
            TaskRecord {
                id: "t-2".into(),
                title: "Deep clean".into(),
                assigned_to: Some("u-2".into()),
                ..Default::default()
            },
        ];
        let ctx = ScopingContext::new(Role::Member, "u-1");
        let visible = filter_records(records, &TaskOwnership, &ctx, filter.evaluator());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "t-1");
    }

    #[test]
    fn test_member_sees_own_tasks() {
        let filter = role_filter();
        let out = filter
            .with_role_based_filtering(&tasks(), &Role::Member, "tasks", &FilterParams::for_user("u-1"))
            .unwrap();
        let ids: Vec<&str> = out.as_array().unwrap().iter().filter_map(|t| t["id"].as_str()).collect();
        assert_eq!(ids, vec!["t-1", "t-2"]);
    }

    #[test]
    fn test_manager_sees_all_tasks() {
        let filter = role_filter();
        let out = filter
            .with_role_based_filtering(&tasks(), &Role::Manager, "tasks", &FilterParams::for_user("u-9"))
            .unwrap();
        assert_eq!(out, tasks());
    }

    #[test]
    fn test_unknown_role_sees_nothing() {
        let filter = role_filter();
        let out = filter
            .with_role_based_filtering(&tasks(), &Role::from("hacker"), "tasks", &FilterParams::for_user("u-1"))
            .unwrap();
        assert_eq!(out, json!([]));
    }

    #[test]
    #[traced_test]
    fn test_unknown_filter_type_passes_through() {
        let filter = role_filter();
        for key in ["Tasks", "TASKS", "bookings", ""] {
            let out = filter
                .with_role_based_filtering(&tasks(), &Role::Member, key, &FilterParams::for_user("u-1"))
                .unwrap();
            assert_eq!(out, tasks());
        }
        assert!(logs_contain("unknown filter type"));
    }

    #[test]
    #[traced_test]
    fn test_missing_user_id_passes_through() {
        let filter = role_filter();
        let out = filter
            .with_role_based_filtering(&tasks(), &Role::Member, "tasks", &FilterParams::default())
            .unwrap();
        assert_eq!(out, tasks());
        assert!(logs_contain("missing userId"));
    }

    #[test]
    fn test_fail_closed_policy() {
        let filter = role_filter().with_fallback(FallbackPolicy::FailClosed);
        let out = filter
            .with_role_based_filtering(&tasks(), &Role::Member, "tasks", &FilterParams::default())
            .unwrap();
        assert_eq!(out, json!([]));

        let out = filter
            .with_role_based_filtering(&tasks(), &Role::Member, "bookings", &FilterParams::for_user("u-1"))
            .unwrap();
        assert_eq!(out, json!([]));
    }

    #[test]
    fn test_non_array_is_rejected() {
        let filter = role_filter();
        for data in [json!(null), json!({"id": "t-1"}), json!("tasks"), json!(3)] {
            let err = filter
                .with_role_based_filtering(&data, &Role::Member, "tasks", &FilterParams::for_user("u"))
                .unwrap_err();
            assert!(matches!(err, AuthzError::NotAnArray(_)));
        }
    }

    #[test]
    fn test_transactions_alias() {
        let filter = role_filter();
        let txs = json!([{"id": "tx-1", "amount_cents": 9900}]);
        let params = FilterParams::for_user("u-1");

        let out = filter
            .with_role_based_filtering(&txs, &Role::Executive, "transactions", &params)
            .unwrap();
        assert_eq!(out, txs);

        let out = filter
            .with_role_based_filtering(&txs, &Role::Client, "financial", &params)
            .unwrap();
        assert_eq!(out, json!([]));
    }

    #[test]
    fn test_financial_gate_without_user_id() {
        let filter = role_filter();
        let txs = json!([{"id": "tx-1", "amount_cents": 9900}, {"id": "tx-2", "amount_cents": 120}]);
        let params = FilterParams::default();

        for key in ["transactions", "financial"] {
            for role in [Role::Member, Role::Client, Role::from("hacker")] {
                let out = filter.with_role_based_filtering(&txs, &role, key, &params).unwrap();
                assert_eq!(out, json!([]), "{} on {}", role.as_str(), key);
            }

            let out = filter
                .with_role_based_filtering(&txs, &Role::Executive, key, &params)
                .unwrap();
            assert_eq!(out, txs);
        }
    }

    fn lofts() -> Value {
        json!([
            {"id": "loft-1", "name": "Canal Street"},
            {"id": "loft-2", "name": "Harbour View"},
            {"id": "loft-3", "name": "Old Mill"}
        ])
    }

    #[test]
    fn test_partner_sees_assigned_lofts() {
        let filter = role_filter();
        let params = FilterParams::for_user("u-5").with_assigned_ids(["loft-1"]);
        let out = filter
            .with_role_based_filtering(&lofts(), &Role::Partner, "lofts", &params)
            .unwrap();
        assert_eq!(out, json!([{"id": "loft-1", "name": "Canal Street"}]));

        let out = filter
            .with_role_based_filtering(&lofts(), &Role::Manager, "lofts", &params)
            .unwrap();
        assert_eq!(out, lofts());

        let out = filter
            .with_role_based_filtering(&lofts(), &Role::Guest, "lofts", &params)
            .unwrap();
        assert_eq!(out, json!([]));
    }

    #[test]
    fn test_lofts_without_user_id_are_still_filtered() {
        let filter = role_filter();
        let params = FilterParams::default().with_assigned_ids(["loft-2"]);
        let out = filter
            .with_role_based_filtering(&lofts(), &Role::Partner, "lofts", &params)
            .unwrap();
        assert_eq!(out, json!([{"id": "loft-2", "name": "Harbour View"}]));

        let out = filter
            .with_role_based_filtering(&lofts(), &Role::Client, "lofts", &FilterParams::default())
            .unwrap();
        assert_eq!(out, json!([]));
    }

    #[test]
    fn test_notifications_dispatch() {
        let filter = role_filter();
        let notifications = json!([
            {"id": "n-1", "user_id": "u-1"},
            {"id": "n-2", "user_id": "u-2"},
            {"id": "n-3"}
        ]);

        let out = filter
            .with_role_based_filtering(&notifications, &Role::Member, "notifications", &FilterParams::for_user("u-1"))
            .unwrap();
        assert_eq!(out, json!([{"id": "n-1", "user_id": "u-1"}]));

        let out = filter
            .with_role_based_filtering(&notifications, &Role::Admin, "notifications", &FilterParams::for_user("u-9"))
            .unwrap();
        assert_eq!(out, notifications);

        let out = filter
            .with_role_based_filtering(&notifications, &Role::Guest, "notifications", &FilterParams::for_user("u-1"))
            .unwrap();
        assert_eq!(out, json!([]));
    }

    #[test]
    fn test_registry_keys() {
        let registry = FilterRegistry::with_builtin();
        let keys: Vec<&str> = registry.keys().collect();
        assert_eq!(keys, vec!["financial", "lofts", "notifications", "tasks", "transactions"]);
    }
}
