//! Property tests for deny-by-default and scope monotonicity.

use proptest::prelude::*;
use rental_authz::prelude::*;
use serde_json::{json, Value};

fn token_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_.\\-]{1,24}").expect("regex should be valid for token strategy")
}

fn unknown_role_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[a-zA-Z_-]{1,16}"
            .prop_filter("must not be a recognized role", |r| !Role::from(r.as_str()).is_recognized())
            .prop_map(Some),
    ]
}

fn task_strategy() -> impl Strategy<Value = Value> {
    (
        prop::option::of("u-[0-9]{1,2}"),
        prop::option::of("u-[0-9]{1,2}"),
    )
        .prop_map(|(assigned_to, user_id)| {
            let mut task = json!({"title": "Inspect boiler"});
            if let Some(a) = assigned_to {
                task["assigned_to"] = json!(a);
            }
            if let Some(u) = user_id {
                task["user_id"] = json!(u);
            }
            task
        })
}

proptest! {
    #[test]
    fn unknown_roles_never_pass(
        role in unknown_role_strategy(),
        resource in token_strategy(),
        action in token_strategy(),
        scope in prop::option::of(token_strategy()),
    ) {
        let ev = default_evaluator().unwrap();
        prop_assert!(!ev.has_permission_str(role.as_deref(), &resource, &action, scope.as_deref()));
        prop_assert!(!ev.can_access(&Role::parse(role.as_deref()), &resource));
    }

    #[test]
    fn admin_reads_any_resource(resource in token_strategy()) {
        let ev = default_evaluator().unwrap();
        prop_assert!(ev.has_permission_str(Some("admin"), &resource, "read", None));
    }

    #[test]
    fn widening_scope_never_shrinks_results(
        tasks in prop::collection::vec(task_strategy(), 0..64),
        user in "u-[0-9]{1,2}",
    ) {
        let filter = RoleFilter::new(default_evaluator().unwrap());
        let data = Value::Array(tasks);
        let params = FilterParams::for_user(user.clone());

        let own = filter.with_role_based_filtering(&data, &Role::Member, "tasks", &params).unwrap();
        let all = filter.with_role_based_filtering(&data, &Role::Manager, "tasks", &params).unwrap();

        let own = own.as_array().unwrap();
        prop_assert!(own.len() <= all.as_array().unwrap().len());
        for task in own {
            let mine = task["assigned_to"].as_str() == Some(user.as_str())
                || task["user_id"].as_str() == Some(user.as_str());
            prop_assert!(mine);
        }
    }

    #[test]
    fn filtered_output_preserves_order(tasks in prop::collection::vec(task_strategy(), 0..64)) {
        let indexed: Vec<Value> = tasks
            .into_iter()
            .enumerate()
            .map(|(i, mut t)| { t["seq"] = json!(i); t })
            .collect();
        let filter = RoleFilter::new(default_evaluator().unwrap());
        let out = filter
            .with_role_based_filtering(&Value::Array(indexed), &Role::Member, "tasks", &FilterParams::for_user("u-1"))
            .unwrap();

        let seqs: Vec<u64> = out.as_array().unwrap().iter().filter_map(|t| t["seq"].as_u64()).collect();
        let mut sorted = seqs.clone();
        sorted.sort_unstable();
        prop_assert_eq!(seqs, sorted);
    }
}
