//! Rental Authz
//!
//! Role-based authorization and data scoping for the rental management
//! platform. Compiles to native (API handlers) and WASM (dashboard).
//!
//! Two questions are answered here, synchronously and without I/O:
//! whether a role may perform an action on a resource, and which records of
//! a fetched collection the caller may see. Unknown roles, resources and
//! scopes always resolve to deny; only caller contract violations are errors.

pub mod canonicalization;
pub mod context;
pub mod decision;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod hash;
pub mod matrix;
pub mod parser;
pub mod scoping;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use context::{FilterParams, ScopingContext};
pub use decision::{AccessDecision, Decision};
pub use error::{AuthzError, Result};
pub use evaluator::{default_evaluator, PermissionEvaluator};
pub use filter::{filter_data, filter_records, FallbackPolicy, FilterRegistry, RoleFilter};
pub use matrix::{AuthzConfig, FeatureCapabilities, PermissionEntry, PermissionMatrix};
pub use scoping::{Record, ScopingPredicate, Visibility};
pub use types::{Action, Resource, Role, Scope};

/// Version of the authorization engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::context::{FilterParams, ScopingContext};
    pub use crate::decision::{AccessDecision, Decision};
    pub use crate::error::{AuthzError, Result};
    pub use crate::evaluator::{default_evaluator, PermissionEvaluator};
    pub use crate::filter::{filter_data, filter_records, FallbackPolicy, RoleFilter};
    pub use crate::matrix::AuthzConfig;
    pub use crate::scoping::*;
    pub use crate::types::*;
}
