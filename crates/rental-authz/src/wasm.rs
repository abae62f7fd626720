//! WASM bindings for the browser dashboard.

#![cfg(feature = "wasm")]

use crate::context::FilterParams;
use crate::evaluator::PermissionEvaluator;
use crate::filter::RoleFilter;
use crate::matrix::AuthzConfig;
use crate::types::{Resource, Role};
use std::sync::Arc;
use wasm_bindgen::prelude::*;

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Authorization engine handle exposed to JavaScript.
#[wasm_bindgen]
pub struct WasmAuthzEngine {
    filter: RoleFilter,
    fingerprint: String,
}

#[wasm_bindgen]
impl WasmAuthzEngine {
    /// Creates an engine over the built-in matrix.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmAuthzEngine, JsValue> {
        let config = AuthzConfig::builtin().map_err(js_error)?;
        Self::from_config(&config)
    }

    /// Creates an engine from a YAML config string.
    #[wasm_bindgen(js_name = fromYaml)]
    pub fn from_yaml(yaml: &str) -> Result<WasmAuthzEngine, JsValue> {
        let config = AuthzConfig::from_yaml(yaml).map_err(js_error)?;
        Self::from_config(&config)
    }

    /// Creates an engine from a JSON config string.
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<WasmAuthzEngine, JsValue> {
        let config = AuthzConfig::from_json(json).map_err(js_error)?;
        Self::from_config(&config)
    }

    fn from_config(config: &AuthzConfig) -> Result<WasmAuthzEngine, JsValue> {
        let fingerprint = config.fingerprint().map_err(js_error)?;
        let evaluator = Arc::new(PermissionEvaluator::from_config(config));
        Ok(Self {
            filter: RoleFilter::new(evaluator),
            fingerprint,
        })
    }

    #[wasm_bindgen(js_name = hasPermission)]
    pub fn has_permission(
        &self,
        role: Option<String>,
        resource: &str,
        action: &str,
        scope: Option<String>,
    ) -> bool {
        self.filter
            .evaluator()
            .has_permission_str(role.as_deref(), resource, action, scope.as_deref())
    }

    #[wasm_bindgen(js_name = canAccess)]
    pub fn can_access(&self, role: Option<String>, feature: &str) -> bool {
        self.filter
            .evaluator()
            .can_access(&Role::parse(role.as_deref()), feature)
    }

    #[wasm_bindgen(js_name = canAccessResource)]
    pub fn can_access_resource(&self, role: Option<String>, resource: &str) -> bool {
        self.filter
            .evaluator()
            .can_access_resource(&Role::parse(role.as_deref()), &Resource::from(resource))
    }

    /// Returns the allowed scopes as a JSON array string.
    #[wasm_bindgen(js_name = getAllowedScopes)]
    pub fn get_allowed_scopes(&self, role: Option<String>, resource: &str) -> Result<String, JsValue> {
        let scopes = self
            .filter
            .evaluator()
            .get_allowed_scopes(&Role::parse(role.as_deref()), &Resource::from(resource));
        serde_json::to_string(&scopes).map_err(js_error)
    }

    /// `candidates_json` must be a JSON array of role names; `null` or a
    /// missing argument throws.
    #[wasm_bindgen(js_name = hasAnyRole)]
    pub fn has_any_role(&self, role: Option<String>, candidates_json: Option<String>) -> Result<bool, JsValue> {
        let candidates: Option<Vec<Role>> = match candidates_json {
            Some(json) => serde_json::from_str(&json).map_err(js_error)?,
            None => None,
        };
        PermissionEvaluator::has_any_role(&Role::parse(role.as_deref()), candidates.as_deref())
            .map_err(js_error)
    }

    /// Filters a JSON array of records. Returns the filtered JSON array.
    #[wasm_bindgen(js_name = withRoleBasedFiltering)]
    pub fn with_role_based_filtering(
        &self,
        data_json: &str,
        role: Option<String>,
        filter_type: &str,
        params_json: Option<String>,
    ) -> Result<String, JsValue> {
        let data: serde_json::Value = serde_json::from_str(data_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid data: {}", e)))?;
        let params: FilterParams = match params_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid params: {}", e)))?,
            None => FilterParams::default(),
        };

        let filtered = self
            .filter
            .with_role_based_filtering(&data, &Role::parse(role.as_deref()), filter_type, &params)
            .map_err(js_error)?;

        serde_json::to_string(&filtered).map_err(js_error)
    }

    /// Fingerprint of the loaded config.
    #[wasm_bindgen(js_name = configFingerprint)]
    pub fn config_fingerprint(&self) -> String {
        self.fingerprint.clone()
    }
}

/// Logs a message to the console (for debugging).
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Returns the version of the authorization engine.
#[wasm_bindgen]
pub fn version() -> String {
    crate::VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_engine_permissions() {
        let engine = WasmAuthzEngine::new().unwrap();
        assert!(engine.has_permission(Some("member".into()), "tasks", "read", Some("own".into())));
        assert!(!engine.has_permission(None, "tasks", "read", None));
        assert!(engine.can_access(Some("executive".into()), "financial-dashboard"));
        assert!(engine.config_fingerprint().starts_with("sha256:"));
    }

    #[wasm_bindgen_test]
    fn test_engine_filtering() {
        let engine = WasmAuthzEngine::new().unwrap();
        let data = r#"[{"id":"t-1","assigned_to":"u-1"},{"id":"t-2","assigned_to":"u-2"}]"#;
        let out = engine
            .with_role_based_filtering(data, Some("member".into()), "tasks", Some(r#"{"userId":"u-1"}"#.into()))
            .unwrap();
        assert_eq!(out, r#"[{"assigned_to":"u-1","id":"t-1"}]"#);

        assert!(engine
            .with_role_based_filtering("null", Some("member".into()), "tasks", None)
            .is_err());
    }

    #[wasm_bindgen_test]
    fn test_engine_has_any_role() {
        let engine = WasmAuthzEngine::new().unwrap();
        assert!(engine.has_any_role(Some("admin".into()), Some(r#"["admin"]"#.into())).unwrap());
        assert!(!engine.has_any_role(Some("admin".into()), Some("[]".into())).unwrap());
        assert!(engine.has_any_role(Some("admin".into()), None).is_err());
        assert!(engine.has_any_role(Some("admin".into()), Some("null".into())).is_err());
    }
}
