//! Authorization config file parser.

use crate::error::Result;
use crate::matrix::AuthzConfig;
use std::path::Path;

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detects format from file extension.
    pub fn from_extension(path: &str) -> Option<Self> {
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            Some(ConfigFormat::Yaml)
        } else if path.ends_with(".json") {
            Some(ConfigFormat::Json)
        } else {
            None
        }
    }

    /// Detects format from content.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            ConfigFormat::Json
        } else {
            ConfigFormat::Yaml
        }
    }
}

/// Parses a config from a string, auto-detecting format.
pub fn parse_config(content: &str) -> Result<AuthzConfig> {
    parse_config_with_format(content, ConfigFormat::detect(content))
}

/// Parses a config from a string with specified format.
pub fn parse_config_with_format(content: &str, format: ConfigFormat) -> Result<AuthzConfig> {
    match format {
        ConfigFormat::Yaml => AuthzConfig::from_yaml(content),
        ConfigFormat::Json => AuthzConfig::from_json(content),
    }
}

/// Reads and parses a config file. Format comes from the extension, falling
/// back to content detection.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<AuthzConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let format = path
        .to_str()
        .and_then(ConfigFormat::from_extension)
        .unwrap_or_else(|| ConfigFormat::detect(&content));

    let config = parse_config_with_format(&content, format)?;
    tracing::info!(
        path = %path.display(),
        version = %config.version,
        grants = config.grants.len(),
        "loaded authorization config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthzError;

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::detect(r#"{"version": "1"}"#), ConfigFormat::Json);
        assert_eq!(ConfigFormat::detect("version: \"1\""), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_extension("authz.yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("authz.json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("authz.toml"), None);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
version: "1"
grants:
  - role: client
    resource: reservations
    actions: [read]
    scopes: [own]
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.grants.len(), 1);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"version": "1", "grants": [], "features": {"reports": ["executive"]}}"#;
        let config = parse_config(json).unwrap();
        assert_eq!(config.features.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config_file("/nonexistent/authz.yaml").unwrap_err();
        assert!(matches!(err, AuthzError::Io(_)));
    }

    #[test]
    fn test_load_file_round_trip() {
        let path = std::env::temp_dir().join(format!("rental-authz-{}.json", std::process::id()));
        let config = AuthzConfig::builtin().unwrap();
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        let loaded = load_config_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.fingerprint().unwrap(), config.fingerprint().unwrap());
    }
}
