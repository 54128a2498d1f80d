//! Queue settings parsing.

use gantry_core::Visibility;
use kdl::{KdlDocument, KdlNode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ConfigError, ConfigResult};

/// Settings for the build-queue admission core. Owned by the embedding
/// application; every branch of the admission logic is driven by this
/// struct rather than runtime flag lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Application-wide monthly minutes limit applied to namespaces that
    /// have no limit of their own. `None` (or zero) means unlimited.
    pub default_minutes_limit: Option<u32>,
    /// Visibility levels whose builds bypass minutes accounting on shared
    /// runners.
    pub quota_exempt_visibilities: Vec<Visibility>,
    /// Incident-response escape hatch: when set, quota enforcement is
    /// skipped entirely and the full candidate set is dispatched.
    pub disaster_recovery_bypass: bool,
    /// Resolve root namespaces through materialized traversal ids instead
    /// of walking parent links.
    pub use_traversal_ids: bool,
    /// Endpoint serving the public runner release list.
    pub runner_releases_url: Option<Url>,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            default_minutes_limit: None,
            quota_exempt_visibilities: vec![Visibility::Public],
            disaster_recovery_bypass: false,
            use_traversal_ids: true,
            runner_releases_url: None,
        }
    }
}

/// Parse queue settings from KDL text.
pub fn parse_queue_settings(kdl: &str) -> ConfigResult<QueueSettings> {
    let doc: KdlDocument = kdl.parse()?;
    let mut settings = QueueSettings::default();

    for node in doc.nodes() {
        match node.name().value() {
            "default-minutes-limit" => {
                let minutes = get_first_int_arg(node).ok_or_else(|| {
                    ConfigError::MissingField("default-minutes-limit value".to_string())
                })?;
                settings.default_minutes_limit =
                    Some(u32::try_from(minutes).map_err(|_| ConfigError::InvalidValue {
                        field: "default-minutes-limit".to_string(),
                        message: format!("out of range: {}", minutes),
                    })?);
            }
            "quota-exempt-visibility" => {
                settings.quota_exempt_visibilities = get_all_string_args(node)
                    .iter()
                    .map(|s| parse_visibility(s))
                    .collect::<ConfigResult<Vec<_>>>()?;
            }
            "disaster-recovery-bypass" => {
                settings.disaster_recovery_bypass = get_first_bool_arg(node).unwrap_or(false);
            }
            "use-traversal-ids" => {
                settings.use_traversal_ids = get_first_bool_arg(node).unwrap_or(true);
            }
            "runner-releases-url" => {
                let raw = get_first_string_arg(node).ok_or_else(|| {
                    ConfigError::MissingField("runner-releases-url value".to_string())
                })?;
                let url = raw.parse::<Url>().map_err(|e| ConfigError::InvalidValue {
                    field: "runner-releases-url".to_string(),
                    message: e.to_string(),
                })?;
                settings.runner_releases_url = Some(url);
            }
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(settings)
}

fn parse_visibility(s: &str) -> ConfigResult<Visibility> {
    match s {
        "private" => Ok(Visibility::Private),
        "internal" => Ok(Visibility::Internal),
        "public" => Ok(Visibility::Public),
        other => Err(ConfigError::InvalidValue {
            field: "quota-exempt-visibility".to_string(),
            message: format!("unknown visibility: {}", other),
        }),
    }
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn get_first_bool_arg(node: &KdlNode) -> Option<bool> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_bool())
}

fn get_first_int_arg(node: &KdlNode) -> Option<i128> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let kdl = r#"
            default-minutes-limit 400
            quota-exempt-visibility "public" "internal"
            disaster-recovery-bypass #false
            use-traversal-ids #true
            runner-releases-url "https://releases.example.com/runner"
        "#;

        let settings = parse_queue_settings(kdl).unwrap();
        assert_eq!(settings.default_minutes_limit, Some(400));
        assert_eq!(
            settings.quota_exempt_visibilities,
            vec![Visibility::Public, Visibility::Internal]
        );
        assert!(!settings.disaster_recovery_bypass);
        assert!(settings.use_traversal_ids);
        assert_eq!(
            settings.runner_releases_url.unwrap().as_str(),
            "https://releases.example.com/runner"
        );
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let settings = parse_queue_settings("").unwrap();
        assert_eq!(settings.default_minutes_limit, None);
        assert_eq!(settings.quota_exempt_visibilities, vec![Visibility::Public]);
        assert!(!settings.disaster_recovery_bypass);
    }

    #[test]
    fn test_invalid_visibility_rejected() {
        let result = parse_queue_settings(r#"quota-exempt-visibility "secret""#);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = parse_queue_settings(r#"runner-releases-url "not a url""#);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_negative_minutes_rejected() {
        let result = parse_queue_settings("default-minutes-limit -5");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }
}
