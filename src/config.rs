use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Nesting depth past which associated topics are mapped shape-only.
    pub max_depth: usize,
    /// View model used when a content type has no dedicated registration.
    pub default_view_model: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            default_view_model: "TopicViewModel".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    pub default_tiers: i32,
    pub allow_page_groups: bool,
    /// Upper bound on concurrently running child builds; `None` leaves fan-out unbounded.
    pub max_concurrency: Option<usize>,
    pub view_model: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            default_tiers: 1,
            allow_page_groups: true,
            max_concurrency: None,
            view_model: "NavigationTopicViewModel".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let mapping_defaults = MappingConfig::default();
        let navigation_defaults = NavigationConfig::default();

        let config = Self {
            mapping: MappingConfig {
                max_depth: env::var("ONTOPIC_MAPPING_MAX_DEPTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(mapping_defaults.max_depth),
                default_view_model: env::var("ONTOPIC_DEFAULT_VIEW_MODEL")
                    .unwrap_or(mapping_defaults.default_view_model),
            },
            navigation: NavigationConfig {
                default_tiers: env::var("ONTOPIC_NAVIGATION_TIERS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(navigation_defaults.default_tiers),
                allow_page_groups: env::var("ONTOPIC_ALLOW_PAGE_GROUPS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(navigation_defaults.allow_page_groups),
                max_concurrency: env::var("ONTOPIC_NAVIGATION_MAX_CONCURRENCY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|limit: &usize| *limit > 0),
                view_model: env::var("ONTOPIC_NAVIGATION_VIEW_MODEL")
                    .unwrap_or(navigation_defaults.view_model),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.mapping.max_depth == 0 {
            return Err(AppError::ConfigurationError(
                "mapping.max_depth must be at least 1".to_string(),
            ));
        }
        if self.mapping.default_view_model.trim().is_empty() {
            return Err(AppError::ConfigurationError(
                "mapping.default_view_model must not be empty".to_string(),
            ));
        }
        if self.navigation.max_concurrency == Some(0) {
            return Err(AppError::ConfigurationError(
                "navigation.max_concurrency must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.navigation.default_tiers, 1);
        assert_eq!(config.mapping.default_view_model, "TopicViewModel");
    }

    #[test]
    fn test_from_file_with_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "navigation": {{ "default_tiers": 3, "allow_page_groups": false, "max_concurrency": 4, "view_model": "NavigationTopicViewModel" }} }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.navigation.default_tiers, 3);
        assert!(!config.navigation.allow_page_groups);
        assert_eq!(config.navigation.max_concurrency, Some(4));
        assert_eq!(config.mapping.max_depth, 16);
    }

    #[test]
    fn test_from_file_rejects_zero_depth() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "mapping": {{ "max_depth": 0, "default_view_model": "TopicViewModel" }} }}"#
        )
        .unwrap();

        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_zero_concurrency_is_a_configuration_error() {
        let mut config = Config::default();
        config.navigation.max_concurrency = Some(0);
        assert!(matches!(config.validate(), Err(AppError::ConfigurationError(_))));
    }
}
