//! Configuration types for the error pipeline.
//!
//! Everything here is plain data, loadable from TOML:
//!
//! ```toml
//! debug_mode = false
//!
//! [[kinds]]
//! name = "PaymentDeclined"
//! parent = "InvalidArgument"
//!
//! [[status_overrides]]
//! kind = "PaymentDeclined"
//! status = 402
//!
//! [field_errors]
//! param_marker = "Parameter name:"
//! enrich_from_causes = true
//!
//! [response]
//! type_suffix = "Response"
//!
//! [fallback]
//! global = "<h1>Something went wrong</h1>"
//!
//! [fallback.per_status]
//! 404 = "<h1>Not here</h1>"
//! ```
//!
//! Handler chains, runner hooks, response types and codecs are code, not
//! data, and are registered on [`crate::ErrorPipelineBuilder`].

use std::collections::BTreeMap;
use std::path::Path;

use failwire_model::FailureCategory;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::Result;

/// Configuration for the error pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Include origination traces in response bodies.
    pub debug_mode: bool,

    /// Extra failure kinds, registered in order.
    pub kinds: Vec<KindConfig>,

    /// Kind to status mappings, registered in order.
    pub status_overrides: Vec<StatusOverride>,

    /// Field-error composition settings.
    pub field_errors: FieldErrorConfig,

    /// Response shape settings.
    pub response: ResponseConfig,

    /// Fallback pages for clients that prefer HTML.
    pub fallback: FallbackConfig,
}

/// A custom failure kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindConfig {
    /// Kind name.
    pub name: String,

    /// Parent kind; the root when absent.
    #[serde(default)]
    pub parent: Option<String>,

    /// Category overriding the one inherited from the parent.
    #[serde(default)]
    pub category: Option<FailureCategory>,
}

/// A kind to status mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOverride {
    /// Kind name.
    pub kind: String,

    /// Numeric status code.
    pub status: u16,
}

/// Field-error composition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldErrorConfig {
    /// Marker separating a message from its parameter-name annotation.
    pub param_marker: String,

    /// Append field errors reported by nested causes.
    pub enrich_from_causes: bool,
}

impl Default for FieldErrorConfig {
    fn default() -> Self {
        Self {
            param_marker: "Parameter name:".to_string(),
            enrich_from_causes: false,
        }
    }
}

/// Response shape settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Appended to a request type name to find its response type.
    pub type_suffix: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            type_suffix: "Response".to_string(),
        }
    }
}

/// Fallback page settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Page used for any status without a specific page.
    pub global: Option<String>,

    /// Pages keyed by numeric status code.
    pub per_status: BTreeMap<String, String>,
}

impl FallbackConfig {
    /// Per-status pages with parsed status codes.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a valid status code.
    pub fn status_pages(&self) -> Result<Vec<(StatusCode, &str)>> {
        self.per_status
            .iter()
            .map(|(key, page)| {
                let status = key
                    .parse::<u16>()
                    .ok()
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .ok_or_else(|| {
                        PipelineError::Config(format!("fallback page key '{}' is not a status code", key))
                    })?;
                Ok((status, page.as_str()))
            })
            .collect()
    }
}

impl PipelineConfig {
    /// Loads configuration from a TOML file and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is internally consistent.
    ///
    /// Kind ancestry is checked when the kinds are registered, not here.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid status codes or empty markers.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.status_overrides {
            if StatusCode::from_u16(entry.status).is_err() {
                return Err(PipelineError::Config(format!(
                    "status override for '{}' has invalid status {}",
                    entry.kind, entry.status
                )));
            }
        }

        if self.field_errors.param_marker.is_empty() {
            return Err(PipelineError::Config(
                "field_errors.param_marker must not be empty".to_string(),
            ));
        }

        if self.response.type_suffix.is_empty() {
            return Err(PipelineError::Config(
                "response.type_suffix must not be empty".to_string(),
            ));
        }

        self.fallback.status_pages()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(!config.debug_mode);
        assert_eq!(config.field_errors.param_marker, "Parameter name:");
        assert_eq!(config.response.type_suffix, "Response");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.response.type_suffix, config.response.type_suffix);
    }

    #[test]
    fn test_from_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            debug_mode = true

            [[kinds]]
            name = "PaymentDeclined"
            parent = "InvalidArgument"

            [[status_overrides]]
            kind = "PaymentDeclined"
            status = 402

            [fallback.per_status]
            404 = "<h1>Not here</h1>"
            "#,
        )
        .unwrap();

        assert!(config.debug_mode);
        assert_eq!(config.kinds[0].parent.as_deref(), Some("InvalidArgument"));
        assert_eq!(config.status_overrides[0].status, 402);
        let pages = config.fallback.status_pages().unwrap();
        assert_eq!(pages, vec![(StatusCode::NOT_FOUND, "<h1>Not here</h1>")]);
    }

    #[test]
    fn test_category_in_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [[kinds]]
            name = "TenantSuspended"
            category = "access_denied"
            "#,
        )
        .unwrap();
        assert_eq!(config.kinds[0].category, Some(FailureCategory::AccessDenied));
    }

    #[test]
    fn test_invalid_override_status() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [[status_overrides]]
            kind = "Failure"
            status = 42
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_invalid_page_key() {
        let mut config = PipelineConfig::default();
        config
            .fallback
            .per_status
            .insert("teapot".to_string(), "<p>?</p>".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_marker_rejected() {
        let mut config = PipelineConfig::default();
        config.field_errors.param_marker.clear();
        assert!(config.validate().is_err());
    }
}
