//! Catalog configuration via `catalog.toml`
//!
//! On first open of a config directory a commented default `catalog.toml` is
//! written. To change settings, edit the file and rebuild the [`Catalog`].
//!
//! [`Catalog`]: crate::Catalog

use crate::store::QueryLimits;
use catalog_core::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Config file name placed in the config directory.
pub const CONFIG_FILE_NAME: &str = "catalog.toml";

/// Logging settings, persisted under `[logging]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (e.g. `"info"` or `"catalog::live=debug"`)
    #[serde(default = "default_level")]
    pub level: String,
    /// Colored output
    #[serde(default)]
    pub ansi: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            ansi: false,
        }
    }
}

/// Catalog configuration loaded from `catalog.toml`.
///
/// # Example
///
/// ```toml
/// nested_fields = ["payload", "changes"]
/// max_disjunction_values = 10
/// # default_limit = 100
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// Nested-resolvable fields used when a descriptor declares none.
    #[serde(default = "default_nested_fields")]
    pub nested_fields: Vec<String>,
    /// Maximum candidates for `in`, `not-in` and `array-contains-any`.
    #[serde(default = "default_max_disjunction_values")]
    pub max_disjunction_values: usize,
    /// Limit applied to collection queries that set none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<usize>,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_nested_fields() -> Vec<String> {
    vec!["payload".to_string(), "changes".to_string()]
}

fn default_max_disjunction_values() -> usize {
    10
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            nested_fields: default_nested_fields(),
            max_disjunction_values: default_max_disjunction_values(),
            default_limit: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Translation limits derived from this config
    pub fn query_limits(&self) -> QueryLimits {
        QueryLimits {
            max_disjunction_values: self.max_disjunction_values,
            default_limit: self.default_limit,
        }
    }

    /// Default nested-resolvable field set
    pub fn nested_field_set(&self) -> BTreeSet<String> {
        self.nested_fields.iter().cloned().collect()
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero disjunction cap or a zero default limit.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.max_disjunction_values == 0 {
            return Err(CatalogError::config(
                "max_disjunction_values must be at least 1",
            ));
        }
        if self.default_limit == Some(0) {
            return Err(CatalogError::config("default_limit must be at least 1"));
        }
        if self.nested_fields.iter().any(|f| f.is_empty()) {
            return Err(CatalogError::config("nested_fields must not contain empty names"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Catalog read layer configuration
#
# Fields holding denormalized sub-objects (notification payloads, amendment
# diffs) whose own references are resolved one extra hop. Used when a query
# declares no nested fields of its own.
nested_fields = ["payload", "changes"]

# Maximum number of candidates accepted by "in", "not-in" and
# "array-contains-any" filters.
max_disjunction_values = 10

# Limit applied to collection queries that set none (default: unlimited).
# default_limit = 100

[logging]
# EnvFilter directive, e.g. "info" or "catalog::live=debug,info"
level = "info"
ansi = false
"#
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> CatalogResult<Self> {
        let config: CatalogConfig = toml::from_str(content)
            .map_err(|e| CatalogError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| match e {
            CatalogError::Config(msg) => {
                CatalogError::config(format!("{} ('{}')", msg, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> CatalogResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Load `catalog.toml` from `dir`, writing the default first if missing.
    pub fn load_or_init(dir: &Path) -> CatalogResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        Self::write_default_if_missing(&path)?;
        Self::from_file(&path)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> CatalogResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CatalogError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
