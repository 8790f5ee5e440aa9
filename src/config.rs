//! Configuration management for the validator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (validator.toml)
//! - Environment variables (VALIDATOR__*)
//!
//! ## Example config file (validator.toml):
//! ```toml
//! [validation]
//! validate_format = true
//! additional_properties = false
//! additional_items = true
//! omit_properties = ["_links", "_meta"]
//! omit_refs = false
//! max_depth = 128
//!
//! [formats]
//! zip = '^\d{5}$'
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::format::FormatRegistry;
use crate::options::{ValidationOptions, DEFAULT_MAX_DEPTH};

/// Main configuration for the validator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Extra regex formats, added on top of the standard ones
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
}

/// Validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Check `format` constraints
    #[serde(default)]
    pub validate_format: bool,

    /// Allow object keys not covered by the schema
    #[serde(default = "default_true")]
    pub additional_properties: bool,

    /// Allow tuple elements past the declared items
    #[serde(default = "default_true")]
    pub additional_items: bool,

    /// Property names skipped during validation
    #[serde(default)]
    pub omit_properties: Vec<String>,

    /// Treat every `$ref` as valid
    #[serde(default)]
    pub omit_refs: bool,

    /// Value nesting limit for one validation
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_format: false,
            additional_properties: true,
            additional_items: true,
            omit_properties: Vec::new(),
            omit_refs: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["validator.toml", ".validator.toml", "config/validator.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "validator") {
            let xdg_config = config_dir.config_dir().join("validator.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Load from environment variables (VALIDATOR__*)
        builder = builder.add_source(
            Environment::with_prefix("VALIDATOR")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("validation.omit_properties")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        tracing::debug!(
            validate_format = config.validation.validate_format,
            extra_formats = config.formats.len(),
            "loaded validator configuration"
        );
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Build validation options from this configuration
    pub fn to_options(&self) -> Result<ValidationOptions> {
        let v = &self.validation;
        let mut options = ValidationOptions::new()
            .with_validate_format(v.validate_format)
            .with_additional_properties(v.additional_properties)
            .with_additional_items(v.additional_items)
            .with_omit_refs(v.omit_refs)
            .with_max_depth(v.max_depth);

        if !v.omit_properties.is_empty() {
            options = options.with_omit_properties(v.omit_properties.iter().cloned());
        }

        if !self.formats.is_empty() {
            let mut registry = FormatRegistry::standard();
            for (name, pattern) in &self.formats {
                registry = registry.with_pattern(name.clone(), pattern)?;
            }
            options = options.with_formats(registry);
        }

        Ok(options)
    }
}
