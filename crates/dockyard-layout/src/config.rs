//! Tunable layout constants for the dock engine.
//!
//! [`DockConfig`] groups the weights and header metrics used by migration,
//! moves and the tab-header policy. It can be loaded from TOML or JSON at
//! startup; every field has a default, so partial files are fine.
//!
//! ```toml
//! default_weight = 50.0
//! moved_weight = 100.0
//!
//! [header]
//! item_padding = 11.0
//! tolerance = 10.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockConfig {
    /// Proportional weight given to nodes added by migration or extensions.
    pub default_weight: f64,
    /// Proportional weight given to nodes moved beside a stack sibling.
    pub moved_weight: f64,
    /// Splitter size used when a node carries none.
    pub splitter_size: u16,
    pub header: HeaderConfig,
    pub floating: FloatingConfig,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            default_weight: 50.0,
            moved_weight: 100.0,
            splitter_size: 4,
            header: HeaderConfig::default(),
            floating: FloatingConfig::default(),
        }
    }
}

/// Tab header measurement constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Padding added to every measured tab caption.
    pub item_padding: f64,
    /// Fixed margin added once per header.
    pub margin: f64,
    /// Slack subtracted from the available extent before comparing.
    pub tolerance: f64,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            item_padding: 11.0,
            margin: 4.0,
            tolerance: 10.0,
        }
    }
}

/// Floating surface fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatingConfig {
    /// Width requested when a node was never on screen.
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for FloatingConfig {
    fn default() -> Self {
        Self {
            fallback_width: 200,
            fallback_height: 200,
        }
    }
}

impl DockConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path.as_ref())?)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&read(path.as_ref())?)
    }

    /// Check parameter ranges. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("default_weight", self.default_weight),
            ("moved_weight", self.moved_weight),
        ] {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("{field} must be > 0, got {value}"));
            }
        }

        for (field, value) in [
            ("header.item_padding", self.header.item_padding),
            ("header.margin", self.header.margin),
            ("header.tolerance", self.header.tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{field} must be >= 0, got {value}"));
            }
        }

        if self.floating.fallback_width == 0 || self.floating.fallback_height == 0 {
            errors.push(format!(
                "floating fallback size must be non-empty, got {}x{}",
                self.floating.fallback_width, self.floating.fallback_height
            ));
        }

        errors
    }

    /// Like [`Self::validate`], folded into a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors that can occur when loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[source] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[source] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
