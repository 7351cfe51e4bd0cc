//! Configuration for the outline synchronization engine.
//!
//! Settings arrive from the host's configuration source as a whole
//! [`Settings`] value; the engine applies changed values to its live
//! components when the host reports a configuration change. Settings can
//! also be parsed from TOML for hosts that store them that way.
//!
//! ```rust
//! use otl_core::Settings;
//!
//! let settings = Settings::from_toml_str(
//!     r#"
//!     [outline]
//!     update_debounce_ms = 150
//!
//!     [sync]
//!     max_retries = 5
//!     "#,
//! )?;
//! assert_eq!(settings.outline.update_debounce_ms, 150);
//! assert_eq!(settings.sync.max_retries, 5);
//! # Ok::<(), otl_core::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Settings for the outline view itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    /// Whether the hierarchical outline view is enabled at all.
    pub enabled: bool,
    /// Trailing-edge debounce applied to document-change refreshes, in
    /// milliseconds.
    pub update_debounce_ms: u64,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            update_debounce_ms: 200,
        }
    }
}

/// Configuration for host-outline synchronization and selection debouncing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether best-effort host outline synchronization is enabled.
    pub enabled: bool,
    /// Debounce applied to selection-change delivery, in milliseconds.
    pub debounce_ms: u64,
    /// Maximum attempts for the host refocus action. Must be at least 1.
    pub max_retries: u32,
    /// Base delay between retry attempts, in milliseconds. Doubled per
    /// attempt (exponential backoff).
    pub retry_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 100,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl SyncConfig {
    /// Validates value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries < 1 {
            return Err(Error::Config(
                "sync.max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete engine configuration, constructed once at activation and
/// updated for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Outline view settings.
    pub outline: OutlineSettings,
    /// Host-outline synchronization settings.
    pub sync: SyncConfig,
}

impl Settings {
    /// Parses settings from a TOML document, falling back to defaults for
    /// absent keys, and validates the result.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let settings: Self = toml::from_str(input)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates value ranges across all sections.
    pub fn validate(&self) -> Result<()> {
        self.sync.validate()
    }
}
