//! Registry configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Registry set configuration
///
/// Parsed from TOML supplied by the caller; missing fields take defaults.
///
/// ```
/// use waymark_core::RegistryConfig;
///
/// let config = RegistryConfig::from_toml_str("eager_cycle_check = true").unwrap();
/// assert!(config.eager_cycle_check);
/// assert_eq!(config.test_id_separator, "-TEST-");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Text between expectation id and counter in generated test ids
    pub test_id_separator: String,
    /// Zero-padded width of the test id counter
    pub test_id_width: usize,
    /// Reject logic units that close a dependency cycle at registration
    pub eager_cycle_check: bool,
    /// Treat step ordering warnings as failures in `ensure_well_formed`
    pub strict_step_order: bool,
    /// Diagnostics kept before the oldest are dropped
    pub max_diagnostics: usize,
}

impl RegistryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text and validate
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::InvalidValue`] when [`validate`](Self::validate) fails.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// With test id separator
    #[inline]
    #[must_use]
    pub fn with_test_id_separator(mut self, separator: impl Into<String>) -> Self {
        self.test_id_separator = separator.into();
        self
    }

    /// With test id counter width
    #[inline]
    #[must_use]
    pub fn with_test_id_width(mut self, width: usize) -> Self {
        self.test_id_width = width;
        self
    }

    /// With eager cycle check
    #[inline]
    #[must_use]
    pub fn with_eager_cycle_check(mut self, enabled: bool) -> Self {
        self.eager_cycle_check = enabled;
        self
    }

    /// With strict step ordering
    #[inline]
    #[must_use]
    pub fn with_strict_step_order(mut self, enabled: bool) -> Self {
        self.strict_step_order = enabled;
        self
    }

    /// With diagnostics capacity
    #[inline]
    #[must_use]
    pub fn with_max_diagnostics(mut self, max: usize) -> Self {
        self.max_diagnostics = max;
        self
    }

    /// Check field values
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for a zero test id width, an
    /// empty separator or a zero diagnostics capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.test_id_width == 0 {
            return Err(ConfigError::InvalidValue {
                field: "test_id_width",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.test_id_separator.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "test_id_separator",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_diagnostics == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_diagnostics",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Format a generated test id
    #[must_use]
    pub fn test_id(&self, expectation: &str, counter: u32) -> String {
        format!(
            "{expectation}{}{counter:0width$}",
            self.test_id_separator,
            width = self.test_id_width
        )
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            test_id_separator: "-TEST-".to_string(),
            test_id_width: 3,
            eager_cycle_check: false,
            strict_step_order: false,
            max_diagnostics: 1024,
        }
    }
}
