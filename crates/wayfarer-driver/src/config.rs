// Driver configuration
//
// Bounds and tool offers for simulated conversations, plus the generation
// parameters forwarded to the chat model.

use serde::{Deserialize, Serialize};
use wayfarer_abstraction::ModelParameters;

use crate::error::{DriverError, Result};
use crate::tools::ToolPolicy;

/// What happens when a conversation reaches `max_path_length`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathLimitPolicy {
    /// Record an `error` marker. One path slot is reserved for it.
    #[default]
    Error,
    /// Stop without a marker.
    Stop,
}

/// Conversation driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Model calls allowed per node before the conversation fails
    pub max_attempts: u32,
    /// Upper bound on path entries, terminal marker included
    pub max_path_length: usize,
    /// Offer the `exit` tool
    pub allow_exit: bool,
    /// Offer the `summon` tool
    pub allow_summon: bool,
    /// End naturally at nodes without outgoing edges instead of asking the model
    pub stop_at_leaf: bool,
    /// Behavior at the path ceiling
    pub path_limit: PathLimitPolicy,
    /// Company named in the system prompt
    pub company: String,
    /// Generation parameters for every model call
    pub parameters: ModelParameters,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            max_path_length: 10,
            allow_exit: true,
            allow_summon: true,
            stop_at_leaf: true,
            path_limit: PathLimitPolicy::Error,
            company: "채널톡".to_string(),
            parameters: ModelParameters::default(),
        }
    }
}

impl DriverConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-node attempt budget
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the path ceiling
    #[must_use]
    pub fn with_max_path_length(mut self, max_path_length: usize) -> Self {
        self.max_path_length = max_path_length;
        self
    }

    /// Set the path ceiling policy
    #[must_use]
    pub fn with_path_limit(mut self, policy: PathLimitPolicy) -> Self {
        self.path_limit = policy;
        self
    }

    /// Suppress or allow the terminal tools
    #[must_use]
    pub fn with_terminal_tools(mut self, allow_exit: bool, allow_summon: bool) -> Self {
        self.allow_exit = allow_exit;
        self.allow_summon = allow_summon;
        self
    }

    /// Decide whether leaves end the conversation without a model call
    #[must_use]
    pub fn with_stop_at_leaf(mut self, stop_at_leaf: bool) -> Self {
        self.stop_at_leaf = stop_at_leaf;
        self
    }

    /// Tools offered alongside `move_to_node`
    pub fn tool_policy(&self) -> ToolPolicy {
        ToolPolicy { allow_exit: self.allow_exit, allow_summon: self.allow_summon }
    }

    /// Path slots kept free for a terminal marker at the ceiling
    pub(crate) fn reserved_slots(&self) -> usize {
        match self.path_limit {
            PathLimitPolicy::Error => 1,
            PathLimitPolicy::Stop => 0,
        }
    }

    /// Check the bounds are usable
    ///
    /// # Errors
    /// Returns `DriverError::InvalidConfig` if a bound leaves no room for a decision.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(DriverError::InvalidConfig("max_attempts must be at least 1".to_string()));
        }
        if self.max_path_length < 2 {
            return Err(DriverError::InvalidConfig(
                "max_path_length must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML, reading the `[driver]` table when present
    ///
    /// # Errors
    /// Returns `DriverError::InvalidConfig` if the TOML cannot be parsed.
    pub fn from_toml_str(toml_content: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(toml_content)
            .map_err(|e| DriverError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?;

        let section = value.get("driver").cloned().unwrap_or(value);
        let config: Self = section.try_into().map_err(|e: toml::de::Error| {
            DriverError::InvalidConfig(format!("Failed to deserialize driver config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.max_path_length, 10);
        assert!(config.allow_exit && config.allow_summon && config.stop_at_leaf);
        assert_eq!(config.path_limit, PathLimitPolicy::Error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = DriverConfig::new().with_max_attempts(0);
        assert!(matches!(config.validate(), Err(DriverError::InvalidConfig(_))));
        let config = DriverConfig::new().with_max_path_length(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_driver_section() {
        let config = DriverConfig::from_toml_str(
            r#"
            [driver]
            max_attempts = 2
            path_limit = "stop"
            allow_summon = false
            company = "Acme"

            [driver.parameters]
            temperature = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.max_path_length, 10);
        assert_eq!(config.path_limit, PathLimitPolicy::Stop);
        assert!(!config.allow_summon);
        assert_eq!(config.company, "Acme");
        assert_eq!(config.parameters.temperature, Some(0.0));
    }

    #[test]
    fn test_from_toml_rejects_invalid_bounds() {
        assert!(DriverConfig::from_toml_str("max_path_length = 1").is_err());
        assert!(DriverConfig::from_toml_str("max_attempts = \"four\"").is_err());
    }

    #[test]
    fn test_reserved_slots() {
        assert_eq!(DriverConfig::default().reserved_slots(), 1);
        assert_eq!(
            DriverConfig::default().with_path_limit(PathLimitPolicy::Stop).reserved_slots(),
            0
        );
    }
}
