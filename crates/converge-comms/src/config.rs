//! Typed protocol configuration and YAML loader.
//!
//! Only behavioral knobs live here: merge radii, staleness thresholds,
//! record lifetimes, queue capacities, and the actual map size. Anything
//! every agent must agree on to parse the channel itself (the codec radix,
//! the slot layout, the tracked-slot count) is a compile-time constant in
//! this crate and deliberately not configurable.

use std::path::Path;

use serde::Deserialize;

use converge_types::location::MAX_MAP_DIMENSION;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A field value violates a protocol bound.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Tunable parameters of the broadcast and reconciliation protocol.
///
/// Defaults match the observed deployment: a 60x60 map ceiling, sightings
/// merged within squared distance 12 and stale after 6 rounds, own tracked
/// records forgotten after 3 rounds without refresh and foreign ones after
/// 8.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Actual map width for this match, at most [`MAX_MAP_DIMENSION`].
    pub map_width: u8,
    /// Actual map height for this match, at most [`MAX_MAP_DIMENSION`].
    pub map_height: u8,
    /// Squared distance within which two sightings merge into one record.
    pub nearby_radius_squared: u32,
    /// Rounds since last update before a sighting record is stale.
    pub stale_after: u32,
    /// Maximum number of simultaneous sighting records.
    pub sighting_capacity: usize,
    /// Rounds an own tracked record survives without refresh.
    pub own_tracked_lifetime: u32,
    /// Rounds a foreign tracked record survives without refresh.
    pub foreign_tracked_lifetime: u32,
    /// Rounds at the start of a match during which tracked positions are
    /// withheld so identity bindings propagate first.
    pub binding_warmup: u32,
    /// Maximum staged facts per outbound class before the oldest is evicted.
    pub queue_capacity: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            map_width: MAX_MAP_DIMENSION,
            map_height: MAX_MAP_DIMENSION,
            nearby_radius_squared: 12,
            stale_after: 6,
            sighting_capacity: 300,
            own_tracked_lifetime: 3,
            foreign_tracked_lifetime: 8,
            binding_warmup: 3,
            queue_capacity: 500,
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value violates a protocol bound.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on malformed YAML or
    /// [`ConfigError::Invalid`] on out-of-bound values.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its protocol bound.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_width == 0 || self.map_height == 0 {
            return Err(ConfigError::Invalid {
                reason: "map dimensions must be at least 1".to_owned(),
            });
        }
        if self.map_width > MAX_MAP_DIMENSION || self.map_height > MAX_MAP_DIMENSION {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "map dimensions {}x{} exceed the {MAX_MAP_DIMENSION} ceiling",
                    self.map_width, self.map_height
                ),
            });
        }
        if self.stale_after == 0 {
            return Err(ConfigError::Invalid {
                reason: "stale_after must be at least 1".to_owned(),
            });
        }
        if self.sighting_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "sighting_capacity must be at least 1".to_owned(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "queue_capacity must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let config = ProtocolConfig::default();
        assert_eq!(config.nearby_radius_squared, 12);
        assert_eq!(config.stale_after, 6);
        assert_eq!(config.own_tracked_lifetime, 3);
        assert_eq!(config.foreign_tracked_lifetime, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_overrides_selected_fields() {
        let yaml = "map_width: 40\nmap_height: 30\nstale_after: 10\n";
        let config = ProtocolConfig::parse(yaml).ok();
        assert!(config.is_some());
        let config = config.unwrap_or_default();
        assert_eq!(config.map_width, 40);
        assert_eq!(config.map_height, 30);
        assert_eq!(config.stale_after, 10);
        // Untouched fields keep their defaults.
        assert_eq!(config.nearby_radius_squared, 12);
    }

    #[test]
    fn oversized_map_rejected() {
        let yaml = "map_width: 61\n";
        assert!(ProtocolConfig::parse(yaml).is_err());
    }

    #[test]
    fn zero_capacities_rejected() {
        assert!(ProtocolConfig::parse("sighting_capacity: 0\n").is_err());
        assert!(ProtocolConfig::parse("queue_capacity: 0\n").is_err());
        assert!(ProtocolConfig::parse("stale_after: 0\n").is_err());
        assert!(ProtocolConfig::parse("map_width: 0\n").is_err());
    }

    #[test]
    fn malformed_yaml_rejected() {
        assert!(ProtocolConfig::parse(": not yaml").is_err());
    }
}
