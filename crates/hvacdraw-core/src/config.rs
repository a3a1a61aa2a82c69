//! Tunable engine constants.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Default maximum number of layers in a drawing.
pub const DEFAULT_MAX_LAYERS: usize = 32;

/// Minimum width/height of a hit-test frame.
pub const DEFAULT_MIN_HIT_SPOT: f64 = 5.0;

/// Engine configuration.
///
/// Every field has a default, so a partial JSON object is enough:
///
/// ```
/// use hvacdraw_core::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "max_layers": 4 }"#).unwrap();
/// assert_eq!(config.max_layers, 4);
/// assert_eq!(config.min_hit_spot, 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Layer stack capacity.
    pub max_layers: usize,
    /// Hit frames narrower or shorter than this are inflated around their centre.
    pub min_hit_spot: f64,
    /// Squared distance beyond which a line refuses a shape's centre hook.
    pub hook_distance_limit: f64,
    /// Stroke slop for line and connector hits.
    pub line_hit_tolerance: f64,
    /// Capture radius around polyline endpoints.
    pub endpoint_radius: f64,
    /// Distance from a shape edge that still counts as a border hit.
    pub border_width: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_layers: DEFAULT_MAX_LAYERS,
            min_hit_spot: DEFAULT_MIN_HIT_SPOT,
            hook_distance_limit: 200.0,
            line_hit_tolerance: 4.0,
            endpoint_radius: 6.0,
            border_width: 3.0,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_layers == 0 {
            return Err(EngineError::InvalidConfig(
                "max_layers must be at least 1".to_string(),
            ));
        }
        let positive = [
            ("min_hit_spot", self.min_hit_spot),
            ("line_hit_tolerance", self.line_hit_tolerance),
            ("endpoint_radius", self.endpoint_radius),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.hook_distance_limit < 0.0 || self.border_width < 0.0 {
            return Err(EngineError::InvalidConfig(
                "distances must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_layers, 32);
        assert_eq!(config.min_hit_spot, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"endpoint_radius": 10.0}"#).unwrap();
        assert_eq!(config.endpoint_radius, 10.0);
        assert_eq!(config.max_layers, DEFAULT_MAX_LAYERS);
    }

    #[test]
    fn test_malformed_json() {
        let err = EngineConfig::from_json("{ max_layers: ").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_layers() {
        let err = EngineConfig::from_json(r#"{"max_layers": 0}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_non_positive_hit_spot() {
        let err = EngineConfig::from_json(r#"{"min_hit_spot": 0.0}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
