//! Picking parameters.
//!
//! The parameter surface a viewer exposes (mode toggle, threshold, point size,
//! helper display) gathered into one value that is passed to every pick.

use cloudpick_bvh::BuildOptions;
use serde::{Deserialize, Serialize};

use crate::{PickError, Result};

/// Which query answers a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PickMode {
    /// Ordered, pruned hierarchy traversal.
    #[default]
    Accelerated,
    /// Linear scan over every point.
    BruteForce,
}

/// Picking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickSettings {
    /// Show the hierarchy wireframe.
    pub display_helper: bool,
    /// Deepest hierarchy level the wireframe shows (root = 0).
    pub helper_depth: usize,
    /// Rendered point size, world units.
    pub point_size: f64,
    /// Maximum distance from the ray for a point to be picked, world units.
    pub raycast_threshold: f64,
    /// Query used to answer picks.
    pub mode: PickMode,
    /// Hierarchy construction parameters.
    pub build: BuildOptions,
}

impl Default for PickSettings {
    fn default() -> Self {
        Self {
            display_helper: false,
            helper_depth: 10,
            point_size: 0.005,
            raycast_threshold: 0.005,
            mode: PickMode::Accelerated,
            build: BuildOptions::default(),
        }
    }
}

impl PickSettings {
    /// Deepest helper level accepted by [`PickSettings::validate`].
    pub const MAX_HELPER_DEPTH: usize = 64;

    /// Check numeric ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.raycast_threshold.is_finite() || self.raycast_threshold < 0.0 {
            return Err(PickError::InvalidSettings(
                "raycast_threshold must be a finite, non-negative distance".into(),
            ));
        }
        if !self.point_size.is_finite() || self.point_size <= 0.0 {
            return Err(PickError::InvalidSettings(
                "point_size must be positive".into(),
            ));
        }
        if self.helper_depth == 0 || self.helper_depth > Self::MAX_HELPER_DEPTH {
            return Err(PickError::InvalidSettings(format!(
                "helper_depth must be between 1 and {}",
                Self::MAX_HELPER_DEPTH
            )));
        }
        if self.build.max_leaf_size == 0 {
            return Err(PickError::InvalidSettings(
                "build.max_leaf_size must be at least 1".into(),
            ));
        }
        if self.build.bins < 2 {
            return Err(PickError::InvalidSettings(
                "build.bins must be at least 2".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate settings from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: PickSettings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Render the settings as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = PickSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.mode, PickMode::Accelerated);
        assert_eq!(settings.helper_depth, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = PickSettings::from_toml_str(
            r#"
            raycast_threshold = 0.01
            mode = "brute-force"

            [build]
            max_leaf_size = 4
            "#,
        )
        .unwrap();
        assert_eq!(settings.raycast_threshold, 0.01);
        assert_eq!(settings.mode, PickMode::BruteForce);
        assert_eq!(settings.build.max_leaf_size, 4);
        assert_eq!(settings.build.bins, BuildOptions::default().bins);
        assert_eq!(settings.point_size, 0.005);
    }

    #[test]
    fn test_toml_output_parses_back() {
        let mut settings = PickSettings::default();
        settings.display_helper = true;
        let text = settings.to_toml_string().unwrap();
        assert_eq!(PickSettings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let settings = PickSettings {
            raycast_threshold: -0.1,
            ..PickSettings::default()
        };
        assert!(matches!(settings.validate(), Err(PickError::InvalidSettings(_))));
    }

    #[test]
    fn test_zero_helper_depth_rejected() {
        assert!(matches!(
            PickSettings::from_toml_str("helper_depth = 0"),
            Err(PickError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        assert!(matches!(
            PickSettings::from_toml_str("mode = \"sometimes\""),
            Err(PickError::Config(_))
        ));
    }
}
