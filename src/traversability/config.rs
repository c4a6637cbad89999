//! Traversability query configuration.
//!
//! Read from YAML the same way map metadata is: a raw serde struct with
//! defaults and field validators, then checked and converted into the
//! public [`TraversabilityConfig`].

use std::path::Path;

use glam::Vec2;
use serde::Deserialize;

use crate::types::{
    DEFAULT_TRAVERSABILITY, LAYER_ELEVATION, LAYER_LOWER_BOUND, LAYER_UPPER_BOUND, Polygon,
    TRAVERSABILITY_LAYERS, TRAVERSABILITY_MAX, TRAVERSABILITY_MIN, TraversabilityError,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_map_frame_id")]
    map_frame_id: String,
    #[serde(
        default = "default_max_gap_width",
        deserialize_with = "deserialize_non_negative"
    )]
    max_gap_width: f32,
    #[serde(
        default = "default_critical_step_height",
        deserialize_with = "deserialize_non_negative"
    )]
    critical_step_height: f32,
    #[serde(default)]
    use_raw_map: bool,
    #[serde(
        default = "default_circular_footprint_offset",
        deserialize_with = "deserialize_non_negative"
    )]
    circular_footprint_offset: f32,
    #[serde(default)]
    footprint: RawFootprint,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFootprint {
    #[serde(default)]
    footprint_polygon: Option<Vec<[f32; 2]>>,
    #[serde(default = "default_traversability_default")]
    traversability_default: f32,
    #[serde(default)]
    verify_roughness_footprint: bool,
    #[serde(default)]
    check_robot_inclination: bool,
}

impl Default for RawFootprint {
    fn default() -> Self {
        Self {
            footprint_polygon: None,
            traversability_default: DEFAULT_TRAVERSABILITY,
            verify_roughness_footprint: false,
            check_robot_inclination: false,
        }
    }
}

fn default_map_frame_id() -> String {
    "map".to_string()
}

fn default_max_gap_width() -> f32 {
    0.3
}

fn default_critical_step_height() -> f32 {
    0.12
}

fn default_circular_footprint_offset() -> f32 {
    0.15
}

fn default_traversability_default() -> f32 {
    DEFAULT_TRAVERSABILITY
}

fn deserialize_non_negative<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f32::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(serde::de::Error::custom(
            "distances and heights must be finite and non-negative",
        ))
    }
}

/// Clamp a traversability value into `[TRAVERSABILITY_MIN, TRAVERSABILITY_MAX]`.
pub fn bound_traversability_value(value: f32) -> f32 {
    if value > TRAVERSABILITY_MAX {
        log::warn!(
            "Traversability value {value} is higher than the max allowed value {TRAVERSABILITY_MAX}, using the max"
        );
        return TRAVERSABILITY_MAX;
    }
    if value < TRAVERSABILITY_MIN {
        log::warn!(
            "Traversability value {value} is lower than the min allowed value {TRAVERSABILITY_MIN}, using the min"
        );
        return TRAVERSABILITY_MIN;
    }
    if value.is_nan() {
        log::warn!("Traversability value is NaN, using the min {TRAVERSABILITY_MIN}");
        return TRAVERSABILITY_MIN;
    }
    value
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraversabilityConfig {
    pub map_frame_id: String,
    /// Widest gap (meters) the robot can drive across.
    pub max_gap_width: f32,
    /// Height difference (meters) the step filter treats as a step.
    pub critical_step_height: f32,
    pub use_raw_map: bool,
    /// Added to the radius of circular path footprints.
    pub circular_footprint_offset: f32,
    /// Robot-frame footprint outline; empty when none (or an invalid one) was configured.
    pub footprint_polygon: Polygon,
    /// Traversability assumed where the map has no data, already clamped.
    pub traversability_default: f32,
    pub check_roughness: bool,
    pub check_robot_inclination: bool,
}

impl Default for TraversabilityConfig {
    fn default() -> Self {
        Self {
            map_frame_id: default_map_frame_id(),
            max_gap_width: default_max_gap_width(),
            critical_step_height: default_critical_step_height(),
            use_raw_map: false,
            circular_footprint_offset: default_circular_footprint_offset(),
            footprint_polygon: Polygon::default(),
            traversability_default: DEFAULT_TRAVERSABILITY,
            check_roughness: false,
            check_robot_inclination: false,
        }
    }
}

impl TraversabilityConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TraversabilityError> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TraversabilityError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    fn from_raw(raw: RawConfig) -> Self {
        let footprint_polygon = match raw.footprint.footprint_polygon {
            Some(points) if points.len() < 3 => {
                log::warn!(
                    "Footprint polygon must consist of at least 3 points, only {} found",
                    points.len()
                );
                Polygon::default()
            }
            Some(points) => Polygon::new(points.into_iter().map(Vec2::from).collect()),
            None => {
                log::warn!("No footprint polygon defined");
                Polygon::default()
            }
        };

        Self {
            map_frame_id: raw.map_frame_id,
            max_gap_width: raw.max_gap_width,
            critical_step_height: raw.critical_step_height,
            use_raw_map: raw.use_raw_map,
            circular_footprint_offset: raw.circular_footprint_offset,
            footprint_polygon,
            traversability_default: bound_traversability_value(
                raw.footprint.traversability_default,
            ),
            check_roughness: raw.footprint.verify_roughness_footprint,
            check_robot_inclination: raw.footprint.check_robot_inclination,
        }
    }

    /// Layers an incoming elevation map must provide.
    pub fn elevation_layers(&self) -> &'static [&'static str] {
        if self.use_raw_map {
            &[
                LAYER_ELEVATION,
                "variance",
                "horizontal_variance_x",
                "horizontal_variance_y",
                "horizontal_variance_xy",
                "time",
            ]
        } else {
            &[LAYER_ELEVATION, LAYER_UPPER_BOUND, LAYER_LOWER_BOUND]
        }
    }

    /// Layers an incoming traversability map must provide.
    pub fn traversability_layers(&self) -> &'static [&'static str] {
        &TRAVERSABILITY_LAYERS
    }

    /// Per-query view with the given default traversability.
    pub fn check_settings(&self, default_traversability: f32) -> CheckSettings {
        CheckSettings {
            max_gap_width: self.max_gap_width,
            critical_step_height: self.critical_step_height,
            check_roughness: self.check_roughness,
            default_traversability,
        }
    }
}

/// Thresholds the eligibility checks and footprint evaluators run with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckSettings {
    pub max_gap_width: f32,
    pub critical_step_height: f32,
    pub check_roughness: bool,
    pub default_traversability: f32,
}

impl Default for CheckSettings {
    fn default() -> Self {
        TraversabilityConfig::default().check_settings(DEFAULT_TRAVERSABILITY)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = TraversabilityConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, TraversabilityConfig::default());
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
map_frame_id: odom
max_gap_width: 0.2
critical_step_height: 0.08
use_raw_map: true
circular_footprint_offset: 0.1
footprint:
  footprint_polygon: [[0.3, 0.2], [-0.3, 0.2], [-0.3, -0.2], [0.3, -0.2]]
  traversability_default: 0.7
  verify_roughness_footprint: true
  check_robot_inclination: true
"#;
        let config = TraversabilityConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.map_frame_id, "odom");
        assert_relative_eq!(config.max_gap_width, 0.2);
        assert_eq!(config.footprint_polygon.len(), 4);
        assert_relative_eq!(config.traversability_default, 0.7);
        assert!(config.check_roughness);
        assert!(config.check_robot_inclination);
        assert_eq!(config.elevation_layers().len(), 6);
    }

    #[test]
    fn short_polygon_is_dropped() {
        let yaml = "footprint:\n  footprint_polygon: [[0.0, 0.0], [1.0, 0.0]]\n";
        let config = TraversabilityConfig::from_yaml_str(yaml).unwrap();
        assert!(config.footprint_polygon.is_empty());
    }

    #[test]
    fn default_traversability_is_clamped() {
        let yaml = "footprint:\n  traversability_default: 1.7\n";
        let config = TraversabilityConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.traversability_default, TRAVERSABILITY_MAX);
        assert_eq!(bound_traversability_value(-0.2), TRAVERSABILITY_MIN);
    }

    #[test]
    fn negative_gap_width_is_rejected() {
        let err = TraversabilityConfig::from_yaml_str("max_gap_width: -0.1").unwrap_err();
        assert!(matches!(err, TraversabilityError::Yaml(_)));
    }
}
