use crate::{LayerMask, SettingsError};
use laser_core::nalgebra::Vector2;
use laser_detect::{DetectionArea, DetectorSettings, Strategy};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// How a marker ray is cast into the environment.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RaycastSettings {
    /// Layers of the environment the ray may hit.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_layer_mask"))]
    pub layer_mask: LayerMask,
    /// The furthest a hit may be. `None` is unbounded.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub max_distance: Option<f64>,
    /// How far along the ray the anchor is placed when nothing is hit.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_fallback_distance")
    )]
    pub fallback_distance: f64,
}

impl RaycastSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.fallback_distance.is_finite() && self.fallback_distance > 0.0) {
            return Err(SettingsError::FallbackDistance(self.fallback_distance));
        }
        match self.max_distance {
            Some(max) if max.is_nan() || max <= 0.0 => Err(SettingsError::MaxDistance(max)),
            _ => Ok(()),
        }
    }
}

impl Default for RaycastSettings {
    fn default() -> Self {
        Self {
            layer_mask: default_layer_mask(),
            max_distance: None,
            fallback_distance: default_fallback_distance(),
        }
    }
}

/// The settings for the laser pointer tracker.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrackerSettings {
    /// The centered fraction of the frame that is searched
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_detection_area")
    )]
    pub detection_area: DetectionArea,
    /// The scorer used to pick the marker among candidate pixels
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub strategy: Strategy,
    /// Added to the unit-depth unprojection when intrinsics are available, in meters at one meter
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_unprojection_offset")
    )]
    pub unprojection_offset: Vector2<f64>,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub raycast: RaycastSettings,
}

impl TrackerSettings {
    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings {
            area: self.detection_area,
            strategy: self.strategy,
        }
    }

    /// Checks all settings are usable.
    ///
    /// ```
    /// use laser_anchor::{SettingsError, TrackerSettings};
    /// let mut settings = TrackerSettings::default();
    /// assert!(settings.validate().is_ok());
    /// settings.raycast.fallback_distance = 0.0;
    /// assert_eq!(settings.validate(), Err(SettingsError::FallbackDistance(0.0)));
    /// ```
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.detection_area.is_valid() {
            return Err(SettingsError::DetectionArea {
                width: self.detection_area.width,
                height: self.detection_area.height,
            });
        }
        if !self.unprojection_offset.iter().all(|v| v.is_finite()) {
            return Err(SettingsError::NonFiniteOffset);
        }
        self.raycast.validate()
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            detection_area: default_detection_area(),
            strategy: Strategy::default(),
            unprojection_offset: default_unprojection_offset(),
            raycast: RaycastSettings::default(),
        }
    }
}

fn default_detection_area() -> DetectionArea {
    DetectionArea::new(0.5, 0.5)
}

fn default_unprojection_offset() -> Vector2<f64> {
    Vector2::new(0.0, -0.05)
}

fn default_layer_mask() -> LayerMask {
    LayerMask::SPATIAL_AWARENESS
}

fn default_fallback_distance() -> f64 {
    5.0
}
