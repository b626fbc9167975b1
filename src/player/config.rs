use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selects how steering input is interpreted. `Stick` is camera-relative
/// movement on two axes; `Wheels` is differential drive, one axis per wheel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum ControlScheme {
    #[default]
    Stick,
    Wheels(WheelLayout),
}

/// Wheel attach points in chassis space (forward is -Z).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WheelLayout {
    pub left_offset: Vec3,
    pub right_offset: Vec3,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    pub max_stable_speed: f32,
    pub stable_move_sharpness: f32,
    pub orientation_sharpness: f32,
    /// Yaw rate per unit of wheel-axis difference, wheel scheme only.
    pub turn_speed_degrees: f32,
    pub gravity: Vec3,
    pub ground_probe_distance: f32,
    pub max_slope_degrees: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Speed the chassis must exceed before a hold gesture starts a drift.
    pub speed_threshold: f32,
    /// Multiplier on the velocity blend sharpness while drifting; below 1 so
    /// lateral momentum survives longer.
    pub friction_factor: f32,
    /// Multiplier on turn rate while drifting.
    pub turn_multiplier: f32,
    /// Seconds the entry gesture may lapse before the drift ends.
    pub release_grace: f32,
    /// Drift ends immediately once speed falls below
    /// `speed_threshold * exit_speed_fraction`.
    pub exit_speed_fraction: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CentrifugalConfig {
    /// Anchor distance from the chassis per unit of current speed.
    pub anchor_distance_per_speed: f32,
    /// Scale applied to the chassis-to-anchor offset to get the force.
    pub force_scale: f32,
}

/// Everything the movement core needs, supplied at construction time.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ControllerConfig {
    pub scheme: ControlScheme,
    pub motion: MotionConfig,
    pub drift: DriftConfig,
    pub centrifugal: CentrifugalConfig,
}

#[derive(Resource, Clone, Debug)]
pub struct TelemetryConfig {
    pub log_interval_secs: f32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },
    #[error("`{name}` must be greater than zero, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("`{name}` must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("wheel offsets must be distinct points on the chassis, got left {left} / right {right}")]
    DegenerateWheelOffsets { left: Vec3, right: Vec3 },
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_stable_speed", self.motion.max_stable_speed),
            ("stable_move_sharpness", self.motion.stable_move_sharpness),
            ("turn_speed_degrees", self.motion.turn_speed_degrees),
            ("ground_probe_distance", self.motion.ground_probe_distance),
            ("drift.speed_threshold", self.drift.speed_threshold),
            (
                "centrifugal.anchor_distance_per_speed",
                self.centrifugal.anchor_distance_per_speed,
            ),
            ("centrifugal.force_scale", self.centrifugal.force_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }

        if !self.motion.orientation_sharpness.is_finite() || self.motion.orientation_sharpness < 0.0
        {
            return Err(ConfigError::OutOfRange {
                name: "orientation_sharpness",
                value: self.motion.orientation_sharpness,
                min: 0.0,
                max: f32::INFINITY,
            });
        }
        if !self.motion.gravity.is_finite() {
            return Err(ConfigError::NonFinite {
                name: "gravity",
                value: self.motion.gravity.length(),
            });
        }
        if !(0.0..90.0).contains(&self.motion.max_slope_degrees)
            || self.motion.max_slope_degrees == 0.0
        {
            return Err(ConfigError::OutOfRange {
                name: "max_slope_degrees",
                value: self.motion.max_slope_degrees,
                min: 0.0,
                max: 90.0,
            });
        }

        if !(0.0..=1.0).contains(&self.drift.friction_factor) || self.drift.friction_factor == 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "drift.friction_factor",
                value: self.drift.friction_factor,
                min: 0.0,
                max: 1.0,
            });
        }
        if !self.drift.turn_multiplier.is_finite() || self.drift.turn_multiplier < 1.0 {
            return Err(ConfigError::OutOfRange {
                name: "drift.turn_multiplier",
                value: self.drift.turn_multiplier,
                min: 1.0,
                max: f32::INFINITY,
            });
        }
        if !self.drift.release_grace.is_finite() || self.drift.release_grace < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "drift.release_grace",
                value: self.drift.release_grace,
                min: 0.0,
                max: f32::INFINITY,
            });
        }
        if !(0.0..=1.0).contains(&self.drift.exit_speed_fraction)
            || self.drift.exit_speed_fraction == 0.0
        {
            return Err(ConfigError::OutOfRange {
                name: "drift.exit_speed_fraction",
                value: self.drift.exit_speed_fraction,
                min: 0.0,
                max: 1.0,
            });
        }

        if let ControlScheme::Wheels(layout) = &self.scheme {
            if !layout.left_offset.is_finite() || !layout.right_offset.is_finite() {
                return Err(ConfigError::DegenerateWheelOffsets {
                    left: layout.left_offset,
                    right: layout.right_offset,
                });
            }
            if (layout.left_offset - layout.right_offset).length_squared() < 1e-6 {
                return Err(ConfigError::DegenerateWheelOffsets {
                    left: layout.left_offset,
                    right: layout.right_offset,
                });
            }
        }

        Ok(())
    }
}

//
// Implementations
//

impl Default for WheelLayout {
    fn default() -> Self {
        Self {
            left_offset: Vec3::new(-0.55, 0.0, 0.0),
            right_offset: Vec3::new(0.55, 0.0, 0.0),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_stable_speed: 10.0,
            stable_move_sharpness: 15.0,
            orientation_sharpness: 10.0,
            turn_speed_degrees: 120.0,
            gravity: Vec3::new(0.0, -30.0, 0.0),
            ground_probe_distance: 0.2,
            max_slope_degrees: 50.0,
        }
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            speed_threshold: 6.0,
            friction_factor: 0.35,
            turn_multiplier: 1.6,
            release_grace: 0.25,
            exit_speed_fraction: 0.8,
        }
    }
}

impl Default for CentrifugalConfig {
    fn default() -> Self {
        Self {
            anchor_distance_per_speed: 2.0,
            force_scale: 0.5,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_interval_secs: 2.0,
        }
    }
}
