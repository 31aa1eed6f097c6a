//! Runtime Configuration
//!
//! [`RuntimeConfig`] gathers every tunable of the animation pipeline that is
//! not stored in the model's own assets. It is plain data: build it in code
//! with struct-update syntax or decode it from JSON, then hand it to
//! [`Framework::new`](crate::runtime::Framework::new).
//!
//! # Example
//!
//! ```rust,ignore
//! use cubism::runtime::{DragConfig, RuntimeConfig};
//!
//! let config = RuntimeConfig {
//!     random_seed: 7,
//!     drag: DragConfig { angle_scale: 20.0, ..Default::default() },
//!     ..Default::default()
//! };
//! ```

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::physics::PhysicsOptions;

/// Automatic blink timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeBlinkConfig {
    /// Mean seconds between blinks.
    pub interval_seconds: f32,
    pub closing_seconds: f32,
    pub closed_seconds: f32,
    pub opening_seconds: f32,
    /// `true`: parameter value 0 means a closed eye.
    pub close_if_zero: bool,
}

impl Default for EyeBlinkConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 4.0,
            closing_seconds: 0.1,
            closed_seconds: 0.05,
            opening_seconds: 0.15,
            close_if_zero: true,
        }
    }
}

/// How far the drag target turns the head and body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Degrees added to AngleX/Y (and AngleZ via the product) at full drag.
    pub angle_scale: f32,
    /// Degrees added to BodyAngleX at full drag.
    pub body_angle_scale: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            angle_scale: 30.0,
            body_angle_scale: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    // === Logging ===
    /// Maximum level passed to [`log::set_max_level`] when the framework is
    /// created.
    pub log_level: LevelFilter,

    // === Determinism ===
    /// Seed for blink intervals and random idle-motion choice.
    pub random_seed: u64,

    // === Secondary Animators ===
    pub eye_blink: EyeBlinkConfig,
    /// Multiplier of the RMS value added to lip-sync parameters.
    pub lip_sync_weight: f32,
    pub drag: DragConfig,
    pub use_breath: bool,

    // === Physics ===
    pub physics: PhysicsOptions,

    // === Motions ===
    /// Motion group a random entry is started from whenever the queue is idle.
    pub idle_motion_group: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::Info,
            random_seed: 0,
            eye_blink: EyeBlinkConfig::default(),
            lip_sync_weight: 0.8,
            drag: DragConfig::default(),
            use_breath: true,
            physics: PhysicsOptions::default(),
            idle_motion_group: "Idle".to_owned(),
        }
    }
}

impl RuntimeConfig {
    /// Decodes a config; absent keys keep their defaults.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.lip_sync_weight, 0.8);
        assert_eq!(config.drag.angle_scale, 30.0);
        assert_eq!(config.eye_blink.interval_seconds, 4.0);
        assert_eq!(config.idle_motion_group, "Idle");
        assert!(config.use_breath);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = br#"{
            "log_level": "debug",
            "random_seed": 42,
            "eye_blink": { "interval_seconds": 2.5 },
            "physics": { "wind": [0.5, 0.0] }
        }"#;
        let config = RuntimeConfig::from_json_slice(json).unwrap();
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.eye_blink.interval_seconds, 2.5);
        assert_eq!(config.eye_blink.closing_seconds, 0.1);
        assert_eq!(config.physics.wind.x, 0.5);
        assert_eq!(config.physics.gravity.y, -1.0);
        assert_eq!(config.lip_sync_weight, 0.8);
    }
}
