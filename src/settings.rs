//! Roller settings
//!
//! Construction-time configuration, loadable from JSON.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{FaceTable, ForceRange, Pose};

/// Per-die settings shared by every die in the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DieSettings {
    /// Distance from center to face; also the ground probe length
    pub half_extent: f32,
    /// Replay speed multiplier
    pub animation_speed: f32,
    /// Object-space face normals, label n at index n - 1
    pub faces: FaceTable,
}

impl Default for DieSettings {
    fn default() -> Self {
        Self {
            half_extent: DIE_HALF_EXTENT,
            animation_speed: 1.0,
            faces: FaceTable::cube(),
        }
    }
}

/// Roller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollSettings {
    /// Pool size; also the number of decorative dice
    pub capacity: usize,
    /// Range each launch torque component is sampled from
    pub force_range: ForceRange,
    /// Upward launch force along the die's local up axis
    pub up_force: f32,
    /// Where dice are launched from
    pub launch_pose: Pose,
    pub die: DieSettings,
    /// Display asset keys; face label n maps to entry n - 1
    pub face_assets: Vec<String>,
    /// Give up waiting for dice to settle after this long (None = wait forever)
    pub settle_timeout_secs: Option<f32>,
    /// RNG seed for launch torques (None = seed from the OS)
    pub seed: Option<u64>,
}

impl Default for RollSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            force_range: ForceRange::new(DEFAULT_FORCE_MIN, DEFAULT_FORCE_MAX),
            up_force: DEFAULT_UP_FORCE,
            launch_pose: Pose::at(Vec3::new(0.0, DEFAULT_LAUNCH_HEIGHT, 0.0)),
            die: DieSettings::default(),
            face_assets: (1..=6).map(|n| format!("dice_face_{n}")).collect(),
            settle_timeout_secs: None,
            seed: None,
        }
    }
}

impl RollSettings {
    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded roll settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Check numeric invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.force_range.is_valid() {
            return Err(ConfigError::InvalidForceRange {
                min: self.force_range.min,
                max: self.force_range.max,
            });
        }
        let speed = self.die.animation_speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::InvalidAnimationSpeed(speed));
        }
        let extent = self.die.half_extent;
        if !extent.is_finite() || extent <= 0.0 {
            return Err(ConfigError::InvalidHalfExtent(extent));
        }
        if let Some(timeout) = self
            .settle_timeout_secs
            .filter(|t| !t.is_finite() || *t <= 0.0)
        {
            return Err(ConfigError::InvalidSettleTimeout(timeout));
        }
        if self.die.faces.is_empty() {
            return Err(ConfigError::EmptyFaceTable);
        }
        if self.die.faces.len() > FaceTable::MAX_FACES {
            return Err(ConfigError::TooManyFaces(self.die.faces.len()));
        }
        Ok(())
    }

    /// Settings with a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}
