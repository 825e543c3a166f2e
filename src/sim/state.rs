//! Core roll types
//!
//! Plain values shared by dice, the orchestrator and the engine capabilities.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A face label: 1-based index into a die's face table
pub type FaceValue = u8;

/// World-space position and orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` with no rotation
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Local up axis expressed in world space
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Rotate a local direction into world space (no translation)
    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation * v
    }

    /// Interpolate between two poses (lerp position, slerp rotation)
    pub fn interpolate(&self, other: &Pose, t: f32) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.slerp(other.rotation, t),
        }
    }
}

/// Inclusive range the launch torque components are sampled from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceRange {
    pub min: f32,
    pub max: f32,
}

impl ForceRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Runtime mode of a die, derived from its flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DieMode {
    /// Hidden, no physics, nothing recorded. Between rounds.
    Idle,
    /// Hidden, physics and face detection on, transform being recorded
    Rolling,
    /// Visible, animation-driven playback of the recorded clip
    Replaying,
    /// Any other flag combination (mid-transition)
    Transitional,
}

/// Where the orchestrator is in a round
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RollPhase {
    /// No roll in flight
    Idle,
    /// Hidden dice launched, polling every step until all settle
    AwaitingSettle { elapsed: f32 },
    /// Results captured, replays launched, waiting out the longest one
    AwaitingReplay { remaining: f32 },
}

/// Notable transitions reported by `RollOrchestrator::step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollEvent {
    /// Every active die settled and its face was written into the results
    ResultsCaptured,
    /// The longest replay has elapsed; the round is over
    Completed,
}
