//! Engine capabilities consumed by the roll logic
//!
//! The physics/render engine and the animation recorder are external. The
//! roll logic only sequences calls to them through these traits; handles are
//! injected at construction and never looked up at runtime.

use glam::Vec3;

use super::state::Pose;

/// A rigid body with a renderer attached
pub trait RigidBody {
    /// Current world transform
    fn pose(&self) -> Pose;

    /// Teleport to a pose
    fn set_pose(&mut self, pose: Pose);

    /// Add a force for the next integration step
    fn apply_force(&mut self, force: Vec3);

    /// Add a torque for the next integration step
    fn apply_torque(&mut self, torque: Vec3);

    fn linear_velocity(&self) -> Vec3;

    /// Kinematic bodies are not integrated by the engine
    fn set_kinematic(&mut self, kinematic: bool);

    fn set_gravity(&mut self, enabled: bool);

    /// Show or hide the renderer
    fn set_visible(&mut self, visible: bool);

    /// Short ray test: does anything other than this body lie within
    /// `max_distance` of `origin` along `direction`?
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool;
}

/// Transform recorder plus clip player
///
/// Each die owns its own source. Sharing one between dice would interleave
/// concurrent recordings.
pub trait AnimationSource {
    /// Opaque clip artifact
    type Clip;

    /// The clip recordings are saved into, if this source has one configured
    fn default_clip(&self) -> Option<Self::Clip>;

    /// Start recording the transform of a target starting at `origin`
    fn begin_recording_transform(&mut self, origin: Pose);

    fn is_recording(&self) -> bool;

    /// Abandon the current recording without writing it to any clip
    fn stop_recording(&mut self);

    /// Record the target's pose `delta` seconds after the previous snapshot
    fn take_snapshot(&mut self, pose: Pose, delta: f32);

    /// Finalize the current recording into `clip`, overwriting its contents
    fn save_to_clip(&mut self, clip: &mut Self::Clip);

    /// Play `clip` at `speed` via the named trigger
    fn play_clip(&mut self, clip: &Self::Clip, speed: f32, trigger: &str);

    /// Clip duration in seconds at speed 1
    fn clip_length(&self, clip: &Self::Clip) -> f32;

    /// Enable or disable animation-driven posing
    fn set_enabled(&mut self, enabled: bool);
}

/// A static decorative die
pub trait Prop {
    fn set_active(&mut self, active: bool);

    fn is_active(&self) -> bool;
}
