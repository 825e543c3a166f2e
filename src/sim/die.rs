//! A single die: hidden physical roll, face sampling, recorded replay
//!
//! The die owns its body, its animation source and the clip that source
//! records into. Modes are derived from four flags (see `DieMode`):
//! Idle -> Rolling via `roll`, Rolling -> finalized via `finish_recording`,
//! finalized -> Replaying via `fake_roll`.

use glam::Vec3;
use rand::Rng;

use super::capability::{AnimationSource, RigidBody};
use super::face::FaceTable;
use super::state::{DieMode, FaceValue, ForceRange, Pose};
use crate::settings::DieSettings;

/// Animator trigger that starts clip playback
pub const ROLL_TRIGGER: &str = "Roll";

/// One die in the pool
pub struct DieActor<B: RigidBody, A: AnimationSource> {
    index: usize,
    body: B,
    animation: A,
    recorded_clip: Option<A::Clip>,
    faces: FaceTable,
    half_extent: f32,
    animation_speed: f32,
    selected_value: Option<FaceValue>,
    physics_enabled: bool,
    detection_enabled: bool,
    recording: bool,
    visible: bool,
    in_ground: bool,
}

impl<B: RigidBody, A: AnimationSource> DieActor<B, A> {
    /// Create an idle die. The clip is taken from the animation source once.
    pub fn new(index: usize, body: B, animation: A, settings: &DieSettings) -> Self {
        let recorded_clip = animation.default_clip();
        if recorded_clip.is_none() {
            log::debug!("Die {} has no clip source; replay disabled", index);
        }
        let mut die = Self {
            index,
            body,
            animation,
            recorded_clip,
            faces: settings.faces.clone(),
            half_extent: settings.half_extent,
            animation_speed: settings.animation_speed,
            selected_value: None,
            physics_enabled: false,
            detection_enabled: false,
            recording: false,
            visible: false,
            in_ground: false,
        };
        die.set_renderer_state(false);
        die.set_physics(false);
        die
    }

    /// Stable slot in the pool
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn animation_speed(&self) -> f32 {
        self.animation_speed
    }

    /// Best face so far. Only meaningful while detection is enabled.
    pub fn selected_value(&self) -> Option<FaceValue> {
        if self.detection_enabled {
            self.selected_value
        } else {
            None
        }
    }

    pub fn is_in_ground(&self) -> bool {
        self.in_ground
    }

    /// Settled: zero linear velocity while touching the ground
    pub fn is_stopped(&self) -> bool {
        self.body.linear_velocity() == Vec3::ZERO && self.in_ground
    }

    pub fn is_physics_enabled(&self) -> bool {
        self.physics_enabled
    }

    pub fn is_detection_enabled(&self) -> bool {
        self.detection_enabled
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn mode(&self) -> DieMode {
        match (
            self.physics_enabled,
            self.detection_enabled,
            self.recording,
            self.visible,
        ) {
            (false, false, false, false) => DieMode::Idle,
            (true, true, true, false) => DieMode::Rolling,
            (false, false, false, true) => DieMode::Replaying,
            _ => DieMode::Transitional,
        }
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn animation(&self) -> &A {
        &self.animation
    }

    pub fn recorded_clip(&self) -> Option<&A::Clip> {
        self.recorded_clip.as_ref()
    }

    /// Replay duration at this die's speed; zero without a clip
    pub fn clip_duration(&self) -> f32 {
        match &self.recorded_clip {
            Some(clip) => self.animation.clip_length(clip) / self.animation_speed,
            None => 0.0,
        }
    }

    pub fn set_renderer_state(&mut self, visible: bool) {
        self.visible = visible;
        self.body.set_visible(visible);
    }

    /// Hand the body to the physics engine (or take it back for animation)
    pub fn set_physics(&mut self, enabled: bool) {
        self.physics_enabled = enabled;
        self.animation.set_enabled(!enabled);
        self.body.set_kinematic(!enabled);
        self.body.set_gravity(enabled);
        self.detection_enabled = enabled;
    }

    /// Start recording this die's transform
    pub fn record_movement(&mut self) {
        self.animation.begin_recording_transform(self.body.pose());
        self.recording = true;
    }

    /// Launch from `launch` with an upward push and a random torque
    pub fn roll<R: Rng>(
        &mut self,
        launch: Pose,
        force_range: ForceRange,
        up_force: f32,
        rng: &mut R,
    ) {
        let torque = Vec3::new(
            rng.random_range(force_range.min..=force_range.max),
            rng.random_range(force_range.min..=force_range.max),
            rng.random_range(force_range.min..=force_range.max),
        );

        self.in_ground = false;
        self.selected_value = None;

        self.body.set_pose(launch);
        if self.recording {
            // Re-anchor so the clip starts at the launch pose, not the old one
            self.animation.begin_recording_transform(launch);
        }
        self.body.apply_force(launch.up() * up_force);
        self.body.apply_torque(torque);

        log::debug!("Die {} launched with torque {:?}", self.index, torque);
    }

    /// Per physics tick: sample the up face and probe for ground contact
    ///
    /// Ground contact is recomputed every tick, so a die that bounces off
    /// the ground is not reported as touching it mid-air.
    pub fn update(&mut self) {
        if !self.detection_enabled {
            return;
        }

        let pose = self.body.pose();
        if let Some(value) = self.faces.select_up(pose.rotation, Vec3::Y) {
            self.selected_value = Some(value);
        }

        // Probe along the object-space normals: for an axis-aligned face
        // table this covers every world axis, including straight down.
        self.in_ground = self
            .faces
            .normals()
            .iter()
            .any(|normal| self.body.raycast(pose.position, *normal, self.half_extent));
    }

    /// After the physics tick: snapshot the transform while recording
    pub fn late_update(&mut self, delta: f32) {
        if !self.recording || self.recorded_clip.is_none() {
            return;
        }
        self.animation.take_snapshot(self.body.pose(), delta);
    }

    /// Stop sampling and finalize the recorded clip
    pub fn finish_recording(&mut self) {
        self.detection_enabled = false;
        if self.recording {
            self.save_clip();
            self.recording = false;
        }
    }

    fn save_clip(&mut self) {
        let Some(clip) = self.recorded_clip.as_mut() else {
            return;
        };
        if self.animation.is_recording() {
            self.animation.save_to_clip(clip);
        }
    }

    /// Show the die and play back the finalized clip
    pub fn fake_roll(&mut self) {
        self.in_ground = false;
        self.set_renderer_state(true);
        self.set_physics(false);
        if let Some(clip) = &self.recorded_clip {
            self.animation.play_clip(clip, self.animation_speed, ROLL_TRIGGER);
        }
    }

    /// Back to Idle: hidden, no physics, nothing recorded
    pub fn reset(&mut self) {
        self.set_renderer_state(false);
        self.set_physics(false);
        if self.animation.is_recording() {
            self.animation.stop_recording();
        }
        self.recording = false;
    }
}
