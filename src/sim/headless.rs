//! Headless engine stand-ins
//!
//! Minimal implementations of the engine capabilities so rolls can run
//! without a renderer: a ground-plane rigid-body world, a keyframe
//! transform recorder and a toggleable prop. Bodies are handles into the
//! world (like engine entity handles); `HeadlessWorld::step` integrates them.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::capability::{AnimationSource, Prop, RigidBody};
use super::state::Pose;

/// Gravity acceleration (m/s²)
pub const GRAVITY: f32 = 9.81;
/// Fraction of vertical speed kept after a bounce
pub const RESTITUTION: f32 = 0.3;
/// Impacts slower than this stop instead of bouncing
pub const REST_BOUNCE_SPEED: f32 = 1.0;
/// Fraction of angular velocity kept per grounded step
pub const ANGULAR_DAMPING: f32 = 0.85;
/// Angular speed below which a grounded body falls asleep
pub const SLEEP_SPEED: f32 = 0.05;
/// Slack on ray distance tests
const CONTACT_EPSILON: f32 = 1e-3;

/// Local axes a cube can rest on
const REST_AXES: [Vec3; 6] = [
    Vec3::X,
    Vec3::Y,
    Vec3::Z,
    Vec3::NEG_X,
    Vec3::NEG_Y,
    Vec3::NEG_Z,
];

#[derive(Debug)]
struct BodyState {
    pose: Pose,
    velocity: Vec3,
    angular_velocity: Vec3,
    pending_force: Vec3,
    pending_torque: Vec3,
    half_extent: f32,
    ground_height: f32,
    kinematic: bool,
    gravity: bool,
    visible: bool,
    sleeping: bool,
}

impl BodyState {
    fn integrate(&mut self, dt: f32) {
        if self.kinematic {
            self.pending_force = Vec3::ZERO;
            self.pending_torque = Vec3::ZERO;
            return;
        }

        // Unit mass and inertia: forces are accelerations
        if self.gravity {
            self.velocity.y -= GRAVITY * dt;
        }
        self.velocity += self.pending_force * dt;
        self.angular_velocity += self.pending_torque * dt;
        if self.pending_force != Vec3::ZERO || self.pending_torque != Vec3::ZERO {
            self.sleeping = false;
        }
        self.pending_force = Vec3::ZERO;
        self.pending_torque = Vec3::ZERO;

        self.pose.position += self.velocity * dt;
        let spin = self.angular_velocity.length() * dt;
        if spin > 0.0 {
            let axis = self.angular_velocity.normalize();
            self.pose.rotation = (Quat::from_axis_angle(axis, spin) * self.pose.rotation).normalize();
        }

        let floor = self.ground_height + self.half_extent;
        if self.pose.position.y > floor {
            return;
        }

        self.pose.position.y = floor;
        if self.velocity.y < 0.0 {
            if -self.velocity.y < REST_BOUNCE_SPEED {
                self.velocity.y = 0.0;
            } else {
                self.velocity.y = -self.velocity.y * RESTITUTION;
            }
        }

        self.angular_velocity *= ANGULAR_DAMPING;
        if self.velocity.y == 0.0 && self.angular_velocity.length() < SLEEP_SPEED {
            self.sleep();
            return;
        }

        // Rolling without slipping about the contact point below the center
        let lever = Vec3::new(0.0, self.half_extent, 0.0);
        let rolling = self.angular_velocity.cross(lever);
        self.velocity.x = rolling.x;
        self.velocity.z = rolling.z;
    }

    fn sleep(&mut self) {
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.sleeping = true;

        let rotation = self.pose.rotation;
        let mut best = Vec3::Y;
        let mut best_dot = f32::NEG_INFINITY;
        for axis in REST_AXES {
            let world = rotation * axis;
            let dot = world.dot(Vec3::Y);
            if dot > best_dot {
                best_dot = dot;
                best = world;
            }
        }
        let align = Quat::from_rotation_arc(best.normalize(), Vec3::Y);
        self.pose.rotation = (align * rotation).normalize();
    }
}

/// Ground plane plus the bodies falling onto it
#[derive(Debug, Default)]
pub struct HeadlessWorld {
    bodies: Vec<Rc<RefCell<BodyState>>>,
    ground_height: f32,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ground(ground_height: f32) -> Self {
        Self {
            bodies: Vec::new(),
            ground_height,
        }
    }

    pub fn ground_height(&self) -> f32 {
        self.ground_height
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Spawn a cube resting on the ground at the origin
    pub fn spawn_body(&mut self, half_extent: f32) -> HeadlessBody {
        let state = Rc::new(RefCell::new(BodyState {
            pose: Pose::at(Vec3::new(0.0, self.ground_height + half_extent, 0.0)),
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            pending_force: Vec3::ZERO,
            pending_torque: Vec3::ZERO,
            half_extent,
            ground_height: self.ground_height,
            kinematic: false,
            gravity: true,
            visible: true,
            sleeping: false,
        }));
        self.bodies.push(Rc::clone(&state));
        HeadlessBody { state }
    }

    /// Advance every body by one fixed step
    pub fn step(&mut self, dt: f32) {
        for body in &self.bodies {
            body.borrow_mut().integrate(dt);
        }
    }
}

/// Handle to a body living in a `HeadlessWorld`
#[derive(Debug)]
pub struct HeadlessBody {
    state: Rc<RefCell<BodyState>>,
}

impl HeadlessBody {
    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn is_kinematic(&self) -> bool {
        self.state.borrow().kinematic
    }

    pub fn has_gravity(&self) -> bool {
        self.state.borrow().gravity
    }

    pub fn is_sleeping(&self) -> bool {
        self.state.borrow().sleeping
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.state.borrow().angular_velocity
    }
}

impl RigidBody for HeadlessBody {
    fn pose(&self) -> Pose {
        self.state.borrow().pose
    }

    fn set_pose(&mut self, pose: Pose) {
        let mut state = self.state.borrow_mut();
        state.pose = pose;
        state.velocity = Vec3::ZERO;
        state.angular_velocity = Vec3::ZERO;
        state.sleeping = false;
    }

    fn apply_force(&mut self, force: Vec3) {
        self.state.borrow_mut().pending_force += force;
    }

    fn apply_torque(&mut self, torque: Vec3) {
        self.state.borrow_mut().pending_torque += torque;
    }

    fn linear_velocity(&self) -> Vec3 {
        self.state.borrow().velocity
    }

    fn set_kinematic(&mut self, kinematic: bool) {
        let mut state = self.state.borrow_mut();
        state.kinematic = kinematic;
        if kinematic {
            state.velocity = Vec3::ZERO;
            state.angular_velocity = Vec3::ZERO;
        }
    }

    fn set_gravity(&mut self, enabled: bool) {
        self.state.borrow_mut().gravity = enabled;
    }

    fn set_visible(&mut self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
        let state = self.state.borrow();
        let dir = direction.normalize_or_zero();
        if dir.y >= 0.0 {
            return false;
        }
        let distance = (origin.y - state.ground_height) / -dir.y;
        distance <= max_distance + CONTACT_EPSILON
    }
}

/// A recorded pose at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub pose: Pose,
}

/// Recorded transform track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeClip {
    keyframes: Vec<Keyframe>,
}

impl KeyframeClip {
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Duration in seconds at speed 1
    pub fn length(&self) -> f32 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// Pose at `time`, clamped to the clip ends
    pub fn sample(&self, time: f32) -> Option<Pose> {
        let first = self.keyframes.first()?;
        if time <= first.time {
            return Some(first.pose);
        }
        let next = self.keyframes.partition_point(|k| k.time <= time);
        if next >= self.keyframes.len() {
            return self.keyframes.last().map(|k| k.pose);
        }
        let a = &self.keyframes[next - 1];
        let b = &self.keyframes[next];
        let span = b.time - a.time;
        let t = if span > 0.0 { (time - a.time) / span } else { 1.0 };
        Some(a.pose.interpolate(&b.pose, t))
    }
}

/// Last playback request made on a recorder
#[derive(Debug, Clone)]
pub struct Playback {
    pub clip: KeyframeClip,
    pub speed: f32,
    pub trigger: String,
}

impl Playback {
    /// Wall-clock duration of this playback
    pub fn duration(&self) -> f32 {
        self.clip.length() / self.speed
    }

    /// Pose `elapsed` wall-clock seconds into playback
    pub fn pose_at(&self, elapsed: f32) -> Option<Pose> {
        self.clip.sample(elapsed * self.speed)
    }
}

/// Keyframe transform recorder and player
#[derive(Debug)]
pub struct KeyframeRecorder {
    has_clip: bool,
    enabled: bool,
    recording: bool,
    elapsed: f32,
    buffer: Vec<Keyframe>,
    playback: Option<Playback>,
}

impl Default for KeyframeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyframeRecorder {
    pub fn new() -> Self {
        Self {
            has_clip: true,
            enabled: true,
            recording: false,
            elapsed: 0.0,
            buffer: Vec::new(),
            playback: None,
        }
    }

    /// A recorder with no clip configured
    pub fn without_clip() -> Self {
        Self {
            has_clip: false,
            ..Self::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn playback(&self) -> Option<&Playback> {
        self.playback.as_ref()
    }
}

impl AnimationSource for KeyframeRecorder {
    type Clip = KeyframeClip;

    fn default_clip(&self) -> Option<KeyframeClip> {
        self.has_clip.then(KeyframeClip::default)
    }

    fn begin_recording_transform(&mut self, origin: Pose) {
        self.buffer.clear();
        self.elapsed = 0.0;
        self.buffer.push(Keyframe {
            time: 0.0,
            pose: origin,
        });
        self.recording = true;
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn stop_recording(&mut self) {
        self.buffer.clear();
        self.elapsed = 0.0;
        self.recording = false;
    }

    fn take_snapshot(&mut self, pose: Pose, delta: f32) {
        if !self.recording {
            return;
        }
        self.elapsed += delta;
        self.buffer.push(Keyframe {
            time: self.elapsed,
            pose,
        });
    }

    fn save_to_clip(&mut self, clip: &mut KeyframeClip) {
        clip.keyframes.clear();
        clip.keyframes.extend(self.buffer.drain(..));
        self.recording = false;
    }

    fn play_clip(&mut self, clip: &KeyframeClip, speed: f32, trigger: &str) {
        self.playback = Some(Playback {
            clip: clip.clone(),
            speed,
            trigger: trigger.to_owned(),
        });
    }

    fn clip_length(&self, clip: &KeyframeClip) -> f32 {
        clip.length()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Decorative die that is either shown or hidden
#[derive(Debug, Clone, Default)]
pub struct StaticProp {
    active: bool,
}

impl StaticProp {
    pub fn new(active: bool) -> Self {
        Self { active }
    }
}

impl Prop for StaticProp {
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
