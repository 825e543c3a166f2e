//! Dice roll simulation module
//!
//! All roll logic lives here. Engine access goes through the capability
//! traits so this module stays deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by die index)

pub mod capability;
pub mod decor;
pub mod die;
pub mod face;
pub mod headless;
pub mod orchestrator;
pub mod state;

pub use capability::{AnimationSource, Prop, RigidBody};
pub use decor::DecorativeSet;
pub use die::{DieActor, ROLL_TRIGGER};
pub use face::FaceTable;
pub use headless::{HeadlessBody, HeadlessWorld, KeyframeClip, KeyframeRecorder, StaticProp};
pub use orchestrator::{ReplayTimer, RollOrchestrator};
pub use state::{DieMode, FaceValue, ForceRange, Pose, RollEvent, RollPhase};
