//! Dice Roll - physical dice with a hidden roll and a recorded replay
//!
//! A roll happens twice. The dice are first thrown invisibly under physics
//! while their transforms are recorded; once they settle, the face pointing
//! up is read off each one. The recorded clips are then replayed on visible
//! dice, so what the viewer sees always lands on the captured result.
//!
//! Core modules:
//! - `sim`: Roll orchestration, dice, face detection, engine capabilities
//! - `settings`: Construction-time configuration (JSON)
//! - `error`: Configuration errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{DieSettings, RollSettings};
pub use sim::{RollEvent, RollOrchestrator};

/// Roller configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Dice in the pool
    pub const DEFAULT_CAPACITY: usize = 2;
    /// Launch torque component range
    pub const DEFAULT_FORCE_MIN: f32 = 100.0;
    pub const DEFAULT_FORCE_MAX: f32 = 500.0;
    /// Upward launch force
    pub const DEFAULT_UP_FORCE: f32 = 800.0;
    /// Launch height above the ground
    pub const DEFAULT_LAUNCH_HEIGHT: f32 = 2.0;

    /// Center-to-face distance of a die
    pub const DIE_HALF_EXTENT: f32 = 0.5;
}
