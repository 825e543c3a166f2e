//! Face table and up-face selection
//!
//! A die's faces are an ordered list of object-space normals. Label `n`
//! names the normal at index `n - 1`.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::state::FaceValue;

/// Ordered face normals of a die
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceTable {
    normals: Vec<Vec3>,
}

impl Default for FaceTable {
    fn default() -> Self {
        Self::cube()
    }
}

impl FaceTable {
    /// Largest table a `FaceValue` can label
    pub const MAX_FACES: usize = FaceValue::MAX as usize;

    pub fn new(normals: Vec<Vec3>) -> Self {
        Self { normals }
    }

    /// Standard six-sided die (opposite faces sum to 7)
    pub fn cube() -> Self {
        Self::new(vec![
            Vec3::Y,
            Vec3::X,
            Vec3::Z,
            Vec3::NEG_Z,
            Vec3::NEG_X,
            Vec3::NEG_Y,
        ])
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }

    /// Object-space normal for a label
    pub fn normal(&self, label: FaceValue) -> Option<Vec3> {
        (label as usize)
            .checked_sub(1)
            .and_then(|i| self.normals.get(i))
            .copied()
    }

    /// Label of the face whose world-space normal best aligns with `up`
    ///
    /// Ties go to the earlier face in the table.
    pub fn select_up(&self, rotation: Quat, up: Vec3) -> Option<FaceValue> {
        let mut best: Option<(FaceValue, f32)> = None;
        for (i, normal) in self.normals.iter().take(Self::MAX_FACES).enumerate() {
            let dot = (rotation * *normal).dot(up);
            if best.is_none_or(|(_, best_dot)| dot > best_dot) {
                best = Some((i as FaceValue + 1, dot));
            }
        }
        best.map(|(label, _)| label)
    }
}
