use crate::CameraError;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle on the ground plane that a walk camera may not leave.
///
/// Always satisfies `min_x < max_x` and `min_z < max_z`; the only way in is
/// [`CameraBounds::new`], deserialization included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct CameraBounds {
    min_x: f32,
    max_x: f32,
    min_z: f32,
    max_z: f32,
}

#[derive(Deserialize)]
struct RawBounds {
    min_x: f32,
    max_x: f32,
    min_z: f32,
    max_z: f32,
}

impl TryFrom<RawBounds> for CameraBounds {
    type Error = CameraError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        CameraBounds::new(raw.min_x, raw.max_x, raw.min_z, raw.max_z)
    }
}

impl CameraBounds {
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Result<Self, CameraError> {
        check_axis('x', min_x, max_x)?;
        check_axis('z', min_z, max_z)?;
        Ok(Self {
            min_x,
            max_x,
            min_z,
            max_z,
        })
    }

    pub fn min_x(&self) -> f32 {
        self.min_x
    }

    pub fn max_x(&self) -> f32 {
        self.max_x
    }

    pub fn min_z(&self) -> f32 {
        self.min_z
    }

    pub fn max_z(&self) -> f32 {
        self.max_z
    }

    /// Hard-clamp a position so that a volume with the given half-extents stays
    /// inside, and pin its height. No easing.
    ///
    /// When the margin is wider than half the bound on an axis, that axis is
    /// pinned to the bound's center.
    pub fn clamp(&self, position: Vec3, margin: Vec3, height: f32) -> Vec3 {
        Vec3::new(
            clamp_axis(position.x, self.min_x, self.max_x, margin.x),
            height,
            clamp_axis(position.z, self.min_z, self.max_z, margin.z),
        )
    }

    /// Whether a position satisfies the clamp for the given margin.
    pub fn contains(&self, position: Vec3, margin: Vec3) -> bool {
        let clamped = self.clamp(position, margin, position.y);
        clamped.x == position.x && clamped.z == position.z
    }
}

fn check_axis(axis: char, min: f32, max: f32) -> Result<(), CameraError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(CameraError::NonFiniteBounds { axis });
    }
    if min >= max {
        return Err(CameraError::InvertedBounds { axis, min, max });
    }
    Ok(())
}

fn clamp_axis(value: f32, min: f32, max: f32, margin: f32) -> f32 {
    let lo = min + margin;
    let hi = max - margin;
    if lo.is_nan() || hi.is_nan() || lo > hi {
        (min + max) * 0.5
    } else {
        value.clamp(lo, hi)
    }
}
