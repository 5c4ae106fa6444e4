//! Cameras for the viewer.
//!
//! Renders a scene from either an orbiting camera or a first-person walk
//! camera. Camera motion is driven per frame by the viewer, never by the
//! renderer.
//!
//! # Invariants
//! - After `WalkCamera::enforce_bounds`, the eye sits at `eye_height` and the
//!   collision ellipsoid lies inside the configured bounds.
//! - `OrbitCamera::restore(snapshot)` reproduces alpha, beta, radius and
//!   target exactly.

mod bounds;
mod config;
mod mode;
mod orbit;
mod walk;

pub use bounds::CameraBounds;
pub use config::{CameraConfig, OrbitConfig, WalkConfig};
pub use mode::{CameraMode, ViewerCamera};
pub use orbit::{CameraState, OrbitCamera};
pub use walk::{WalkCamera, WalkInput};

/// Errors from camera configuration.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CameraError {
    #[error("camera bounds inverted on {axis} axis: min {min} >= max {max}")]
    InvertedBounds { axis: char, min: f32, max: f32 },
    #[error("camera bounds on {axis} axis are not finite")]
    NonFiniteBounds { axis: char },
    #[error("radius limits inverted: lower {lower} > upper {upper}")]
    InvalidRadiusLimits { lower: f32, upper: f32 },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must be finite")]
    NotFinite { name: &'static str },
    #[error("collision ellipsoid needs finite, non-negative half-extents, got {0}")]
    InvalidEllipsoid(glam::Vec3),
}

/// Offsets below this magnitude stop inertial motion.
pub(crate) const INERTIA_EPSILON: f32 = 0.001;
