use crate::{CameraBounds, CameraError, OrbitCamera, ViewerCamera, WalkCamera};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Camera configuration as supplied by the host. Every field is optional;
/// `build` fills in the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CameraConfig {
    Orbit(OrbitConfig),
    Walk(WalkConfig),
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig::Orbit(OrbitConfig::default())
    }
}

impl CameraConfig {
    pub fn build(&self) -> Result<ViewerCamera, CameraError> {
        Ok(match self {
            CameraConfig::Orbit(c) => ViewerCamera::Orbit(c.build()?),
            CameraConfig::Walk(c) => ViewerCamera::Walk(c.build()?),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub alpha: Option<f32>,
    pub beta: Option<f32>,
    pub radius: Option<f32>,
    pub target: Option<Vec3>,
    pub wheel_precision: Option<f32>,
    pub panning_sensibility: Option<f32>,
    pub lower_radius_limit: Option<f32>,
    pub upper_radius_limit: Option<f32>,
    pub panning_inertia: Option<f32>,
    pub inertia: Option<f32>,
}

impl OrbitConfig {
    pub fn build(&self) -> Result<OrbitCamera, CameraError> {
        let defaults = OrbitCamera::default();
        let mut cam = OrbitCamera::new(
            finite("alpha", self.alpha, defaults.alpha)?,
            finite("beta", self.beta, defaults.beta)?,
            positive("radius", self.radius, defaults.radius)?,
            finite_vec("target", self.target, defaults.target)?,
        );
        cam.wheel_precision = positive(
            "wheel_precision",
            self.wheel_precision,
            defaults.wheel_precision,
        )?;
        cam.panning_sensibility = positive(
            "panning_sensibility",
            self.panning_sensibility,
            defaults.panning_sensibility,
        )?;
        cam.lower_radius_limit = finite(
            "lower_radius_limit",
            self.lower_radius_limit,
            defaults.lower_radius_limit,
        )?;
        cam.upper_radius_limit = finite(
            "upper_radius_limit",
            self.upper_radius_limit,
            defaults.upper_radius_limit,
        )?;
        if cam.lower_radius_limit > cam.upper_radius_limit {
            return Err(CameraError::InvalidRadiusLimits {
                lower: cam.lower_radius_limit,
                upper: cam.upper_radius_limit,
            });
        }
        cam.panning_inertia = finite(
            "panning_inertia",
            self.panning_inertia,
            defaults.panning_inertia,
        )?;
        cam.inertia = finite("inertia", self.inertia, defaults.inertia)?;
        Ok(cam)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    pub position: Option<Vec3>,
    pub target: Option<Vec3>,
    pub speed: Option<f32>,
    pub inertia: Option<f32>,
    pub eye_height: Option<f32>,
    pub ellipsoid: Option<Vec3>,
    pub angular_sensibility: Option<f32>,
    pub bounds: Option<CameraBounds>,
}

impl WalkConfig {
    pub fn build(&self) -> Result<WalkCamera, CameraError> {
        let defaults = WalkCamera::default();
        let mut cam = WalkCamera::new(finite_vec("position", self.position, defaults.position)?);
        cam.speed = positive("speed", self.speed, defaults.speed)?;
        cam.inertia = finite("inertia", self.inertia, defaults.inertia)?;
        cam.eye_height = finite("eye_height", self.eye_height, defaults.eye_height)?;
        cam.ellipsoid = match self.ellipsoid {
            Some(e) if e.is_finite() && e.cmpge(Vec3::ZERO).all() => e,
            Some(e) => return Err(CameraError::InvalidEllipsoid(e)),
            None => defaults.ellipsoid,
        };
        cam.angular_sensibility = positive(
            "angular_sensibility",
            self.angular_sensibility,
            defaults.angular_sensibility,
        )?;
        cam.bounds = self.bounds;
        if let Some(target) = self.target {
            if !target.is_finite() {
                return Err(CameraError::NotFinite { name: "target" });
            }
            cam.set_target(target);
        }
        cam.enforce_bounds();
        Ok(cam)
    }
}

fn positive(name: &'static str, value: Option<f32>, default: f32) -> Result<f32, CameraError> {
    match finite(name, value, default)? {
        v if v > 0.0 => Ok(v),
        v => Err(CameraError::NotPositive { name, value: v }),
    }
}

fn finite(name: &'static str, value: Option<f32>, default: f32) -> Result<f32, CameraError> {
    match value {
        Some(v) if !v.is_finite() => Err(CameraError::NotFinite { name }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

fn finite_vec(
    name: &'static str,
    value: Option<Vec3>,
    default: Vec3,
) -> Result<Vec3, CameraError> {
    match value {
        Some(v) if !v.is_finite() => Err(CameraError::NotFinite { name }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}
