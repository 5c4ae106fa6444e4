use crate::INERTIA_EPSILON;
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Orbit parameters captured when the user picks a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
}

/// Arc-rotate camera orbiting `target`.
///
/// `alpha` is the azimuth around +Y, `beta` the polar angle from +Y and
/// `radius` the distance. User input accumulates inertial offsets which
/// `update` applies and decays once per frame.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub wheel_precision: f32,
    pub panning_sensibility: f32,
    pub angular_sensibility: f32,
    pub lower_radius_limit: f32,
    pub upper_radius_limit: f32,
    pub lower_beta_limit: f32,
    pub upper_beta_limit: f32,
    pub inertia: f32,
    pub panning_inertia: f32,
    inertial_alpha: f32,
    inertial_beta: f32,
    inertial_radius: f32,
    inertial_panning: Vec2,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(PI / 2.0, PI / 2.5, 10.0, Vec3::ZERO)
    }
}

impl OrbitCamera {
    pub fn new(alpha: f32, beta: f32, radius: f32, target: Vec3) -> Self {
        Self {
            alpha,
            beta,
            radius,
            target,
            fov: 0.8,
            near: 0.1,
            far: 1000.0,
            wheel_precision: 50.0,
            panning_sensibility: 50.0,
            angular_sensibility: 1000.0,
            lower_radius_limit: 2.0,
            upper_radius_limit: 50.0,
            lower_beta_limit: 0.01,
            upper_beta_limit: PI - 0.01,
            inertia: 0.9,
            panning_inertia: 0.8,
            inertial_alpha: 0.0,
            inertial_beta: 0.0,
            inertial_radius: 0.0,
            inertial_panning: Vec2::ZERO,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sa, ca) = self.alpha.sin_cos();
        let (sb, cb) = self.beta.sin_cos();
        self.target + self.radius * Vec3::new(ca * sb, cb, sa * sb)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn snapshot(&self) -> CameraState {
        CameraState {
            alpha: self.alpha,
            beta: self.beta,
            radius: self.radius,
            target: self.target,
        }
    }

    /// Put the camera back exactly where the snapshot was taken and drop any
    /// pending inertial motion.
    pub fn restore(&mut self, state: &CameraState) {
        self.alpha = state.alpha;
        self.beta = state.beta;
        self.radius = state.radius;
        self.target = state.target;
        self.stop();
    }

    pub fn stop(&mut self) {
        self.inertial_alpha = 0.0;
        self.inertial_beta = 0.0;
        self.inertial_radius = 0.0;
        self.inertial_panning = Vec2::ZERO;
    }

    pub fn is_moving(&self) -> bool {
        self.inertial_alpha != 0.0
            || self.inertial_beta != 0.0
            || self.inertial_radius != 0.0
            || self.inertial_panning != Vec2::ZERO
    }

    /// Pointer drag in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.inertial_alpha -= dx / self.angular_sensibility;
        self.inertial_beta -= dy / self.angular_sensibility;
    }

    /// Wheel delta; positive zooms in.
    pub fn zoom(&mut self, delta: f32) {
        self.inertial_radius += delta / self.wheel_precision;
    }

    /// Pointer drag in pixels, moving the target in the view plane.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.inertial_panning.x -= dx / self.panning_sensibility;
        self.inertial_panning.y += dy / self.panning_sensibility;
    }

    /// Apply and decay inertial offsets, then enforce limits.
    pub fn update(&mut self) {
        if self.inertial_alpha != 0.0 || self.inertial_beta != 0.0 || self.inertial_radius != 0.0 {
            self.alpha += self.inertial_alpha;
            self.beta += self.inertial_beta;
            self.radius -= self.inertial_radius;
            self.inertial_alpha = decay(self.inertial_alpha, self.inertia);
            self.inertial_beta = decay(self.inertial_beta, self.inertia);
            self.inertial_radius = decay(self.inertial_radius, self.inertia);
        }

        if self.inertial_panning != Vec2::ZERO {
            let forward = (self.target - self.position()).normalize_or_zero();
            let right = forward.cross(Vec3::Y).normalize_or_zero();
            let up = right.cross(forward);
            self.target += right * -self.inertial_panning.x + up * self.inertial_panning.y;
            self.inertial_panning.x = decay(self.inertial_panning.x, self.panning_inertia);
            self.inertial_panning.y = decay(self.inertial_panning.y, self.panning_inertia);
        }

        self.check_limits();
    }

    fn check_limits(&mut self) {
        self.beta = self.beta.clamp(self.lower_beta_limit, self.upper_beta_limit);
        self.radius = self
            .radius
            .clamp(self.lower_radius_limit, self.upper_radius_limit);
    }
}

fn decay(offset: f32, inertia: f32) -> f32 {
    let next = offset * inertia;
    if next.abs() < INERTIA_EPSILON { 0.0 } else { next }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_matches_documented_defaults() {
        let cam = OrbitCamera::default();
        assert_eq!(cam.alpha, PI / 2.0);
        assert_eq!(cam.beta, PI / 2.5);
        assert_eq!(cam.radius, 10.0);
        assert_eq!(cam.target, Vec3::ZERO);
        assert_eq!(cam.wheel_precision, 50.0);
        assert_eq!(cam.inertia, 0.9);
        assert!(!cam.view_matrix().col(0).x.is_nan());
    }

    #[test]
    fn position_lies_at_radius_from_target() {
        let cam = OrbitCamera::new(0.3, 1.1, 7.0, Vec3::new(1.0, 2.0, 3.0));
        assert!((cam.position().distance(cam.target) - 7.0).abs() < 1e-4);
    }

    #[test]
    fn alpha_half_pi_looks_from_positive_z() {
        let cam = OrbitCamera::new(PI / 2.0, PI / 2.0, 10.0, Vec3::ZERO);
        assert!(cam.position().abs_diff_eq(Vec3::new(0.0, 0.0, 10.0), 1e-4));
    }

    #[test]
    fn snapshot_restore_is_exact() {
        let mut cam = OrbitCamera::default();
        cam.rotate(120.0, -40.0);
        cam.zoom(30.0);
        for _ in 0..5 {
            cam.update();
        }
        let state = cam.snapshot();

        let mut fresh = OrbitCamera::default();
        fresh.rotate(10.0, 10.0);
        fresh.restore(&state);
        assert_eq!(fresh.snapshot(), state);
        assert!(!fresh.is_moving());
    }

    #[test]
    fn inertia_decays_to_rest() {
        let mut cam = OrbitCamera::default();
        let start = cam.alpha;
        cam.rotate(100.0, 0.0);
        for _ in 0..200 {
            cam.update();
        }
        assert!(!cam.is_moving());
        assert!(cam.alpha < start);
    }

    #[test]
    fn zoom_respects_radius_limits() {
        let mut cam = OrbitCamera::default();
        cam.zoom(10_000.0);
        for _ in 0..50 {
            cam.update();
        }
        assert_eq!(cam.radius, cam.lower_radius_limit);

        cam.zoom(-100_000.0);
        for _ in 0..50 {
            cam.update();
        }
        assert_eq!(cam.radius, cam.upper_radius_limit);
    }

    #[test]
    fn beta_stays_off_the_poles() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, 100_000.0);
        cam.update();
        assert_eq!(cam.beta, cam.lower_beta_limit);
    }

    #[test]
    fn pan_moves_target() {
        let mut cam = OrbitCamera::default();
        cam.pan(100.0, 0.0);
        cam.update();
        assert_ne!(cam.target, Vec3::ZERO);
        assert!((cam.target.y).abs() < 1e-5);
    }
}
