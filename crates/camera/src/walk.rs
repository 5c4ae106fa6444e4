use crate::{CameraBounds, INERTIA_EPSILON};
use glam::{Mat4, Vec2, Vec3};
use glview_common::Aabb;

/// Directional intent for one frame, each axis in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WalkInput {
    pub forward: f32,
    pub right: f32,
}

impl WalkInput {
    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.right == 0.0
    }
}

/// First-person camera that walks at a fixed eye height.
///
/// Movement is ground-plane only: the walk direction follows yaw and ignores
/// pitch. Vertical position is owned by [`WalkCamera::enforce_bounds`], not by
/// gravity.
#[derive(Debug, Clone)]
pub struct WalkCamera {
    pub position: Vec3,
    /// Rotation around +Y; zero faces +Z.
    pub yaw: f32,
    /// Positive looks up.
    pub pitch: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub inertia: f32,
    pub angular_sensibility: f32,
    pub eye_height: f32,
    /// Half-extents of the collision volume.
    pub ellipsoid: Vec3,
    pub bounds: Option<CameraBounds>,
    velocity: Vec3,
    angular_velocity: Vec2,
}

impl Default for WalkCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.6, -5.0))
    }
}

impl WalkCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov: 0.8,
            near: 0.1,
            far: 1000.0,
            speed: 0.1,
            inertia: 0.8,
            angular_sensibility: 2000.0,
            eye_height: 1.6,
            ellipsoid: Vec3::new(0.5, 1.0, 0.5),
            bounds: None,
            velocity: Vec3::ZERO,
            angular_velocity: Vec2::ZERO,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(sy * cp, sp, cy * cp)
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    pub fn target(&self) -> Vec3 {
        self.position + self.forward()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target(), Vec3::Y)
    }

    /// Aim at a world point.
    pub fn set_target(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() == 0.0 {
            return;
        }
        self.yaw = dir.x.atan2(dir.z);
        self.pitch = dir.y.atan2(Vec2::new(dir.x, dir.z).length());
    }

    /// Accumulate one frame of directional input.
    pub fn walk(&mut self, input: WalkInput) {
        if input.is_idle() {
            return;
        }
        let (sy, cy) = self.yaw.sin_cos();
        let ahead = Vec3::new(sy, 0.0, cy);
        let right = ahead.cross(Vec3::Y);
        let dir = (ahead * input.forward + right * input.right).normalize_or_zero();
        self.velocity += dir * self.speed;
    }

    /// Pointer drag in pixels.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.angular_velocity.x += dx / self.angular_sensibility;
        self.angular_velocity.y -= dy / self.angular_sensibility;
    }

    /// Apply and decay velocities. Does not clamp; call `enforce_bounds` after.
    pub fn update(&mut self) {
        self.position += self.velocity;
        self.yaw -= self.angular_velocity.x;
        self.pitch = (self.pitch + self.angular_velocity.y).clamp(-MAX_PITCH, MAX_PITCH);

        self.velocity *= self.inertia;
        if self.velocity.length() < INERTIA_EPSILON {
            self.velocity = Vec3::ZERO;
        }
        self.angular_velocity *= self.inertia;
        if self.angular_velocity.length() < INERTIA_EPSILON {
            self.angular_velocity = Vec2::ZERO;
        }
    }

    /// Pin the eye height and hard-clamp the collision volume into the bounds.
    pub fn enforce_bounds(&mut self) {
        match self.bounds {
            Some(bounds) => {
                self.position = bounds.clamp(self.position, self.ellipsoid, self.eye_height);
            }
            None => self.position.y = self.eye_height,
        }
    }

    /// Stand at the horizontal centroid of `extents`, facing +Z.
    pub fn recenter(&mut self, extents: &Aabb) {
        if extents.is_empty() {
            tracing::debug!("recenter skipped: empty extents");
            return;
        }
        let center = extents.center();
        self.position = Vec3::new(center.x, self.eye_height, center.z);
        self.set_target(Vec3::new(center.x, self.eye_height, center.z + 1.0));
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec2::ZERO;
        tracing::debug!(position = ?self.position, "walk camera recentered");
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != Vec3::ZERO || self.angular_velocity != Vec2::ZERO
    }
}

const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
