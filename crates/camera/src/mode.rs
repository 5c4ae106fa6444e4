use crate::{OrbitCamera, WalkCamera};
use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Orbit,
    Walk,
}

impl CameraMode {
    pub fn label(self) -> &'static str {
        match self {
            CameraMode::Orbit => "orbit",
            CameraMode::Walk => "walk",
        }
    }
}

impl std::fmt::Display for CameraMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The camera a viewer session drives.
#[derive(Debug, Clone)]
pub enum ViewerCamera {
    Orbit(OrbitCamera),
    Walk(WalkCamera),
}

impl ViewerCamera {
    pub fn mode(&self) -> CameraMode {
        match self {
            ViewerCamera::Orbit(_) => CameraMode::Orbit,
            ViewerCamera::Walk(_) => CameraMode::Walk,
        }
    }

    pub fn eye(&self) -> Vec3 {
        match self {
            ViewerCamera::Orbit(c) => c.position(),
            ViewerCamera::Walk(c) => c.position,
        }
    }

    pub fn target(&self) -> Vec3 {
        match self {
            ViewerCamera::Orbit(c) => c.target,
            ViewerCamera::Walk(c) => c.target(),
        }
    }

    /// Vertical field of view in radians.
    pub fn fov(&self) -> f32 {
        match self {
            ViewerCamera::Orbit(c) => c.fov,
            ViewerCamera::Walk(c) => c.fov,
        }
    }

    pub fn clip(&self) -> (f32, f32) {
        match self {
            ViewerCamera::Orbit(c) => (c.near, c.far),
            ViewerCamera::Walk(c) => (c.near, c.far),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        match self {
            ViewerCamera::Orbit(c) => c.view_matrix(),
            ViewerCamera::Walk(c) => c.view_matrix(),
        }
    }

    /// Per-frame step: inertia for orbit; movement then bounds for walk.
    pub fn update(&mut self) {
        match self {
            ViewerCamera::Orbit(c) => c.update(),
            ViewerCamera::Walk(c) => {
                c.update();
                c.enforce_bounds();
            }
        }
    }

    pub fn as_orbit(&self) -> Option<&OrbitCamera> {
        match self {
            ViewerCamera::Orbit(c) => Some(c),
            ViewerCamera::Walk(_) => None,
        }
    }

    pub fn as_orbit_mut(&mut self) -> Option<&mut OrbitCamera> {
        match self {
            ViewerCamera::Orbit(c) => Some(c),
            ViewerCamera::Walk(_) => None,
        }
    }

    pub fn as_walk(&self) -> Option<&WalkCamera> {
        match self {
            ViewerCamera::Walk(c) => Some(c),
            ViewerCamera::Orbit(_) => None,
        }
    }

    pub fn as_walk_mut(&mut self) -> Option<&mut WalkCamera> {
        match self {
            ViewerCamera::Walk(c) => Some(c),
            ViewerCamera::Orbit(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CameraBounds;

    #[test]
    fn update_enforces_walk_bounds() {
        let mut walk = WalkCamera::new(Vec3::new(30.0, 9.0, 0.0));
        walk.bounds = Some(CameraBounds::new(-1.0, 1.0, -1.0, 1.0).unwrap());
        let mut cam = ViewerCamera::Walk(walk);
        cam.update();
        assert_eq!(cam.eye(), Vec3::new(0.5, 1.6, 0.0));
        assert_eq!(cam.mode(), CameraMode::Walk);
    }

    #[test]
    fn orbit_accessors() {
        let mut cam = ViewerCamera::Orbit(OrbitCamera::default());
        assert!(cam.as_walk().is_none());
        assert!(cam.as_orbit_mut().is_some());
        assert_eq!(cam.target(), Vec3::ZERO);
        assert_eq!(cam.mode().to_string(), "orbit");
    }
}
