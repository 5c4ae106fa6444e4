use crate::{RenderError, Thumbnail};
use glam::{Mat4, Vec3, Vec4};
use glview_common::{MeshId, Ray};
use glview_scene::Scene;
use serde::{Deserialize, Serialize};

/// Camera/view configuration for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Mesh drawn with the selection highlight.
    pub highlight: Option<MeshId>,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 5.0, -10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 0.8,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            highlight: None,
        }
    }
}

impl RenderView {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect.max(f32::EPSILON), self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Ray from the eye through a pixel of a `width` x `height` viewport,
    /// origin top-left.
    pub fn ray_from_screen(&self, x: f32, y: f32, width: f32, height: f32) -> Ray {
        let ndc_x = 2.0 * x / width.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * y / height.max(1.0);
        let inv = self.view_proj().inverse();
        let unproject = |z: f32| {
            let p = inv * Vec4::new(ndc_x, ndc_y, z, 1.0);
            p.truncate() / p.w
        };
        let near = unproject(0.0);
        let far = unproject(1.0);
        Ray::new(near, far - near)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    LowPower,
    #[default]
    HighPerformance,
}

/// Engine construction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub antialias: bool,
    /// Render at the full physical resolution on high-DPI displays.
    pub adapt_to_device_ratio: bool,
    pub power_preference: PowerPreference,
    pub vsync: bool,
    /// Draw a reference grid on the ground plane.
    pub grid: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            antialias: true,
            adapt_to_device_ratio: false,
            power_preference: PowerPreference::default(),
            vsync: true,
            grid: false,
        }
    }
}

impl EngineOptions {
    /// Drawing-buffer size for a canvas of `width` x `height` physical pixels.
    pub fn render_size(&self, width: u32, height: u32, scale_factor: f64) -> (u32, u32) {
        if self.adapt_to_device_ratio || scale_factor <= 1.0 {
            return (width.max(1), height.max(1));
        }
        let scale = |v: u32| ((v as f64 / scale_factor).round() as u32).max(1);
        (scale(width), scale(height))
    }
}

/// Renderer-agnostic engine interface.
///
/// An engine is created on a canvas, draws the scene from a view once per
/// frame and can capture a square offscreen image. It reads the scene but
/// never mutates it.
pub trait RenderEngine: Sized {
    /// What the engine draws into. Kept by the viewer so a rebuild can
    /// create a fresh engine on the same canvas.
    type Canvas: Clone;

    fn create(canvas: Self::Canvas, options: &EngineOptions) -> Result<Self, RenderError>;

    /// Drawing-buffer size in pixels.
    fn size(&self) -> (u32, u32);

    /// New canvas size in physical pixels.
    fn resize(&mut self, width: u32, height: u32);

    fn draw(&mut self, scene: &Scene, view: &RenderView) -> Result<(), RenderError>;

    /// Render `scene` into a `size` x `size` RGBA image.
    fn capture(&mut self, scene: &Scene, view: &RenderView, size: u32)
    -> Result<Thumbnail, RenderError>;

    /// Release every resource. Idempotent.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_at_target() {
        let view = RenderView {
            eye: Vec3::new(0.0, 0.0, -10.0),
            aspect: 16.0 / 9.0,
            ..RenderView::default()
        };
        let ray = view.ray_from_screen(640.0, 360.0, 1280.0, 720.0);
        assert!(ray.direction.abs_diff_eq(Vec3::Z, 1e-4));
        assert!((ray.origin.z - (-10.0 + view.near)).abs() < 1e-3);
    }

    #[test]
    fn corner_rays_diverge() {
        let view = RenderView::default();
        let left = view.ray_from_screen(0.0, 50.0, 100.0, 100.0);
        let right = view.ray_from_screen(100.0, 50.0, 100.0, 100.0);
        let top = view.ray_from_screen(50.0, 0.0, 100.0, 100.0);
        // Looking from -Z toward the origin, screen-left is world +X.
        assert!(left.direction.x > right.direction.x);
        assert!(top.direction.y > left.direction.y);
    }

    #[test]
    fn render_size_respects_device_ratio() {
        let mut options = EngineOptions::default();
        assert_eq!(options.render_size(2560, 1440, 2.0), (1280, 720));
        assert_eq!(options.render_size(800, 600, 1.0), (800, 600));
        options.adapt_to_device_ratio = true;
        assert_eq!(options.render_size(2560, 1440, 2.0), (2560, 1440));
        assert_eq!(options.render_size(0, 0, 1.0), (1, 1));
    }

    #[test]
    fn engine_options_from_yaml() {
        let options: EngineOptions =
            serde_yaml::from_str("antialias: false\npower_preference: low_power\n").unwrap();
        assert!(!options.antialias);
        assert!(options.vsync);
        assert_eq!(options.power_preference, PowerPreference::LowPower);
    }
}
