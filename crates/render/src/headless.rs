use crate::thumbnail::to_rgba8;
use crate::{EngineOptions, RenderEngine, RenderError, RenderView, Thumbnail};
use glview_common::MeshId;
use glview_scene::Scene;
use std::fmt::Write as _;

/// A canvas that exists only as a size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessCanvas {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl HeadlessCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale_factor: 1.0,
        }
    }
}

/// Text renderer: each frame becomes a human-readable description of the
/// scene. Captures are filled with the colour of the first visible mesh.
///
/// Useful for the CLI, logging and testing everything above the engine.
#[derive(Debug)]
pub struct HeadlessEngine {
    options: EngineOptions,
    scale_factor: f64,
    size: (u32, u32),
    frames: u64,
    last_frame: String,
    captures: Vec<Vec<MeshId>>,
    fail_captures: bool,
    disposed: bool,
}

impl HeadlessEngine {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Text of the most recent frame.
    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    /// For each capture so far, the meshes that were visible during it.
    pub fn captures(&self) -> &[Vec<MeshId>] {
        &self.captures
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Make subsequent captures fail, to exercise error paths.
    pub fn fail_captures(&mut self, fail: bool) {
        self.fail_captures = fail;
    }

    pub fn describe(scene: &Scene, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Scene ({} meshes) ===", scene.mesh_count());
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.2}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z, view.fov
        );
        for light in scene.lights() {
            let _ = writeln!(
                out,
                "  light {} dir=({:.1}, {:.1}, {:.1}) intensity={:.2}",
                light.name, light.direction.x, light.direction.y, light.direction.z, light.intensity
            );
        }
        for (id, mesh) in scene.meshes() {
            let p = mesh.transform.position;
            let marker = if view.highlight == Some(id) { '*' } else { ' ' };
            let _ = writeln!(
                out,
                " {marker}[{id}] {} pos=({:.2}, {:.2}, {:.2}){}",
                mesh.name,
                p.x,
                p.y,
                p.z,
                if mesh.visible { "" } else { " hidden" }
            );
        }
        out
    }
}

impl RenderEngine for HeadlessEngine {
    type Canvas = HeadlessCanvas;

    fn create(canvas: HeadlessCanvas, options: &EngineOptions) -> Result<Self, RenderError> {
        if !(canvas.scale_factor.is_finite() && canvas.scale_factor > 0.0) {
            return Err(RenderError::Surface(format!(
                "invalid scale factor {}",
                canvas.scale_factor
            )));
        }
        let size = options.render_size(canvas.width, canvas.height, canvas.scale_factor);
        tracing::debug!(width = size.0, height = size.1, "headless engine created");
        Ok(Self {
            options: options.clone(),
            scale_factor: canvas.scale_factor,
            size,
            frames: 0,
            last_frame: String::new(),
            captures: Vec::new(),
            fail_captures: false,
            disposed: false,
        })
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = self.options.render_size(width, height, self.scale_factor);
    }

    fn draw(&mut self, scene: &Scene, view: &RenderView) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.last_frame = Self::describe(scene, view);
        self.frames += 1;
        Ok(())
    }

    fn capture(
        &mut self,
        scene: &Scene,
        _view: &RenderView,
        size: u32,
    ) -> Result<Thumbnail, RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        if self.fail_captures {
            return Err(RenderError::Capture("captures disabled".into()));
        }
        if size == 0 {
            return Err(RenderError::Capture("zero-sized capture".into()));
        }
        let visible: Vec<MeshId> = scene
            .meshes()
            .filter(|(_, m)| m.visible)
            .map(|(id, _)| id)
            .collect();
        let color = visible
            .first()
            .and_then(|id| scene.get(*id))
            .map(|m| m.material.as_ref().map_or([0.8, 0.8, 0.8, 1.0], |mat| mat.base_color))
            .unwrap_or(scene.settings().clear_color);
        self.captures.push(visible);
        Ok(Thumbnail::filled(size, size, to_rgba8(color)))
    }

    fn dispose(&mut self) {
        if !self.disposed {
            tracing::debug!(frames = self.frames, "headless engine disposed");
        }
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use glview_common::{Material, MeshGeometry, Transform};
    use glview_scene::{HemisphericLight, Provenance, SceneMesh, SceneSettings};
    use std::sync::Arc;

    fn engine() -> HeadlessEngine {
        HeadlessEngine::create(HeadlessCanvas::new(640, 480), &EngineOptions::default()).unwrap()
    }

    fn scene_with_cube() -> (Scene, MeshId) {
        let mut scene = Scene::new(SceneSettings::default());
        scene.add_light(HemisphericLight::new("light", Vec3::Y));
        let id = scene.add_mesh(
            SceneMesh::new(
                "cube",
                Provenance::Asset { generation: 1 },
                Arc::new(MeshGeometry::cube(1.0)),
            )
            .with_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)))
            .with_material(Material {
                name: "red".into(),
                base_color: [1.0, 0.0, 0.0, 1.0],
            }),
        );
        (scene, id)
    }

    #[test]
    fn draw_describes_scene() {
        let (scene, id) = scene_with_cube();
        let mut engine = engine();
        let view = RenderView {
            highlight: Some(id),
            ..RenderView::default()
        };
        engine.draw(&scene, &view).unwrap();
        assert_eq!(engine.frames(), 1);
        let text = engine.last_frame();
        assert!(text.contains("1 meshes"));
        assert!(text.contains("light light"));
        assert!(text.contains("*[mesh#1] cube pos=(1.00, 2.00, 3.00)"));
    }

    #[test]
    fn capture_uses_first_visible_colour() {
        let (mut scene, id) = scene_with_cube();
        let mut engine = engine();
        let thumb = engine.capture(&scene, &RenderView::default(), 8).unwrap();
        assert_eq!((thumb.width, thumb.height), (8, 8));
        assert_eq!(thumb.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(engine.captures(), &[vec![id]]);

        scene.get_mut(id).unwrap().visible = false;
        engine.capture(&scene, &RenderView::default(), 8).unwrap();
        assert!(engine.captures()[1].is_empty());
    }

    #[test]
    fn capture_failures() {
        let (scene, _) = scene_with_cube();
        let mut engine = engine();
        assert!(matches!(
            engine.capture(&scene, &RenderView::default(), 0),
            Err(RenderError::Capture(_))
        ));
        engine.fail_captures(true);
        assert!(engine.capture(&scene, &RenderView::default(), 8).is_err());
    }

    #[test]
    fn disposed_engine_refuses_work() {
        let (scene, _) = scene_with_cube();
        let mut engine = engine();
        engine.dispose();
        engine.dispose();
        assert!(engine.is_disposed());
        assert!(matches!(
            engine.draw(&scene, &RenderView::default()),
            Err(RenderError::Disposed)
        ));
    }

    #[test]
    fn resize_applies_device_ratio() {
        let canvas = HeadlessCanvas {
            scale_factor: 2.0,
            ..HeadlessCanvas::new(1600, 1200)
        };
        let mut engine = HeadlessEngine::create(canvas, &EngineOptions::default()).unwrap();
        assert_eq!(engine.size(), (800, 600));
        engine.resize(1000, 500);
        assert_eq!(engine.size(), (500, 250));
    }

    #[test]
    fn unusable_scale_factor_fails_creation() {
        for scale_factor in [0.0, -1.0, f64::NAN] {
            let canvas = HeadlessCanvas {
                scale_factor,
                ..HeadlessCanvas::new(800, 600)
            };
            assert!(matches!(
                HeadlessEngine::create(canvas, &EngineOptions::default()),
                Err(RenderError::Surface(_))
            ));
        }
    }
}
