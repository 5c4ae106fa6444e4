use crate::loader::{self, LoadFailure, LoadState};
use crate::thumbnail;
use crate::{ResizeHub, ResizeSubscription, SelectionEvent, ViewerConfig, ViewerError};
use glam::Vec3;
use glview_assets::{ImportCompletion, ImportDriver, LoadTicket};
use glview_camera::{CameraState, ViewerCamera, WalkInput};
use glview_common::{MeshGeometry, MeshId, Transform};
use glview_input::{PointerButton, PointerInfo, PointerKind};
use glview_render::{RenderEngine, RenderView, Thumbnail};
use glview_scene::{HemisphericLight, Provenance, Scene, SceneMesh};
use std::sync::Arc;

/// Wheel lines to orbit zoom units, before `wheel_precision`.
const WHEEL_DELTA_PER_LINE: f32 = 3.0;

/// Everything that exists only while the viewer is initialized.
struct Session<E: RenderEngine> {
    engine: E,
    scene: Scene,
    camera: ViewerCamera,
    resize: ResizeSubscription,
}

/// A 3D model viewer bound to one canvas.
///
/// `initialize` builds the engine, scene and camera and starts loading the
/// configured model; `teardown` releases all of it. Imports run through the
/// [`ImportDriver`] and are applied by `frame`, on the caller's thread.
pub struct ModelViewer<E: RenderEngine> {
    config: ViewerConfig,
    imports: Box<dyn ImportDriver>,
    session: Option<Session<E>>,
    canvas: Option<E::Canvas>,
    hub: Option<ResizeHub>,
    camera_state: Option<CameraState>,
    load: LoadState,
    selections: Vec<SelectionEvent>,
    load_failures: Vec<LoadFailure>,
    walk_input: WalkInput,
    highlight: Option<MeshId>,
}

impl<E: RenderEngine> ModelViewer<E> {
    pub fn new(config: ViewerConfig, imports: Box<dyn ImportDriver>) -> Self {
        Self {
            config,
            imports,
            session: None,
            canvas: None,
            hub: None,
            camera_state: None,
            load: LoadState::default(),
            selections: Vec::new(),
            load_failures: Vec::new(),
            walk_input: WalkInput::default(),
            highlight: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn model_path(&self) -> &str {
        &self.config.model_path
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    /// Orbit parameters snapshotted at the last pick, not yet restored.
    pub fn camera_state(&self) -> Option<&CameraState> {
        self.camera_state.as_ref()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.session.as_ref().map(|s| &s.scene)
    }

    pub fn camera(&self) -> Option<&ViewerCamera> {
        self.session.as_ref().map(|s| &s.camera)
    }

    pub fn camera_mut(&mut self) -> Option<&mut ViewerCamera> {
        self.session.as_mut().map(|s| &mut s.camera)
    }

    pub fn engine(&self) -> Option<&E> {
        self.session.as_ref().map(|s| &s.engine)
    }

    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.session.as_mut().map(|s| &mut s.engine)
    }

    /// Mesh shown with the selection highlight.
    pub fn highlight(&self) -> Option<MeshId> {
        self.highlight
    }

    pub fn imports_in_flight(&self) -> usize {
        self.imports.in_flight()
    }

    /// Build engine, scene and camera on `canvas` and start loading the
    /// configured model. A missing canvas aborts quietly. An initialized
    /// viewer is rebuilt.
    pub fn initialize(
        &mut self,
        canvas: Option<E::Canvas>,
        window: &ResizeHub,
    ) -> Result<(), ViewerError> {
        let Some(canvas) = canvas else {
            tracing::debug!("no canvas, initialization skipped");
            return Ok(());
        };
        if self.session.is_some() {
            self.teardown_session();
        }

        let mut camera = self.config.camera.build()?;
        let engine = E::create(canvas.clone(), &self.config.engine_options())?;
        // The snapshot survives a failed build and is only consumed once an
        // engine exists.
        if let ViewerCamera::Orbit(orbit) = &mut camera {
            if let Some(state) = self.camera_state.take() {
                orbit.restore(&state);
                tracing::debug!(?state, "orbit camera restored");
            }
        }

        let mut scene = Scene::new(self.config.scene.clone());
        let mut light = HemisphericLight::new("light", Vec3::Y);
        light.intensity = 0.7;
        scene.add_light(light);

        let mode = camera.mode();
        self.session = Some(Session {
            engine,
            scene,
            camera,
            resize: window.subscribe(),
        });
        self.canvas = Some(canvas);
        self.hub = Some(window.clone());
        tracing::info!(%mode, "viewer initialized");

        let path = self.config.model_path.clone();
        self.load_model(&path);
        Ok(())
    }

    /// Release the engine, the resize subscription and all viewer state.
    /// Safe to call at any time, any number of times.
    pub fn teardown(&mut self) {
        self.teardown_session();
        self.camera_state = None;
        self.selections.clear();
        self.load_failures.clear();
        self.walk_input = WalkInput::default();
        self.canvas = None;
        self.hub = None;
    }

    /// Tear down and initialize again on the same canvas, keeping the
    /// orbit camera snapshot.
    pub fn rebuild(&mut self) -> Result<(), ViewerError> {
        let (Some(canvas), Some(hub)) = (self.canvas.clone(), self.hub.clone()) else {
            tracing::debug!("rebuild skipped: never initialized");
            return Ok(());
        };
        self.teardown_session();
        self.initialize(Some(canvas), &hub)
    }

    fn teardown_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.engine.dispose();
            tracing::info!("viewer torn down");
        }
        self.load.reset();
        self.highlight = None;
    }

    /// Record a new model path and load it when a scene exists.
    pub fn set_model_path(&mut self, path: impl Into<String>) -> Option<LoadTicket> {
        self.config.model_path = path.into();
        if self.session.is_none() {
            return None;
        }
        let path = self.config.model_path.clone();
        self.load_model(&path)
    }

    /// Replace the loaded model with `path`, unless it is already loaded.
    ///
    /// Meshes from earlier loads are disposed immediately; the new meshes
    /// arrive in a later `frame`. Returns the ticket of the started import.
    pub fn load_model(&mut self, path: &str) -> Option<LoadTicket> {
        if self.load.guards(path) {
            tracing::debug!(path, "model already loaded");
            return None;
        }
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(path, "load skipped: not initialized");
            return None;
        };

        let disposed = session.scene.dispose_assets();
        if self.highlight.is_some_and(|h| disposed.contains(&h)) {
            self.highlight = None;
        }
        let ticket = self.load.begin(path);
        tracing::info!(
            path,
            generation = ticket.generation,
            disposed = disposed.len(),
            "loading model"
        );
        self.imports.start(ticket.clone());
        Some(ticket)
    }

    /// Add a mesh that reloads never dispose, such as a ground plane.
    pub fn add_environment_mesh(
        &mut self,
        name: &str,
        geometry: MeshGeometry,
        transform: Transform,
    ) -> Option<MeshId> {
        let session = self.session.as_mut()?;
        let mut mesh = SceneMesh::new(name, Provenance::Environment, Arc::new(geometry))
            .with_transform(transform);
        mesh.check_collisions = true;
        Some(session.scene.add_mesh(mesh))
    }

    /// One frame: apply finished imports, pending resizes and camera motion,
    /// then draw.
    pub fn frame(&mut self) -> Result<(), ViewerError> {
        let _span = tracing::debug_span!("frame").entered();
        for done in self.imports.poll() {
            self.apply_import(done);
        }

        let walk_input = self.walk_input;
        let highlight = self.highlight;
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if let Some((width, height)) = session.resize.take() {
            session.engine.resize(width, height);
        }
        if let ViewerCamera::Walk(walk) = &mut session.camera {
            walk.walk(walk_input);
        }
        // Walk cameras are clamped to their bounds here, before drawing.
        session.camera.update();

        let view = render_view(&session.camera, session.engine.size(), highlight);
        session.engine.draw(&session.scene, &view)?;
        Ok(())
    }

    fn apply_import(&mut self, done: ImportCompletion) {
        let ImportCompletion { ticket, result } = done;
        if !self.load.is_current(&ticket) {
            tracing::debug!(
                path = %ticket.path,
                generation = ticket.generation,
                current = self.load.generation(),
                ok = result.is_ok(),
                "stale import discarded"
            );
            return;
        }
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(path = %ticket.path, "import finished after teardown");
            return;
        };

        match result {
            Ok(model) => {
                let walk = matches!(session.camera, ViewerCamera::Walk(_));
                let ids = loader::add_model(&mut session.scene, model, ticket.generation, walk);
                if let ViewerCamera::Walk(camera) = &mut session.camera {
                    camera.recenter(&session.scene.world_extents());
                    camera.enforce_bounds();
                }
                tracing::info!(path = %ticket.path, meshes = ids.len(), "model loaded");
            }
            Err(error) => {
                tracing::error!(path = %ticket.path, "error loading model: {error}");
                self.load.reset();
                self.load_failures.push(LoadFailure {
                    path: ticket.path,
                    generation: ticket.generation,
                    error,
                });
            }
        }
    }

    /// Directional input for the walk camera, applied every frame until
    /// replaced.
    pub fn set_walk_input(&mut self, input: WalkInput) {
        self.walk_input = input;
    }

    /// Drive the camera and, for clicks that hit a mesh, emit a selection.
    pub fn handle_pointer(&mut self, info: PointerInfo) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match (&mut session.camera, info.kind) {
            (ViewerCamera::Orbit(orbit), PointerKind::Move) => match info.button {
                Some(PointerButton::Primary) => orbit.rotate(info.delta.x, info.delta.y),
                Some(PointerButton::Secondary | PointerButton::Middle) => {
                    orbit.pan(info.delta.x, info.delta.y)
                }
                None => {}
            },
            (ViewerCamera::Orbit(orbit), PointerKind::Wheel) => {
                orbit.zoom(info.wheel * WHEEL_DELTA_PER_LINE)
            }
            (ViewerCamera::Walk(walk), PointerKind::Move) if info.button.is_some() => {
                walk.look(info.delta.x, info.delta.y)
            }
            _ => {}
        }

        if !info.is_click() {
            return;
        }

        let (width, height) = session
            .resize
            .size()
            .unwrap_or_else(|| session.engine.size());
        let view = render_view(&session.camera, (width, height), None);
        let ray = view.ray_from_screen(
            info.position.x,
            info.position.y,
            width as f32,
            height as f32,
        );
        let Some(hit) = session.scene.pick(&ray) else {
            return;
        };
        let Some(mesh) = session.scene.get(hit.mesh) else {
            return;
        };

        let pointer = match &session.camera {
            ViewerCamera::Orbit(orbit) => {
                self.camera_state = Some(orbit.snapshot());
                None
            }
            ViewerCamera::Walk(_) => Some(info),
        };
        tracing::debug!(mesh = %mesh.name, id = %hit.mesh, "mesh selected");
        self.selections.push(SelectionEvent {
            mesh_name: mesh.name.clone(),
            position: mesh.transform.position.to_array(),
            mesh: Some(hit.mesh),
            pointer,
        });
        self.highlight = Some(hit.mesh);
    }

    pub fn drain_selections(&mut self) -> Vec<SelectionEvent> {
        std::mem::take(&mut self.selections)
    }

    pub fn drain_load_failures(&mut self) -> Vec<LoadFailure> {
        std::mem::take(&mut self.load_failures)
    }

    /// Render `mesh` alone into a square RGBA thumbnail.
    pub fn capture_thumbnail(&mut self, mesh: MeshId) -> Result<Thumbnail, ViewerError> {
        let session = self.session.as_mut().ok_or(ViewerError::NotInitialized)?;
        thumbnail::capture_mesh(&mut session.engine, &mut session.scene, mesh)
    }
}

impl<E: RenderEngine> Drop for ModelViewer<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn render_view(camera: &ViewerCamera, size: (u32, u32), highlight: Option<MeshId>) -> RenderView {
    let (near, far) = camera.clip();
    RenderView {
        eye: camera.eye(),
        target: camera.target(),
        up: Vec3::Y,
        fov: camera.fov(),
        aspect: size.0.max(1) as f32 / size.1.max(1) as f32,
        near,
        far,
        highlight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use glview_assets::{AssetError, ImportedMesh, ImportedModel, ManualImports};
    use glview_camera::{CameraBounds, CameraConfig, CameraMode, WalkConfig};
    use glview_common::Material;
    use glview_input::PointerTracker;
    use glview_render::{HeadlessCanvas, HeadlessEngine, THUMBNAIL_SIZE};
    use glview_scene::SceneEvent;

    const WIDTH: u32 = 800;
    const HEIGHT: u32 = 600;

    struct Harness {
        viewer: ModelViewer<HeadlessEngine>,
        imports: ManualImports,
        hub: ResizeHub,
    }

    impl Harness {
        fn new(config: ViewerConfig) -> Self {
            let imports = ManualImports::new();
            let viewer = ModelViewer::new(config, Box::new(imports.clone()));
            Self {
                viewer,
                imports,
                hub: ResizeHub::new(WIDTH, HEIGHT),
            }
        }

        fn initialized(config: ViewerConfig) -> Self {
            let mut h = Self::new(config);
            h.viewer
                .initialize(Some(HeadlessCanvas::new(WIDTH, HEIGHT)), &h.hub)
                .unwrap();
            h
        }

        fn walk(bounds: Option<CameraBounds>) -> Self {
            Self::initialized(ViewerConfig {
                camera: CameraConfig::Walk(WalkConfig {
                    bounds,
                    ..WalkConfig::default()
                }),
                ..ViewerConfig::default()
            })
        }

        /// Resolve the newest pending import and run a frame.
        fn finish_latest(&mut self, result: Result<ImportedModel, AssetError>) {
            let generation = self.viewer.load_state().generation();
            assert!(self.imports.resolve(generation, result));
            self.viewer.frame().unwrap();
        }

        fn scene(&self) -> &Scene {
            self.viewer.scene().unwrap()
        }

        fn asset_names(&self) -> Vec<String> {
            let mut names: Vec<String> = self
                .scene()
                .asset_meshes()
                .map(|(_, m)| m.name.clone())
                .collect();
            names.sort();
            names
        }

        fn disposed_count(&self) -> usize {
            self.scene()
                .events()
                .iter()
                .filter(|e| matches!(e, SceneEvent::MeshDisposed { .. }))
                .count()
        }

        /// Press and release in place at a window position.
        fn click(&mut self, x: f32, y: f32) {
            let mut tracker = PointerTracker::default();
            self.viewer.handle_pointer(tracker.moved(Vec2::new(x, y)));
            self.viewer
                .handle_pointer(tracker.pressed(PointerButton::Primary));
            self.viewer
                .handle_pointer(tracker.released(PointerButton::Primary));
        }

        fn click_center(&mut self) {
            self.click(WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0);
        }
    }

    fn model(path: &str, names: &[&str]) -> ImportedModel {
        ImportedModel {
            source: path.into(),
            meshes: names
                .iter()
                .enumerate()
                .map(|(i, name)| ImportedMesh {
                    name: (*name).into(),
                    geometry: MeshGeometry::cube(1.0),
                    transform: Transform::from_position(Vec3::new(i as f32 * 3.0, 0.0, 0.0)),
                    material: None,
                })
                .collect(),
        }
    }

    fn failure() -> Result<ImportedModel, AssetError> {
        Err(AssetError::EmptyModel("broken.glb".into()))
    }

    #[test]
    fn initialize_builds_scene_and_starts_load() {
        let h = Harness::initialized(ViewerConfig::default());
        assert!(h.viewer.is_initialized());
        let scene = h.scene();
        assert!(scene.settings().collisions_enabled);
        assert_eq!(scene.settings().gravity, Vec3::new(0.0, -9.81, 0.0));
        assert_eq!(scene.lights().len(), 1);
        assert_eq!(scene.lights()[0].name, "light");
        assert_eq!(scene.lights()[0].direction, Vec3::Y);
        assert_eq!(scene.lights()[0].intensity, 0.7);
        assert_eq!(h.viewer.camera().unwrap().mode(), CameraMode::Orbit);

        let pending = h.imports.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].path, "assets/Box.glb");
        assert!(h.viewer.load_state().is_loaded());
    }

    #[test]
    fn missing_canvas_aborts_quietly() {
        let mut h = Harness::new(ViewerConfig::default());
        h.viewer.initialize(None, &h.hub).unwrap();
        assert!(!h.viewer.is_initialized());
        assert!(h.imports.pending().is_empty());
        assert_eq!(h.hub.subscriber_count(), 0);
        h.viewer.frame().unwrap();
        assert!(h.viewer.load_model("a.glb").is_none());
    }

    #[test]
    fn invalid_camera_config_fails_initialize() {
        let config = ViewerConfig {
            camera: CameraConfig::Walk(WalkConfig {
                speed: Some(-1.0),
                ..WalkConfig::default()
            }),
            ..ViewerConfig::default()
        };
        let mut h = Harness::new(config);
        let err = h
            .viewer
            .initialize(Some(HeadlessCanvas::new(WIDTH, HEIGHT)), &h.hub)
            .unwrap_err();
        assert!(matches!(err, ViewerError::Camera(_)));
        assert!(!h.viewer.is_initialized());
    }

    #[test]
    fn same_path_loads_once() {
        let mut h = Harness::initialized(ViewerConfig::default());
        assert!(h.viewer.load_model("assets/Box.glb").is_none());
        assert_eq!(h.imports.pending().len(), 1);

        h.finish_latest(Ok(model("assets/Box.glb", &["Box"])));
        assert!(h.viewer.load_model("assets/Box.glb").is_none());
        assert!(h.viewer.set_model_path("assets/Box.glb").is_none());
        h.viewer.frame().unwrap();

        assert_eq!(h.asset_names(), vec!["Box"]);
        assert_eq!(h.disposed_count(), 0);
        assert!(h.imports.pending().is_empty());
    }

    #[test]
    fn failed_load_rolls_back_and_retries() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.finish_latest(failure());

        let state = h.viewer.load_state();
        assert!(!state.is_loaded());
        assert_eq!(state.last_loaded_path(), None);
        let failures = h.viewer.drain_load_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "assets/Box.glb");
        assert!(h.viewer.drain_load_failures().is_empty());

        let retry = h.viewer.load_model("assets/Box.glb").unwrap();
        assert_eq!(retry.generation, 2);
        h.finish_latest(Ok(model("assets/Box.glb", &["Box"])));
        assert_eq!(h.asset_names(), vec!["Box"]);
        assert!(h.viewer.load_state().is_loaded());
    }

    #[test]
    fn loaded_meshes_collide_and_receive_shadows() {
        let mut h = Harness::initialized(ViewerConfig {
            model_path: "/assets/Box.glb".into(),
            ..ViewerConfig::default()
        });
        let probe = h
            .viewer
            .add_environment_mesh("light_probe", MeshGeometry::cube(0.2), Transform::default())
            .unwrap();
        h.finish_latest(Ok(model("/assets/Box.glb", &["Box", "Box.001"])));

        for (_, mesh) in h.scene().asset_meshes() {
            assert!(mesh.check_collisions);
            assert!(mesh.receive_shadows);
            assert!(mesh.material.is_none());
        }
        assert_eq!(h.scene().asset_meshes().count(), 2);

        h.viewer.set_model_path("/assets/Other.glb").unwrap();
        assert!(h.scene().get(probe).is_some());
        assert_eq!(h.scene().asset_meshes().count(), 0);
        assert_eq!(h.disposed_count(), 2);
    }

    #[test]
    fn asset_meshes_named_light_are_disposed_on_reload() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.finish_latest(Ok(model("assets/Box.glb", &["lamp_light", "Box"])));
        assert_eq!(h.asset_names(), vec!["Box", "lamp_light"]);

        h.viewer.load_model("assets/Room.glb").unwrap();
        assert!(h.scene().find_by_name("lamp_light").is_none());
        assert_eq!(h.scene().mesh_count(), 0);
        assert_eq!(h.scene().lights().len(), 1);
    }

    #[test]
    fn latest_request_wins() {
        let mut h = Harness::initialized(ViewerConfig::default());
        let first = h.imports.pending()[0].clone();
        let second = h.viewer.load_model("assets/B.glb").unwrap();
        assert!(second.generation > first.generation);

        // The newer load finishes first, then the older one.
        assert!(h.imports.resolve(second.generation, Ok(model("assets/B.glb", &["b"]))));
        assert!(h.imports.resolve(first.generation, Ok(model("assets/Box.glb", &["a"]))));
        h.viewer.frame().unwrap();
        assert_eq!(h.asset_names(), vec!["b"]);
        assert_eq!(h.viewer.load_state().last_loaded_path(), Some("assets/B.glb"));
    }

    #[test]
    fn stale_results_neither_add_nor_roll_back() {
        let mut h = Harness::initialized(ViewerConfig::default());
        let first = h.imports.pending()[0].clone();
        h.viewer.load_model("assets/B.glb").unwrap();

        h.imports.resolve(first.generation, failure());
        h.viewer.frame().unwrap();
        assert!(h.viewer.load_state().is_loaded());
        assert!(h.viewer.drain_load_failures().is_empty());

        assert!(!h.imports.resolve(first.generation, Ok(model("x", &["a"]))));
        h.finish_latest(Ok(model("assets/B.glb", &["b"])));
        assert_eq!(h.asset_names(), vec!["b"]);
    }

    #[test]
    fn walk_camera_stays_inside_bounds() {
        let bounds = CameraBounds::new(-4.0, 4.0, -3.0, 3.0).unwrap();
        let mut h = Harness::walk(Some(bounds));
        let check = |viewer: &ModelViewer<HeadlessEngine>| {
            let walk = viewer.camera().unwrap().as_walk().unwrap();
            let p = walk.position;
            assert!((-3.5..=3.5).contains(&p.x), "x out of bounds: {p}");
            assert!((-2.5..=2.5).contains(&p.z), "z out of bounds: {p}");
            assert_eq!(p.y, walk.eye_height);
        };
        check(&h.viewer);

        for input in [
            WalkInput { forward: 1.0, right: 0.0 },
            WalkInput { forward: 0.0, right: 1.0 },
            WalkInput { forward: -1.0, right: -1.0 },
        ] {
            h.viewer.set_walk_input(input);
            for _ in 0..200 {
                h.viewer.frame().unwrap();
                check(&h.viewer);
            }
        }

        // Walking into a wall for long enough ends up exactly on it.
        h.viewer.set_walk_input(WalkInput { forward: 1.0, right: 0.0 });
        for _ in 0..200 {
            h.viewer.frame().unwrap();
        }
        let walk = h.viewer.camera().unwrap().as_walk().unwrap();
        assert_eq!(walk.position.z, 2.5);
    }

    #[test]
    fn walk_bounds_use_the_ellipsoid_per_axis() {
        let mut h = Harness::initialized(ViewerConfig {
            camera: CameraConfig::Walk(WalkConfig {
                ellipsoid: Some(Vec3::new(1.0, 1.0, 0.25)),
                bounds: Some(CameraBounds::new(-4.0, 4.0, -3.0, 3.0).unwrap()),
                ..WalkConfig::default()
            }),
            ..ViewerConfig::default()
        });
        for input in [
            WalkInput { forward: 1.0, right: 0.0 },
            WalkInput { forward: 0.0, right: 1.0 },
        ] {
            h.viewer.set_walk_input(input);
            for _ in 0..400 {
                h.viewer.frame().unwrap();
                let p = h.viewer.camera().unwrap().as_walk().unwrap().position;
                assert!((-3.0..=3.0).contains(&p.x), "x out of bounds: {p}");
                assert!((-2.75..=2.75).contains(&p.z), "z out of bounds: {p}");
            }
        }
        let p = h.viewer.camera().unwrap().as_walk().unwrap().position;
        assert_eq!(p.x.abs(), 3.0);
        assert_eq!(p.z, 2.75);
    }

    #[test]
    fn walk_camera_without_bounds_keeps_eye_height() {
        let mut h = Harness::walk(None);
        if let Some(ViewerCamera::Walk(walk)) = h.viewer.camera_mut() {
            walk.position.y = 12.0;
        }
        h.viewer.set_walk_input(WalkInput { forward: 1.0, right: 0.0 });
        h.viewer.frame().unwrap();
        let walk = h.viewer.camera().unwrap().as_walk().unwrap();
        assert_eq!(walk.position.y, 1.6);
        assert!(walk.position.z > -5.0);
    }

    #[test]
    fn walk_load_recenters_and_uses_debug_material() {
        let mut h = Harness::walk(None);
        h.finish_latest(Ok(model("assets/Box.glb", &["a", "b", "c"])));
        let walk = h.viewer.camera().unwrap().as_walk().unwrap();
        // Cubes at x = 0, 3, 6.
        assert!((walk.position - Vec3::new(3.0, 1.6, 0.0)).length() < 1e-5);
        assert!(walk.forward().abs_diff_eq(Vec3::Z, 1e-5));
        for (_, mesh) in h.scene().asset_meshes() {
            assert_eq!(mesh.material, Some(Material::debug()));
        }
    }

    #[test]
    fn clicks_on_meshes_select() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.finish_latest(Ok(model("assets/Box.glb", &["Box"])));
        h.click_center();

        let events = h.viewer.drain_selections();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].mesh_name, "Box");
        assert_eq!(events[0].position, [0.0, 0.0, 0.0]);
        assert!(events[0].pointer.is_none());
        assert_eq!(events[0].mesh, h.viewer.highlight());
        assert!(h.viewer.camera_state().is_some());
        assert!(h.viewer.drain_selections().is_empty());
    }

    #[test]
    fn only_clean_clicks_on_meshes_select() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.finish_latest(Ok(model("assets/Box.glb", &["Box"])));
        let center = Vec2::new(WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0);

        // Pointer-down on the mesh.
        let mut tracker = PointerTracker::default();
        h.viewer.handle_pointer(tracker.moved(center));
        h.viewer
            .handle_pointer(tracker.pressed(PointerButton::Primary));
        assert!(h.viewer.drain_selections().is_empty());

        // Drag that ends on the mesh.
        h.viewer.handle_pointer(tracker.moved(center + Vec2::new(40.0, 0.0)));
        h.viewer.handle_pointer(tracker.moved(center));
        h.viewer
            .handle_pointer(tracker.released(PointerButton::Primary));
        assert!(h.viewer.drain_selections().is_empty());

        // Click on empty space.
        h.click(5.0, 5.0);
        assert!(h.viewer.drain_selections().is_empty());
        assert!(h.viewer.camera_state().is_none());

        // Wheel over the mesh.
        h.viewer
            .handle_pointer(PointerInfo::new(PointerKind::Wheel, center));
        assert!(h.viewer.drain_selections().is_empty());
    }

    #[test]
    fn walk_selection_carries_pointer_without_snapshot() {
        let mut h = Harness::walk(None);
        h.finish_latest(Ok(model("assets/Box.glb", &["Box"])));
        // Recentered on the cube; back off so it is in front of the eye.
        if let Some(ViewerCamera::Walk(walk)) = h.viewer.camera_mut() {
            walk.position = Vec3::new(0.0, 0.0, -5.0);
            walk.set_target(Vec3::ZERO);
        }
        h.click_center();

        let events = h.viewer.drain_selections();
        assert_eq!(events.len(), 1);
        let pointer = events[0].pointer.unwrap();
        assert_eq!(pointer.kind, PointerKind::Up);
        assert!(h.viewer.camera_state().is_none());
    }

    #[test]
    fn rebuild_restores_picked_orbit_view() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.finish_latest(Ok(model("assets/Box.glb", &["Box"])));

        // Orbit a little, let inertia settle, then pick.
        let mut tracker = PointerTracker::default();
        h.viewer.handle_pointer(tracker.moved(Vec2::new(100.0, 100.0)));
        h.viewer
            .handle_pointer(tracker.pressed(PointerButton::Primary));
        h.viewer.handle_pointer(tracker.moved(Vec2::new(160.0, 130.0)));
        h.viewer
            .handle_pointer(tracker.released(PointerButton::Primary));
        h.viewer.handle_pointer(PointerInfo {
            wheel: 2.0,
            ..PointerInfo::new(PointerKind::Wheel, Vec2::ZERO)
        });
        for _ in 0..300 {
            h.viewer.frame().unwrap();
        }
        h.click_center();
        let snapshot = *h.viewer.camera_state().unwrap();
        assert_ne!(snapshot.alpha, std::f32::consts::FRAC_PI_2);

        // Move away again before rebuilding.
        if let Some(ViewerCamera::Orbit(orbit)) = h.viewer.camera_mut() {
            orbit.alpha += 1.0;
            orbit.radius = 30.0;
        }
        h.viewer.rebuild().unwrap();

        let orbit = h.viewer.camera().unwrap().as_orbit().unwrap();
        assert_eq!(orbit.snapshot(), snapshot);
        assert!(h.viewer.camera_state().is_none());
        // The rebuilt scene loads the model again.
        assert_eq!(h.scene().mesh_count(), 0);
        assert_eq!(h.imports.pending().len(), 1);
        assert_eq!(h.hub.subscriber_count(), 1);
    }

    #[test]
    fn failed_rebuild_keeps_picked_orbit_view() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.finish_latest(Ok(model("assets/Box.glb", &["Box"])));
        if let Some(ViewerCamera::Orbit(orbit)) = h.viewer.camera_mut() {
            orbit.alpha = 1.0;
            orbit.radius = 7.0;
        }
        h.click_center();
        let snapshot = *h.viewer.camera_state().unwrap();

        let broken = HeadlessCanvas {
            scale_factor: 0.0,
            ..HeadlessCanvas::new(WIDTH, HEIGHT)
        };
        assert!(matches!(
            h.viewer.initialize(Some(broken), &h.hub),
            Err(ViewerError::Render(_))
        ));
        assert!(h.viewer.camera().is_none());
        assert_eq!(h.viewer.camera_state(), Some(&snapshot));

        // The stored canvas is still the working one.
        h.viewer.rebuild().unwrap();
        let orbit = h.viewer.camera().unwrap().as_orbit().unwrap();
        assert_eq!(orbit.snapshot(), snapshot);
        assert!(h.viewer.camera_state().is_none());
    }

    #[test]
    fn teardown_releases_everything() {
        let mut h = Harness::new(ViewerConfig::default());
        h.viewer.teardown();
        h.viewer
            .initialize(Some(HeadlessCanvas::new(WIDTH, HEIGHT)), &h.hub)
            .unwrap();
        h.finish_latest(Ok(model("assets/Box.glb", &["Box"])));
        h.click_center();
        assert_eq!(h.hub.subscriber_count(), 1);

        h.viewer.teardown();
        assert_eq!(h.hub.subscriber_count(), 0);
        assert!(!h.viewer.is_initialized());
        assert!(h.viewer.camera_state().is_none());
        assert!(h.viewer.drain_selections().is_empty());
        assert!(!h.viewer.load_state().is_loaded());
        assert_eq!(h.viewer.load_state().last_loaded_path(), None);
        h.viewer.teardown();
        assert!(h.viewer.rebuild().is_ok());
        assert!(!h.viewer.is_initialized());
    }

    #[test]
    fn drop_runs_teardown() {
        let h = Harness::initialized(ViewerConfig::default());
        let hub = h.hub.clone();
        assert_eq!(hub.subscriber_count(), 1);
        drop(h);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn reinitialize_replaces_session() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.viewer
            .initialize(Some(HeadlessCanvas::new(WIDTH, HEIGHT)), &h.hub)
            .unwrap();
        assert_eq!(h.hub.subscriber_count(), 1);
        // The first session's import is stale now.
        let pending = h.imports.pending();
        assert_eq!(pending.len(), 2);
        h.imports
            .resolve(pending[0].generation, Ok(model("assets/Box.glb", &["old"])));
        h.viewer.frame().unwrap();
        assert_eq!(h.scene().mesh_count(), 0);
    }

    #[test]
    fn import_finishing_after_teardown_is_ignored() {
        let mut h = Harness::initialized(ViewerConfig::default());
        let generation = h.viewer.load_state().generation();
        h.viewer.teardown();
        h.imports.resolve(generation, failure());
        h.viewer.frame().unwrap();
        assert!(h.viewer.drain_load_failures().is_empty());
    }

    #[test]
    fn model_path_change_before_init_is_used_at_init() {
        let mut h = Harness::new(ViewerConfig::default());
        assert!(h.viewer.set_model_path("assets/Later.glb").is_none());
        h.viewer
            .initialize(Some(HeadlessCanvas::new(WIDTH, HEIGHT)), &h.hub)
            .unwrap();
        assert_eq!(h.imports.pending()[0].path, "assets/Later.glb");
    }

    #[test]
    fn resize_notifications_reach_the_engine() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.hub.notify(1024, 512);
        assert_eq!(h.viewer.engine().unwrap().size(), (WIDTH, HEIGHT));
        h.viewer.frame().unwrap();
        assert_eq!(h.viewer.engine().unwrap().size(), (1024, 512));
        assert!(h.viewer.engine().unwrap().last_frame().contains("Camera:"));
    }

    #[test]
    fn thumbnail_isolates_mesh_and_restores_visibility() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.finish_latest(Ok(model("assets/Box.glb", &["a", "b", "c"])));
        let ids: Vec<MeshId> = h.scene().meshes().map(|(id, _)| id).collect();
        if let Some(session) = h.viewer.session.as_mut() {
            session.scene.get_mut(ids[2]).unwrap().visible = false;
        }

        let thumb = h.viewer.capture_thumbnail(ids[1]).unwrap();
        assert_eq!((thumb.width, thumb.height), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
        assert_eq!(thumb.rgba.len(), 256 * 256 * 4);
        assert_eq!(h.viewer.engine().unwrap().captures(), &[vec![ids[1]]]);

        let visible: Vec<bool> = h.scene().meshes().map(|(_, m)| m.visible).collect();
        assert_eq!(visible, vec![true, true, false]);
    }

    #[test]
    fn failed_thumbnail_still_restores_visibility() {
        let mut h = Harness::initialized(ViewerConfig::default());
        h.finish_latest(Ok(model("assets/Box.glb", &["a", "b"])));
        let ids: Vec<MeshId> = h.scene().meshes().map(|(id, _)| id).collect();
        h.viewer.engine_mut().unwrap().fail_captures(true);

        let err = h.viewer.capture_thumbnail(ids[0]).unwrap_err();
        assert!(matches!(err, ViewerError::Render(_)));
        assert!(h.scene().meshes().all(|(_, m)| m.visible));

        assert!(matches!(
            h.viewer.capture_thumbnail(MeshId(999)),
            Err(ViewerError::UnknownMesh(_))
        ));
        h.viewer.teardown();
        assert!(matches!(
            h.viewer.capture_thumbnail(ids[0]),
            Err(ViewerError::NotInitialized)
        ));
    }
}
