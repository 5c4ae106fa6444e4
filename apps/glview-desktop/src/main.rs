use anyhow::{Context as _, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use glview_assets::{GltfImporter, ThreadedImports};
use glview_camera::{CameraConfig, WalkConfig};
use glview_common::{MeshGeometry, Transform};
use glview_input::{PointerButton, PointerInfo, PointerTracker, WalkKey, WalkKeys};
use glview_render_wgpu::{OverlayTarget, WgpuCanvas, WgpuEngine};
use glview_tools::SceneInspector;
use glview_viewer::{ModelViewer, ResizeHub, SelectionEvent, ViewerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "glview-desktop", about = "glTF model viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model to load, overriding the configuration
    #[arg(long)]
    model: Option<String>,

    /// Start with the walk camera
    #[arg(long)]
    walk: bool,

    /// Add a ground plane that survives model reloads
    #[arg(long)]
    ground: bool,
}

const WINDOW_WIDTH: u32 = 1280;
/// Pixel scroll deltas per wheel line.
const PIXELS_PER_LINE: f32 = 40.0;
const THUMBNAIL_DISPLAY_SIZE: f32 = 128.0;
const MAX_STATUS_LINES: usize = 8;

/// The last picked mesh, as shown in the side panel.
struct Selected {
    event: SelectionEvent,
    thumbnail: Option<egui::TextureHandle>,
}

/// Requests from the side panel that need the whole app.
enum UiAction {
    Load(String),
    Rebuild,
}

/// Application state.
struct AppState {
    viewer: ModelViewer<WgpuEngine>,
    hub: Option<ResizeHub>,
    pointer: PointerTracker,
    keys: WalkKeys,
    ground: bool,
    selected: Option<Selected>,
    status: Vec<String>,
    path_input: String,
    show_panel: bool,
}

impl AppState {
    fn new(config: ViewerConfig, ground: bool) -> Self {
        let path_input = config.model_path.clone();
        let imports = ThreadedImports::new(Arc::new(GltfImporter));
        Self {
            viewer: ModelViewer::new(config, Box::new(imports)),
            hub: None,
            pointer: PointerTracker::default(),
            keys: WalkKeys::default(),
            ground,
            selected: None,
            status: Vec::new(),
            path_input,
            show_panel: true,
        }
    }

    fn add_ground(&mut self) {
        if !self.ground {
            return;
        }
        if let Some(id) =
            self.viewer
                .add_environment_mesh("ground", MeshGeometry::ground(50.0), Transform::default())
        {
            tracing::debug!(%id, "ground added");
        }
    }

    fn rebuild(&mut self) {
        self.selected = None;
        if let Err(e) = self.viewer.rebuild() {
            tracing::error!("rebuild failed: {e}");
            self.push_status(format!("rebuild failed: {e}"));
            return;
        }
        self.add_ground();
    }

    fn push_status(&mut self, line: String) {
        self.status.push(line);
        if self.status.len() > MAX_STATUS_LINES {
            self.status.remove(0);
        }
    }

    fn collect_failures(&mut self) {
        for failure in self.viewer.drain_load_failures() {
            self.push_status(format!("failed to load {}: {}", failure.path, failure.error));
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) -> Option<UiAction> {
        let walk_key = match key {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(WalkKey::Forward),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(WalkKey::Backward),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(WalkKey::Left),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(WalkKey::Right),
            _ => None,
        };
        if let Some(walk_key) = walk_key {
            self.keys.set(walk_key, pressed);
            self.viewer.set_walk_input(self.keys.input());
            return None;
        }

        if !pressed {
            return None;
        }
        match key {
            KeyCode::F1 => self.show_panel = !self.show_panel,
            KeyCode::KeyR => return Some(UiAction::Rebuild),
            KeyCode::Escape => self.selected = None,
            _ => {}
        }
        None
    }

    fn release_keys(&mut self) {
        self.keys.release_all();
        self.viewer.set_walk_input(self.keys.input());
    }

    fn handle_pointer(&mut self, info: PointerInfo, ctx: Option<&EguiContext>) {
        self.viewer.handle_pointer(info);
        for event in self.viewer.drain_selections() {
            self.select(event, ctx);
        }
    }

    fn select(&mut self, event: SelectionEvent, ctx: Option<&EguiContext>) {
        tracing::info!(mesh = %event.mesh_name, position = ?event.position, "mesh selected");
        let thumbnail = match (event.mesh, ctx) {
            (Some(mesh), Some(ctx)) => match self.viewer.capture_thumbnail(mesh) {
                Ok(thumb) => {
                    let image = egui::ColorImage::from_rgba_unmultiplied(
                        [thumb.width as usize, thumb.height as usize],
                        &thumb.rgba,
                    );
                    Some(ctx.load_texture("selection-thumbnail", image, egui::TextureOptions::LINEAR))
                }
                Err(e) => {
                    self.push_status(format!("thumbnail failed: {e}"));
                    None
                }
            },
            _ => None,
        };
        self.selected = Some(Selected { event, thumbnail });
    }

    fn draw_ui(&mut self, ctx: &EguiContext) -> Option<UiAction> {
        if !self.show_panel {
            return None;
        }
        let mut action = None;

        egui::SidePanel::left("inspector")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("glview");
                ui.separator();

                let load = self.viewer.load_state();
                ui.label(format!(
                    "Model: {}{}",
                    self.viewer.model_path(),
                    if load.is_loaded() { "" } else { " (not loaded)" }
                ));
                if let Some(camera) = self.viewer.camera() {
                    let eye = camera.eye();
                    ui.label(format!(
                        "Camera: {} at ({:.1}, {:.1}, {:.1})",
                        camera.mode(),
                        eye.x,
                        eye.y,
                        eye.z
                    ));
                }
                let in_flight = self.viewer.imports_in_flight();
                if in_flight > 0 {
                    ui.label(format!("Loading ({in_flight} in flight)..."));
                }
                if let Some(scene) = self.viewer.scene() {
                    let summary = SceneInspector::summary(scene);
                    ui.label(format!(
                        "Meshes: {} ({} from model)",
                        summary.mesh_count, summary.asset_meshes
                    ));
                    ui.label(format!("Triangles: {}", summary.triangles));
                }
                ui.separator();

                ui.heading("Model");
                ui.text_edit_singleline(&mut self.path_input);
                ui.horizontal(|ui| {
                    if ui.button("Load").clicked() {
                        action = Some(UiAction::Load(self.path_input.trim().to_owned()));
                    }
                    if ui.button("Rebuild (R)").clicked() {
                        action = Some(UiAction::Rebuild);
                    }
                });

                ui.separator();
                ui.heading("Selection");
                match &self.selected {
                    Some(selected) => {
                        let [x, y, z] = selected.event.position;
                        ui.label(&selected.event.mesh_name);
                        ui.label(format!("Position: ({x:.2}, {y:.2}, {z:.2})"));
                        if let Some(texture) = &selected.thumbnail {
                            ui.add(egui::Image::from_texture(egui::load::SizedTexture::new(
                                texture.id(),
                                egui::vec2(THUMBNAIL_DISPLAY_SIZE, THUMBNAIL_DISPLAY_SIZE),
                            )));
                        }
                    }
                    None => {
                        ui.label("Click a mesh to select it");
                    }
                }

                if !self.status.is_empty() {
                    ui.separator();
                    ui.heading("Status");
                    for line in &self.status {
                        ui.small(line);
                    }
                }

                ui.separator();
                ui.small("F1: Toggle Panel | LMB: Orbit/Select | RMB: Pan | WASD: Walk");
            });

        action
    }
}

/// egui state bound to one engine's device.
struct Overlay {
    ctx: EguiContext,
    winit: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Overlay {
    fn attach(window: &Window, engine: Option<&WgpuEngine>) -> Option<Self> {
        let engine = engine?;
        let device = engine.device()?;
        let format = engine.surface_format()?;
        let ctx = EguiContext::default();
        let winit = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
        Some(Self {
            ctx,
            winit,
            renderer,
        })
    }

    fn paint(
        &mut self,
        target: OverlayTarget<'_>,
        jobs: &[egui::ClippedPrimitive],
        textures: &egui::TexturesDelta,
        pixels_per_point: f32,
    ) {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [target.size.0, target.size.1],
            pixels_per_point,
        };
        for (id, delta) in &textures.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, delta);
        }
        let mut encoder = target
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        let extra = self.renderer.update_buffers(
            target.device,
            target.queue,
            &mut encoder,
            jobs,
            &screen,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, jobs, &screen);
        }
        target
            .queue
            .submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        for id in &textures.free {
            self.renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    overlay: Option<Overlay>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            window: None,
            overlay: None,
        }
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Load(path) if path.is_empty() => {}
            UiAction::Load(path) => {
                if self.state.viewer.set_model_path(path.clone()).is_none() {
                    tracing::debug!(%path, "load request ignored");
                }
            }
            UiAction::Rebuild => {
                // The overlay belongs to the old device.
                self.overlay = None;
                self.state.rebuild();
            }
        }
    }

    fn pointer(&mut self, info: PointerInfo) {
        let ctx = self.overlay.as_ref().map(|o| o.ctx.clone());
        self.state.handle_pointer(info, ctx.as_ref());
    }

    fn redraw(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if let Err(e) = self.state.viewer.frame() {
            tracing::error!("frame failed: {e}");
        }
        self.state.collect_failures();

        if self.overlay.is_none() {
            self.overlay = Overlay::attach(&window, self.state.viewer.engine());
        }

        let mut action = None;
        let state = &mut self.state;
        match self.overlay.as_mut() {
            Some(overlay) => {
                let raw_input = overlay.winit.take_egui_input(&window);
                let output = overlay.ctx.run(raw_input, |ctx| {
                    action = state.draw_ui(ctx);
                });
                overlay
                    .winit
                    .handle_platform_output(&window, output.platform_output);
                let jobs = overlay
                    .ctx
                    .tessellate(output.shapes, output.pixels_per_point);
                if let Some(engine) = state.viewer.engine_mut() {
                    engine.present_with(|target| {
                        overlay.paint(target, &jobs, &output.textures_delta, output.pixels_per_point)
                    });
                }
            }
            None => {
                if let Some(engine) = state.viewer.engine_mut() {
                    engine.present();
                }
            }
        }

        if let Some(action) = action {
            self.apply(action);
        }
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let height = self.state.viewer.config().canvas_height.max(1);
        let attrs = Window::default_attributes()
            .with_title("glview")
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, height));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let hub = ResizeHub::new(width, height);
        let canvas = WgpuCanvas {
            window: window.clone(),
            width,
            height,
            scale_factor: window.scale_factor(),
        };
        if let Err(e) = self.state.viewer.initialize(Some(canvas), &hub) {
            tracing::error!("failed to initialize viewer: {e}");
            event_loop.exit();
            return;
        }
        self.state.hub = Some(hub);
        self.state.add_ground();
        self.overlay = Overlay::attach(&window, self.state.viewer.engine());
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if let Some(overlay) = &mut self.overlay {
            if overlay.winit.on_window_event(&window, &event).consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.state.viewer.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(hub) = &self.state.hub {
                    hub.notify(new_size.width.max(1), new_size.height.max(1));
                }
            }
            WindowEvent::Focused(false) => self.state.release_keys(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if let Some(action) = self
                    .state
                    .handle_key(key, key_state == ElementState::Pressed)
                {
                    self.apply(action);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let info = self
                    .state
                    .pointer
                    .moved(Vec2::new(position.x as f32, position.y as f32));
                self.pointer(info);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return,
                };
                let info = match button_state {
                    ElementState::Pressed => self.state.pointer.pressed(button),
                    ElementState::Released => self.state.pointer.released(button),
                };
                self.pointer(info);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                let info = self.state.pointer.wheel(lines);
                self.pointer(info);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading viewer config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if cli.walk && !matches!(config.camera, CameraConfig::Walk(_)) {
        config.camera = CameraConfig::Walk(WalkConfig::default());
    }
    tracing::info!(model = %config.model_path, "glview-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(config, cli.ground));
    event_loop.run_app(&mut app)?;

    Ok(())
}
