use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec2;
use glview_assets::{AssetImporter, GltfImporter, ImportedModel, ThreadedImports};
use glview_camera::{CameraConfig, OrbitConfig, WalkConfig, WalkInput};
use glview_input::{PointerButton, PointerTracker};
use glview_render::{HeadlessCanvas, HeadlessEngine};
use glview_scene::{Provenance, Scene, SceneMesh, SceneSettings};
use glview_tools::{MeshInfo, SceneInspector, SceneSummary};
use glview_viewer::{ModelViewer, ResizeHub, ViewerConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glview-cli", about = "CLI tool for glview")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Import a glTF/GLB file and list its meshes
    Inspect {
        path: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run the viewer headless on a model and print the final frame
    Simulate {
        path: String,
        /// Viewer configuration file (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Camera mode, overriding the configuration
        #[arg(long, value_enum)]
        mode: Option<Mode>,
        /// Frames to run after the model has loaded
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Walk forward every frame (walk mode)
        #[arg(long)]
        walk_forward: bool,
        /// Click the canvas center after loading and capture a thumbnail
        #[arg(long)]
        pick: bool,
        /// Seconds to wait for the import
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Orbit,
    Walk,
}

const CANVAS_WIDTH: u32 = 800;
const IMPORT_POLL: Duration = Duration::from_millis(5);

#[derive(Serialize)]
struct Inspection {
    source: PathBuf,
    summary: SceneSummary,
    meshes: Vec<MeshInfo>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("glview-cli v{}", env!("CARGO_PKG_VERSION"));
            let config = ViewerConfig::default();
            println!("default model: {}", config.model_path);
            println!("default canvas height: {}px", config.canvas_height);
            println!("importer: glTF 2.0 (.gltf, .glb)");
        }
        Commands::Inspect { path, json } => inspect(&path, json)?,
        Commands::Simulate {
            path,
            config,
            mode,
            frames,
            walk_forward,
            pick,
            timeout,
        } => {
            let mut config = match config {
                Some(file) => ViewerConfig::load(&file)
                    .with_context(|| format!("loading viewer config {}", file.display()))?,
                None => ViewerConfig::default(),
            };
            config.model_path = path;
            match mode {
                Some(Mode::Walk) if !matches!(config.camera, CameraConfig::Walk(_)) => {
                    config.camera = CameraConfig::Walk(WalkConfig::default());
                }
                Some(Mode::Orbit) if !matches!(config.camera, CameraConfig::Orbit(_)) => {
                    config.camera = CameraConfig::Orbit(OrbitConfig::default());
                }
                _ => {}
            }
            simulate(
                config,
                frames,
                walk_forward,
                pick,
                Duration::from_secs(timeout),
            )?;
        }
    }

    Ok(())
}

fn inspect(path: &Path, json: bool) -> anyhow::Result<()> {
    let model = GltfImporter
        .import(path)
        .with_context(|| format!("importing {}", path.display()))?;
    let source = model.source.clone();
    let scene = scene_from_model(model);

    let inspection = Inspection {
        source,
        summary: SceneInspector::summary(&scene),
        meshes: SceneInspector::list_meshes(&scene),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        println!("{}", inspection.source.display());
        println!("{}", inspection.summary);
        for mesh in &inspection.meshes {
            println!("  {mesh}");
        }
    }
    Ok(())
}

fn scene_from_model(model: ImportedModel) -> Scene {
    let mut scene = Scene::new(SceneSettings::default());
    for imported in model.meshes {
        let mut mesh = SceneMesh::new(
            imported.name,
            Provenance::Asset { generation: 1 },
            Arc::new(imported.geometry),
        )
        .with_transform(imported.transform);
        mesh.material = imported.material;
        scene.add_mesh(mesh);
    }
    scene
}

fn simulate(
    config: ViewerConfig,
    frames: u32,
    walk_forward: bool,
    pick: bool,
    timeout: Duration,
) -> anyhow::Result<()> {
    let height = config.canvas_height.max(1);
    let hub = ResizeHub::new(CANVAS_WIDTH, height);
    let imports = ThreadedImports::new(Arc::new(GltfImporter));
    let mut viewer: ModelViewer<HeadlessEngine> = ModelViewer::new(config, Box::new(imports));
    viewer.initialize(Some(HeadlessCanvas::new(CANVAS_WIDTH, height)), &hub)?;

    let started = Instant::now();
    let deadline = started + timeout;
    while viewer.imports_in_flight() > 0 {
        if Instant::now() >= deadline {
            bail!("import did not finish within {timeout:?}");
        }
        std::thread::sleep(IMPORT_POLL);
        viewer.frame()?;
    }
    tracing::info!(elapsed = ?started.elapsed(), "imports settled");
    if let Some(failure) = viewer.drain_load_failures().into_iter().next() {
        bail!("failed to load {}: {}", failure.path, failure.error);
    }

    if walk_forward {
        viewer.set_walk_input(WalkInput {
            forward: 1.0,
            right: 0.0,
        });
    }
    for _ in 0..frames {
        viewer.frame()?;
    }

    if pick {
        let center = Vec2::new(CANVAS_WIDTH as f32 / 2.0, height as f32 / 2.0);
        let mut tracker = PointerTracker::default();
        viewer.handle_pointer(tracker.moved(center));
        viewer.handle_pointer(tracker.pressed(PointerButton::Primary));
        viewer.handle_pointer(tracker.released(PointerButton::Primary));
        viewer.frame()?;
    }

    if let Some(engine) = viewer.engine() {
        print!("{}", engine.last_frame());
    }
    if let Some(scene) = viewer.scene() {
        println!("{}", SceneInspector::summary(scene));
    }

    for selection in viewer.drain_selections() {
        let [x, y, z] = selection.position;
        println!(
            "selected {} at ({x:.2}, {y:.2}, {z:.2})",
            selection.mesh_name
        );
        if let Some(mesh) = selection.mesh {
            let thumbnail = viewer.capture_thumbnail(mesh)?;
            let center = thumbnail.pixel(thumbnail.width / 2, thumbnail.height / 2);
            println!(
                "thumbnail {}x{} center={:?}",
                thumbnail.width, thumbnail.height, center
            );
        }
    }

    viewer.teardown();
    Ok(())
}
