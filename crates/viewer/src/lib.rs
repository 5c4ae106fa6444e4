//! The model viewer component.
//!
//! [`ModelViewer`] owns a render engine, a scene and a camera for one
//! canvas. The host drives it from its event loop: `frame` once per
//! redraw, `handle_pointer` for pointer input, and the resize hub for
//! window size changes. Selections and load failures queue up until the
//! host drains them.
//!
//! # Invariants
//! - Loading the path that is already loaded does nothing.
//! - Only the completion of the most recently started load is applied.
//! - A failed current load leaves the viewer unloaded, so a retry of the
//!   same path imports again.
//! - Only meshes created by a load are disposed by the next load.
//! - After every frame in walk mode the eye sits at eye height inside the
//!   bounds, shrunk by the collision ellipsoid.
//! - A rebuild restores the orbit camera snapshotted at the last pick.

mod config;
mod loader;
mod resize;
mod selection;
mod thumbnail;
mod viewer;

pub use config::{ConfigError, EngineConfig, ViewerConfig};
pub use loader::{LoadFailure, LoadState};
pub use resize::{ResizeHub, ResizeSubscription};
pub use selection::SelectionEvent;
pub use viewer::ModelViewer;

use glview_common::MeshId;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("viewer is not initialized")]
    NotInitialized,
    #[error("no mesh {0} in the scene")]
    UnknownMesh(MeshId),
    #[error(transparent)]
    Render(#[from] glview_render::RenderError),
    #[error(transparent)]
    Camera(#[from] glview_camera::CameraError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
