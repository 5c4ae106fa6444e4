//! Rendering adapter: renderer-agnostic engine interface.
//!
//! # Invariants
//! - Engines never mutate the scene; they read it with a view each frame.
//! - A disposed engine draws nothing and captures nothing.
//!
//! [`HeadlessEngine`] renders a text description of the scene and solid
//! colour captures, so everything above the engine is testable without a
//! GPU. The wgpu backend lives in `glview-render-wgpu`.

mod engine;
mod headless;
mod thumbnail;

pub use engine::{EngineOptions, PowerPreference, RenderEngine, RenderView};
pub use headless::{HeadlessCanvas, HeadlessEngine};
pub use thumbnail::{THUMBNAIL_SIZE, Thumbnail};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(String),
    #[error("no suitable graphics adapter")]
    NoAdapter,
    #[error("device request failed: {0}")]
    Device(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("engine already disposed")]
    Disposed,
}
