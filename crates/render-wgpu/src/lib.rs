//! wgpu render backend for the model viewer.
//!
//! Draws every visible scene mesh with its material colour under the
//! scene's hemispheric light, with optional MSAA and ground grid, and
//! captures square offscreen images for thumbnails.
//!
//! # Invariants
//! - The engine never mutates the scene.
//! - GPU buffers exist only for meshes currently in the scene.

mod engine;
mod gpu;
mod readback;
mod shaders;

pub use engine::{OverlayTarget, WgpuCanvas, WgpuEngine};
