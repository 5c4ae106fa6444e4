//! Developer tooling: read-only scene inspection for the side panel and CLI.
//!
//! # Invariants
//! - Tools never mutate the scene.

mod inspector;

pub use inspector::{MeshInfo, SceneInspector, SceneSummary};
