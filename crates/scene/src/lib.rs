//! Scene: the mesh table the loader, the picker and the renderer share.
//!
//! # Invariants
//! - Every mesh carries a provenance tag set at creation; reloads dispose
//!   asset meshes only and never match on names.
//! - Mesh ids are allocated monotonically and never reused.
//! - All mesh additions and disposals are recorded in the event log.

pub mod scene;

pub use scene::{
    HemisphericLight, PickInfo, Provenance, Scene, SceneEvent, SceneMesh, SceneSettings,
};
