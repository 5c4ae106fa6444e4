//! Shared value types used across the viewer crates.
//!
//! Nothing in here owns engine resources; everything is plain data that can
//! be cloned, compared and serialized.

mod bounds;
mod mesh;
mod types;

pub use bounds::{Aabb, Ray};
pub use mesh::{GeometryError, Material, MeshGeometry};
pub use types::{MeshId, Transform};
