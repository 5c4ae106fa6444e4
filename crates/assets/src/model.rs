use glview_common::{Aabb, Material, MeshGeometry, Transform};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One triangle mesh of an imported model, flattened out of the node tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedMesh {
    pub name: String,
    pub geometry: MeshGeometry,
    /// World transform of the owning node.
    pub transform: Transform,
    /// `None` when the file assigns no material.
    pub material: Option<Material>,
}

impl ImportedMesh {
    pub fn world_bounds(&self) -> Aabb {
        self.geometry.bounds().transformed(&self.transform.matrix())
    }
}

/// A decoded model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedModel {
    pub source: PathBuf,
    pub meshes: Vec<ImportedMesh>,
}

impl ImportedModel {
    pub fn bounds(&self) -> Aabb {
        self.meshes
            .iter()
            .fold(Aabb::EMPTY, |acc, m| acc.union(&m.world_bounds()))
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.triangle_count()).sum()
    }
}
