use glview_common::MeshId;
use glview_scene::{Provenance, Scene};
use serde::Serialize;

/// Scene inspector for developer tooling.
///
/// Provides read-only queries against a scene for the viewer side panel and
/// the CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let asset_meshes = scene.asset_meshes().count();
        let extents = scene.world_extents();
        SceneSummary {
            mesh_count: scene.mesh_count(),
            asset_meshes,
            environment_meshes: scene.mesh_count() - asset_meshes,
            lights: scene.lights().len(),
            vertices: scene.meshes().map(|(_, m)| m.geometry.vertex_count()).sum(),
            triangles: scene.meshes().map(|(_, m)| m.geometry.triangle_count()).sum(),
            extents: (!extents.is_empty()).then(|| [extents.min.to_array(), extents.max.to_array()]),
        }
    }

    pub fn inspect_mesh(scene: &Scene, id: MeshId) -> Option<MeshInfo> {
        scene.get(id).map(|mesh| {
            let t = &mesh.transform;
            let bounds = mesh.world_bounds();
            MeshInfo {
                id: id.0,
                name: mesh.name.clone(),
                provenance: match mesh.provenance {
                    Provenance::Environment => "environment".into(),
                    Provenance::Asset { generation } => format!("asset (load {generation})"),
                },
                position: t.position.to_array(),
                rotation: t.rotation.to_array(),
                scale: t.scale.to_array(),
                bounds: [bounds.min.to_array(), bounds.max.to_array()],
                material: mesh.material.as_ref().map(|m| m.name.clone()),
                visible: mesh.visible,
                pickable: mesh.pickable,
                check_collisions: mesh.check_collisions,
                receive_shadows: mesh.receive_shadows,
            }
        })
    }

    pub fn list_meshes(scene: &Scene) -> Vec<MeshInfo> {
        scene
            .meshes()
            .filter_map(|(id, _)| Self::inspect_mesh(scene, id))
            .collect()
    }
}

/// Summary of a scene for the inspector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    pub mesh_count: usize,
    pub asset_meshes: usize,
    pub environment_meshes: usize,
    pub lights: usize,
    pub vertices: usize,
    pub triangles: usize,
    /// World-space `[min, max]` of all meshes, absent for an empty scene.
    pub extents: Option<[[f32; 3]; 2]>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: meshes={} (asset={} environment={}) lights={} vertices={} triangles={}",
            self.mesh_count,
            self.asset_meshes,
            self.environment_meshes,
            self.lights,
            self.vertices,
            self.triangles
        )?;
        if let Some([min, max]) = self.extents {
            write!(
                f,
                " extents=({:.2}, {:.2}, {:.2})..({:.2}, {:.2}, {:.2})",
                min[0], min[1], min[2], max[0], max[1], max[2]
            )?;
        }
        Ok(())
    }
}

/// Detailed info about a single mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshInfo {
    pub id: u64,
    pub name: String,
    pub provenance: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub bounds: [[f32; 3]; 2],
    pub material: Option<String>,
    pub visible: bool,
    pub pickable: bool,
    pub check_collisions: bool,
    pub receive_shadows: bool,
}

impl std::fmt::Display for MeshInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2}) {}",
            self.name,
            self.provenance,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
            self.material.as_deref().unwrap_or("no material"),
        )
    }
}
