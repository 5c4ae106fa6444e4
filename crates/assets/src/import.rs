use crate::{AssetError, ImportedMesh, ImportedModel};
use glam::Mat4;
use glview_common::{Material, MeshGeometry, Transform};
use std::path::Path;

/// Something that can turn a path into a decoded model.
///
/// Implementations run on import worker threads, hence `Send + Sync`.
pub trait AssetImporter: Send + Sync {
    fn import(&self, path: &Path) -> Result<ImportedModel, AssetError>;
}

/// Imports `.gltf` (with external or embedded buffers) and `.glb` files.
///
/// The node tree of the default scene is flattened: each triangle primitive
/// becomes one [`ImportedMesh`] carrying its node's world transform.
/// Non-triangle primitives and primitives without positions are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfImporter;

impl AssetImporter for GltfImporter {
    fn import(&self, path: &Path) -> Result<ImportedModel, AssetError> {
        let _span = tracing::info_span!("gltf_import", path = %path.display()).entered();
        let (document, buffers, _images) =
            gltf::import(path).map_err(|source| AssetError::Gltf {
                path: path.to_path_buf(),
                source,
            })?;

        let mut meshes = Vec::new();
        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => {
                for node in scene.nodes() {
                    visit_node(&node, Mat4::IDENTITY, &buffers, &mut meshes)?;
                }
            }
            None => {
                // No scene: take meshes as-is at the origin.
                for mesh in document.meshes() {
                    read_mesh(&mesh, None, Mat4::IDENTITY, &buffers, &mut meshes)?;
                }
            }
        }

        if meshes.is_empty() {
            return Err(AssetError::EmptyModel(path.to_path_buf()));
        }
        tracing::info!(meshes = meshes.len(), "glTF imported");
        Ok(ImportedModel {
            source: path.to_path_buf(),
            meshes,
        })
    }
}

fn visit_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<ImportedMesh>,
) -> Result<(), AssetError> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        read_mesh(&mesh, node.name(), world, buffers, out)?;
    }
    for child in node.children() {
        visit_node(&child, world, buffers, out)?;
    }
    Ok(())
}

fn read_mesh(
    mesh: &gltf::Mesh,
    node_name: Option<&str>,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<ImportedMesh>,
) -> Result<(), AssetError> {
    let base = node_name
        .or_else(|| mesh.name())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
    let primitive_count = mesh.primitives().len();
    let transform = Transform::from_matrix(world);

    for (i, primitive) in mesh.primitives().enumerate() {
        let name = if primitive_count > 1 {
            format!("{base}_primitive{i}")
        } else {
            base.clone()
        };
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            tracing::warn!(mesh = %name, mode = ?primitive.mode(), "skipping non-triangle primitive");
            continue;
        }

        let reader =
            primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            tracing::warn!(mesh = %name, "skipping primitive without positions");
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let normals = reader.read_normals().map(|n| n.collect());
        let indices = reader.read_indices().map(|i| i.into_u32().collect());
        let geometry = MeshGeometry::new(positions, normals, indices).map_err(|source| {
            AssetError::Geometry {
                mesh: name.clone(),
                source,
            }
        })?;

        let material = primitive.material();
        let material = material.index().map(|index| Material {
            name: material
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("material_{index}")),
            base_color: material.pbr_metallic_roughness().base_color_factor(),
        });

        out.push(ImportedMesh {
            name,
            geometry,
            transform,
            material,
        });
    }
    Ok(())
}
