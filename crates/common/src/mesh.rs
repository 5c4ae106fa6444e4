use crate::Aabb;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Errors from building mesh geometry.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("index count {0} is not a multiple of 3")]
    NotTriangles(usize),
    #[error("{normals} normals for {positions} positions")]
    NormalCountMismatch { positions: usize, normals: usize },
}

/// Triangle-list geometry in mesh-local space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    /// Build geometry, validating indices. Missing normals (`None`) are
    /// generated by averaging face normals.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        indices: Option<Vec<u32>>,
    ) -> Result<Self, GeometryError> {
        let indices = indices.unwrap_or_else(|| (0..positions.len() as u32).collect());
        if indices.len() % 3 != 0 {
            return Err(GeometryError::NotTriangles(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count: positions.len(),
            });
        }
        let normals = match normals {
            Some(n) if n.len() == positions.len() => n,
            Some(n) => {
                return Err(GeometryError::NormalCountMismatch {
                    positions: positions.len(),
                    normals: n.len(),
                });
            }
            None => smooth_normals(&positions, &indices),
        };
        Ok(Self {
            positions,
            normals,
            indices,
        })
    }

    /// Axis-aligned unit cube centered on the origin, 24 vertices.
    pub fn cube(size: f32) -> Self {
        let p = size * 0.5;
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-p, -p, p], [p, -p, p], [p, p, p], [-p, p, p]]),
            ([0.0, 0.0, -1.0], [[p, -p, -p], [-p, -p, -p], [-p, p, -p], [p, p, -p]]),
            ([1.0, 0.0, 0.0], [[p, -p, p], [p, -p, -p], [p, p, -p], [p, p, p]]),
            ([-1.0, 0.0, 0.0], [[-p, -p, -p], [-p, -p, p], [-p, p, p], [-p, p, -p]]),
            ([0.0, 1.0, 0.0], [[-p, p, p], [p, p, p], [p, p, -p], [-p, p, -p]]),
            ([0.0, -1.0, 0.0], [[-p, -p, -p], [p, -p, -p], [p, -p, p], [-p, -p, p]]),
        ];
        let mut geometry = Self::default();
        for (normal, corners) in faces {
            let base = geometry.positions.len() as u32;
            geometry.positions.extend(corners);
            geometry.normals.extend([normal; 4]);
            geometry
                .indices
                .extend([base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        geometry
    }

    /// Flat square on the XZ plane facing +Y.
    pub fn ground(size: f32) -> Self {
        let p = size * 0.5;
        Self {
            positions: vec![[-p, 0.0, p], [p, 0.0, p], [p, 0.0, -p], [-p, 0.0, -p]],
            normals: vec![[0.0, 1.0, 0.0]; 4],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied().map(Vec3::from))
    }
}

fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (
            Vec3::from(positions[a]),
            Vec3::from(positions[b]),
            Vec3::from(positions[c]),
        );
        let face = (pb - pa).cross(pc - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

/// Surface material. Only the base colour is carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

impl Material {
    /// Fallback assigned to asset meshes that arrive without a material in walk mode.
    pub fn debug() -> Self {
        Self {
            name: "debugMat".into(),
            base_color: [0.9, 0.4, 0.7, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_vertices_and_12_triangles() {
        let cube = MeshGeometry::cube(1.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.bounds(), Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)));
    }

    #[test]
    fn missing_indices_become_sequential() {
        let g = MeshGeometry::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]],
            None,
            None,
        )
        .unwrap();
        assert_eq!(g.indices, vec![0, 1, 2]);
        // Counter-clockwise seen from above, so the generated normal is +Y.
        assert_eq!(g.normals[0], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let err = MeshGeometry::new(vec![[0.0; 3]; 3], None, Some(vec![0, 1, 3])).unwrap_err();
        assert_eq!(
            err,
            GeometryError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn mismatched_normals_are_rejected() {
        let err = MeshGeometry::new(vec![[0.0; 3]; 3], Some(vec![[0.0; 3]; 2]), None).unwrap_err();
        assert!(matches!(err, GeometryError::NormalCountMismatch { .. }));
    }

    #[test]
    fn debug_material_differs_from_default() {
        assert_ne!(Material::debug(), Material::default());
    }
}
