use glam::{Mat4, Vec3};
use glview_common::{Aabb, Material, MeshGeometry, MeshId, Ray, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Who created a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Fixtures owned by the viewer itself (ground, markers). Survive reloads.
    Environment,
    /// Geometry imported by the load with the given generation.
    Asset { generation: u64 },
}

impl Provenance {
    pub fn is_asset(&self) -> bool {
        matches!(self, Provenance::Asset { .. })
    }
}

/// A mesh living in the scene.
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub name: String,
    pub provenance: Provenance,
    pub transform: Transform,
    pub geometry: Arc<MeshGeometry>,
    pub material: Option<Material>,
    pub check_collisions: bool,
    pub receive_shadows: bool,
    pub visible: bool,
    pub pickable: bool,
}

impl SceneMesh {
    pub fn new(name: impl Into<String>, provenance: Provenance, geometry: Arc<MeshGeometry>) -> Self {
        Self {
            name: name.into(),
            provenance,
            transform: Transform::default(),
            geometry,
            material: None,
            check_collisions: false,
            receive_shadows: false,
            visible: true,
            pickable: true,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    pub fn world_bounds(&self) -> Aabb {
        self.geometry.bounds().transformed(&self.world_matrix())
    }
}

/// Hemispheric ambient light: sky colour along `direction`, ground colour opposite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HemisphericLight {
    pub name: String,
    pub direction: Vec3,
    pub intensity: f32,
    pub ground_color: [f32; 3],
}

impl HemisphericLight {
    pub fn new(name: impl Into<String>, direction: Vec3) -> Self {
        Self {
            name: name.into(),
            direction: direction.normalize_or_zero(),
            intensity: 1.0,
            ground_color: [0.0, 0.0, 0.0],
        }
    }
}

/// Scene-wide parameters forwarded to the collision and physics layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub collisions_enabled: bool,
    pub gravity: Vec3,
    pub clear_color: [f32; 4],
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            collisions_enabled: true,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            clear_color: [0.2, 0.2, 0.3, 1.0],
        }
    }
}

/// Record of a scene mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    MeshAdded {
        id: MeshId,
        name: String,
        provenance: Provenance,
    },
    MeshDisposed {
        id: MeshId,
        name: String,
        provenance: Provenance,
    },
}

/// Result of a successful ray pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickInfo {
    pub mesh: MeshId,
    pub point: Vec3,
    pub distance: f32,
}

/// The scene: meshes keyed by id, lights and settings.
///
/// Uses BTreeMap so iteration follows creation order.
#[derive(Debug, Default)]
pub struct Scene {
    meshes: BTreeMap<MeshId, SceneMesh>,
    lights: Vec<HemisphericLight>,
    settings: SceneSettings,
    next_id: u64,
    event_log: Vec<SceneEvent>,
}

impl Scene {
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SceneSettings {
        &mut self.settings
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &SceneMesh)> {
        self.meshes.iter().map(|(id, m)| (*id, m))
    }

    pub fn asset_meshes(&self) -> impl Iterator<Item = (MeshId, &SceneMesh)> {
        self.meshes().filter(|(_, m)| m.provenance.is_asset())
    }

    pub fn get(&self, id: MeshId) -> Option<&SceneMesh> {
        self.meshes.get(&id)
    }

    pub fn get_mut(&mut self, id: MeshId) -> Option<&mut SceneMesh> {
        self.meshes.get_mut(&id)
    }

    /// Find the first mesh with an exact name.
    pub fn find_by_name(&self, name: &str) -> Option<MeshId> {
        self.meshes()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| id)
    }

    /// Add a mesh and return its id.
    pub fn add_mesh(&mut self, mesh: SceneMesh) -> MeshId {
        self.next_id += 1;
        let id = MeshId(self.next_id);
        self.event_log.push(SceneEvent::MeshAdded {
            id,
            name: mesh.name.clone(),
            provenance: mesh.provenance,
        });
        self.meshes.insert(id, mesh);
        id
    }

    /// Remove a mesh. Returns it if it existed.
    pub fn dispose(&mut self, id: MeshId) -> Option<SceneMesh> {
        let mesh = self.meshes.remove(&id)?;
        self.event_log.push(SceneEvent::MeshDisposed {
            id,
            name: mesh.name.clone(),
            provenance: mesh.provenance,
        });
        Some(mesh)
    }

    /// Dispose every mesh matching the predicate, returning their ids.
    pub fn dispose_where<F>(&mut self, mut predicate: F) -> Vec<MeshId>
    where
        F: FnMut(&SceneMesh) -> bool,
    {
        let doomed: Vec<MeshId> = self
            .meshes
            .iter()
            .filter(|(_, m)| predicate(m))
            .map(|(id, _)| *id)
            .collect();
        for id in &doomed {
            self.dispose(*id);
        }
        doomed
    }

    /// Dispose all asset meshes, keeping environment fixtures.
    pub fn dispose_assets(&mut self) -> Vec<MeshId> {
        let disposed = self.dispose_where(|m| m.provenance.is_asset());
        tracing::debug!(count = disposed.len(), "disposed asset meshes");
        disposed
    }

    /// Dispose everything, lights included.
    pub fn clear(&mut self) {
        self.dispose_where(|_| true);
        self.lights.clear();
    }

    pub fn add_light(&mut self, light: HemisphericLight) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[HemisphericLight] {
        &self.lights
    }

    /// World-space bounds over all meshes.
    pub fn world_extents(&self) -> Aabb {
        self.world_extents_where(|_| true)
    }

    /// World-space bounds over the meshes matching the predicate.
    pub fn world_extents_where<F>(&self, mut predicate: F) -> Aabb
    where
        F: FnMut(&SceneMesh) -> bool,
    {
        self.meshes
            .values()
            .filter(|m| predicate(m))
            .fold(Aabb::EMPTY, |acc, m| acc.union(&m.world_bounds()))
    }

    /// Cast a ray against the world bounds of visible, pickable meshes.
    /// The nearest hit wins; ties go to the older mesh.
    pub fn pick(&self, ray: &Ray) -> Option<PickInfo> {
        self.meshes
            .iter()
            .filter(|(_, m)| m.visible && m.pickable)
            .filter_map(|(id, m)| {
                m.world_bounds().intersect_ray(ray).map(|distance| PickInfo {
                    mesh: *id,
                    point: ray.at(distance),
                    distance,
                })
            })
            .fold(None, |best: Option<PickInfo>, hit| match best {
                Some(b) if b.distance <= hit.distance => Some(b),
                _ => Some(hit),
            })
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }
}
