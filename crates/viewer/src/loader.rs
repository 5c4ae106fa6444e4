use glview_assets::{AssetError, ImportedModel, LoadTicket};
use glview_common::{Material, MeshId};
use glview_scene::{Provenance, Scene, SceneMesh};
use std::sync::Arc;

/// What the viewer believes is loaded.
///
/// `is_loaded` is set optimistically when a load starts and cleared again
/// if that load fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadState {
    last_loaded_path: Option<String>,
    is_loaded: bool,
    generation: u64,
}

impl LoadState {
    pub fn last_loaded_path(&self) -> Option<&str> {
        self.last_loaded_path.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    /// Generation of the most recently started load; 0 before any.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a load of `path` would be a no-op.
    pub(crate) fn guards(&self, path: &str) -> bool {
        self.is_loaded && self.last_loaded_path.as_deref() == Some(path)
    }

    pub(crate) fn begin(&mut self, path: &str) -> LoadTicket {
        self.generation += 1;
        self.is_loaded = true;
        self.last_loaded_path = Some(path.to_owned());
        LoadTicket {
            generation: self.generation,
            path: path.to_owned(),
        }
    }

    pub(crate) fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Forget what is loaded. The generation keeps counting so completions
    /// of earlier loads stay stale.
    pub(crate) fn reset(&mut self) {
        self.last_loaded_path = None;
        self.is_loaded = false;
    }
}

/// A current load that failed, queued for the host.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: String,
    pub generation: u64,
    pub error: AssetError,
}

/// Add every mesh of `model` to the scene, tagged with the load generation.
///
/// Meshes without a material get the debug material when `debug_material`
/// is set.
pub(crate) fn add_model(
    scene: &mut Scene,
    model: ImportedModel,
    generation: u64,
    debug_material: bool,
) -> Vec<MeshId> {
    model
        .meshes
        .into_iter()
        .map(|imported| {
            let mut mesh = SceneMesh::new(
                imported.name,
                Provenance::Asset { generation },
                Arc::new(imported.geometry),
            )
            .with_transform(imported.transform);
            mesh.material = imported
                .material
                .or_else(|| debug_material.then(Material::debug));
            mesh.check_collisions = true;
            mesh.receive_shadows = true;
            scene.add_mesh(mesh)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glview_assets::ImportedMesh;
    use glview_common::{MeshGeometry, Transform};
    use glview_scene::SceneSettings;

    #[test]
    fn begin_and_reset() {
        let mut state = LoadState::default();
        assert!(!state.guards("a.glb"));
        let ticket = state.begin("a.glb");
        assert_eq!(ticket.generation, 1);
        assert!(state.guards("a.glb"));
        assert!(!state.guards("b.glb"));
        assert!(state.is_current(&ticket));

        state.reset();
        assert!(!state.guards("a.glb"));
        assert_eq!(state.last_loaded_path(), None);
        assert_eq!(state.generation(), 1);
        let next = state.begin("a.glb");
        assert!(!state.is_current(&ticket));
        assert!(state.is_current(&next));
    }

    #[test]
    fn added_meshes_are_tagged() {
        let mut scene = Scene::new(SceneSettings::default());
        let model = ImportedModel {
            source: "m.glb".into(),
            meshes: vec![
                ImportedMesh {
                    name: "plain".into(),
                    geometry: MeshGeometry::cube(1.0),
                    transform: Transform::default(),
                    material: None,
                },
                ImportedMesh {
                    name: "painted".into(),
                    geometry: MeshGeometry::cube(1.0),
                    transform: Transform::default(),
                    material: Some(Material::default()),
                },
            ],
        };
        let ids = add_model(&mut scene, model, 4, true);
        assert_eq!(ids.len(), 2);
        let plain = scene.get(ids[0]).unwrap();
        assert_eq!(plain.provenance, Provenance::Asset { generation: 4 });
        assert!(plain.check_collisions && plain.receive_shadows);
        assert_eq!(plain.material, Some(Material::debug()));
        assert_eq!(scene.get(ids[1]).unwrap().material, Some(Material::default()));
    }
}
