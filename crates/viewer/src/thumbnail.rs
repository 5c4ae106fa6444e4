use crate::ViewerError;
use glam::Vec3;
use glview_camera::OrbitCamera;
use glview_common::MeshId;
use glview_render::{RenderEngine, RenderView, THUMBNAIL_SIZE, Thumbnail};
use glview_scene::Scene;
use std::f32::consts::PI;

/// Capture `mesh` on its own from a temporary orbit camera.
///
/// Every other mesh is hidden for the capture; all visibilities are put
/// back afterwards whether or not the capture succeeded.
pub(crate) fn capture_mesh<E: RenderEngine>(
    engine: &mut E,
    scene: &mut Scene,
    mesh: MeshId,
) -> Result<Thumbnail, ViewerError> {
    let bounds = scene
        .get(mesh)
        .ok_or(ViewerError::UnknownMesh(mesh))?
        .world_bounds();

    let saved: Vec<(MeshId, bool)> = scene.meshes().map(|(id, m)| (id, m.visible)).collect();
    for (id, _) in &saved {
        if let Some(m) = scene.get_mut(*id) {
            m.visible = *id == mesh;
        }
    }

    let radius = if bounds.is_empty() {
        1.0
    } else {
        bounds.diagonal().max(f32::EPSILON)
    };
    let center = if bounds.is_empty() {
        Vec3::ZERO
    } else {
        bounds.center()
    };
    let camera = OrbitCamera::new(-PI / 2.0, PI / 2.5, radius, center);
    let view = RenderView {
        eye: camera.position(),
        target: camera.target,
        fov: camera.fov,
        aspect: 1.0,
        near: camera.near.min(radius * 0.01),
        far: camera.far.max(radius * 4.0),
        ..RenderView::default()
    };
    let result = engine.capture(scene, &view, THUMBNAIL_SIZE);

    for (id, visible) in saved {
        if let Some(m) = scene.get_mut(id) {
            m.visible = visible;
        }
    }

    match result {
        Ok(thumbnail) => {
            tracing::debug!(%mesh, radius, "thumbnail captured");
            Ok(thumbnail)
        }
        Err(e) => {
            tracing::warn!(%mesh, "thumbnail capture failed: {e}");
            Err(e.into())
        }
    }
}
