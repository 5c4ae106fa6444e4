use glview_common::MeshId;
use glview_input::PointerInfo;

/// Emitted once per click that lands on a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEvent {
    pub mesh_name: String,
    /// The picked mesh's position, not the hit point.
    pub position: [f32; 3],
    pub mesh: Option<MeshId>,
    /// The pointer event that made the pick; walk mode only.
    pub pointer: Option<PointerInfo>,
}
