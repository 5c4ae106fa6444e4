//! Asset import: glTF/GLB files decoded into plain meshes.
//!
//! Decoding is delegated to the `gltf` crate. Imports run through an
//! [`ImportDriver`] so the viewer can keep its event loop responsive and
//! apply completions on its own thread.
//!
//! # Layout
//! - `model`: the decoded, engine-agnostic model.
//! - `import`: the [`AssetImporter`] trait and the glTF implementation.
//! - `driver`: background and manually-resolved import drivers.

mod driver;
mod import;
mod model;

pub use driver::{ImportCompletion, ImportDriver, LoadTicket, ManualImports, ThreadedImports};
pub use import::{AssetImporter, GltfImporter};
pub use model::{ImportedMesh, ImportedModel};

use glview_common::GeometryError;
use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error in {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("bad geometry in mesh {mesh}: {source}")]
    Geometry {
        mesh: String,
        #[source]
        source: GeometryError,
    },
    #[error("{0} contains no triangle meshes")]
    EmptyModel(PathBuf),
    #[error("import worker failed: {0}")]
    Worker(String),
}
