//! OFF mesh loading and per-vertex shading attribute derivation.
//!
//! This crate is the CPU side of the viewer pipeline:
//! - [`off`] parses an [Object File Format](https://en.wikipedia.org/wiki/OFF_(file_format))
//!   mesh into a flat vertex array and a fan-triangulated index list,
//!   then rescales it into a unit-diagonal cube centered at the origin.
//! - [`attributes`] derives smooth vertex normals, cylindrical texture
//!   coordinates and tangent frames (with handedness) from the triangulated
//!   mesh.
//!
//! Nothing here touches the GPU: the output arrays are plain `Vec`s, ready to
//! be consumed by whatever uploads them.
//!
//! # Example
//!
//! ```no_run
//! let mesh = off_mesh::load_off("suzanne.off").expect("Failed to load mesh");
//! let attributes = off_mesh::generate_attributes(&mesh);
//! assert_eq!(attributes.normals.len(), mesh.vertex_count());
//! ```

pub mod attributes;
pub mod off;

pub use attributes::{generate_attributes, VertexAttributes};
pub use off::{load_off, parse_off, OffError};

/// A parsed, normalized triangle mesh.
///
/// `indices` is a flat triangle list: each consecutive triple is one
/// renderable triangle, in file/triangulation order. The triangulated count
/// ([`Self::triangle_count`]), not the face count declared in the file, is
/// authoritative downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions, `w == 1` after normalization.
    pub positions: Vec<glam::Vec4>,
    /// Flat triangle list of 0-based vertex indices.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles after fan triangulation.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// A mesh with no vertices or no triangles has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }
}
