//! CPU-side geometry.
//!
//! Meshes are plain attribute streams with no GPU dependency; `render::GpuMesh`
//! takes ownership of one when it is uploaded.

mod sphere;

pub use sphere::{generate_sphere, generate_sphere_with, SeamMode, SphereParams};

/// Indexed triangle mesh stored as three parallel attribute streams.
///
/// Invariants:
/// - `positions`, `normals` and `colors` have the same length; index `i` in each
///   names one logical vertex.
/// - `indices.len()` is a multiple of 3 and every index is `< vertex_count()`.
/// - Triangles are wound counter-clockwise when seen from the front face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Index of the north pole vertex (second to last).
    pub fn top_index(&self) -> Option<u32> {
        self.vertex_count().checked_sub(2).map(|i| i as u32)
    }

    /// Index of the south pole vertex (last).
    pub fn bottom_index(&self) -> Option<u32> {
        self.vertex_count().checked_sub(1).map(|i| i as u32)
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.colors.push(color);
        index
    }

    fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }
}
