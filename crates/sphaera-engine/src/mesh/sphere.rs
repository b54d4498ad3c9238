use std::f32::consts::PI;

use glam::Vec3;

use super::Mesh;

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// How the last longitude column relates to the first.
///
/// The first and last columns sit at `phi = 0` and `phi = 2π`, so they share
/// positions but are distinct vertices.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum SeamMode {
    /// Columns `0..width` are stitched pairwise; the last column is not joined
    /// back to the first.
    #[default]
    Open,
    /// Longitude `i + 1` wraps modulo `width`, adding one extra strip of
    /// triangles between the last and the first column.
    Wrapped,
}

/// Sampling parameters for [`generate_sphere_with`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphereParams {
    pub radius: f32,
    /// Samples per latitude ring (longitude resolution).
    pub width_samples: u32,
    /// Latitude samples pole to pole, both poles included.
    pub height_samples: u32,
    pub seam: SeamMode,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_samples: 32,
            height_samples: 16,
            seam: SeamMode::Open,
        }
    }
}

/// Generates a latitude/longitude sphere centered on the origin.
///
/// Vertex order: the `height_samples - 2` interior rings, ring-major, then the
/// north pole, then the south pole. Every vertex is white.
///
/// With `width_samples < 2` or `height_samples < 3` there is no ring to stitch;
/// the result holds only the two poles and no triangles.
pub fn generate_sphere(radius: f32, width_samples: u32, height_samples: u32) -> Mesh {
    generate_sphere_with(&SphereParams {
        radius,
        width_samples,
        height_samples,
        seam: SeamMode::Open,
    })
}

pub fn generate_sphere_with(params: &SphereParams) -> Mesh {
    let SphereParams {
        radius,
        width_samples: width,
        height_samples: height,
        seam,
    } = *params;

    let degenerate = width < 2 || height < 3;
    let rings = if degenerate { 0 } else { height - 2 };

    let capacity = (width as usize) * (rings as usize) + 2;
    let mut mesh = Mesh {
        positions: Vec::with_capacity(capacity),
        normals: Vec::with_capacity(capacity),
        colors: Vec::with_capacity(capacity),
        indices: Vec::new(),
    };

    for j in 1..=rings {
        let theta = j as f32 / (height - 1) as f32 * PI;
        for i in 0..width {
            let phi = i as f32 / (width - 1) as f32 * 2.0 * PI;
            let dir = Vec3::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                -theta.sin() * phi.sin(),
            );
            mesh.push_vertex((dir * radius).into(), dir.normalize().into(), WHITE);
        }
    }

    let top = mesh.push_vertex([0.0, radius, 0.0], [0.0, 1.0, 0.0], WHITE);
    let bottom = mesh.push_vertex([0.0, -radius, 0.0], [0.0, -1.0, 0.0], WHITE);

    if degenerate {
        log::debug!("sphere {width}x{height} has no interior ring; emitting poles only");
        return mesh;
    }

    let columns = match seam {
        SeamMode::Open => width - 1,
        SeamMode::Wrapped => width,
    };
    let next = |i: u32| next_column(i, width, seam);
    let idx = |ring: u32, i: u32| ring * width + i;

    for j in 0..rings - 1 {
        for i in 0..columns {
            let r = next(i);
            mesh.push_triangle(idx(j, i), idx(j + 1, r), idx(j, r));
            mesh.push_triangle(idx(j, i), idx(j + 1, i), idx(j + 1, r));
        }
    }

    for i in 0..columns {
        mesh.push_triangle(top, idx(0, i), idx(0, next(i)));
    }

    let last = rings - 1;
    for i in 0..columns {
        mesh.push_triangle(bottom, idx(last, next(i)), idx(last, i));
    }

    mesh
}

/// Column to the right of `i` on the same ring.
fn next_column(i: u32, width: u32, seam: SeamMode) -> u32 {
    match seam {
        SeamMode::Open => i + 1,
        SeamMode::Wrapped => (i + 1) % width,
    }
}
