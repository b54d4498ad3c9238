use wgpu::util::DeviceExt;

use crate::mesh::Mesh;

use super::MeshResource;

/// Vertex input layout shared by every mesh and the Phong pipeline.
///
/// One tightly packed `Float32x3` stream per attribute:
/// slot 0 = position, slot 1 = normal, slot 2 = color.
pub struct MeshLayout;

impl MeshLayout {
    pub const POSITION: u32 = 0;
    pub const NORMAL: u32 = 1;
    pub const COLOR: u32 = 2;

    const STRIDE: u64 = std::mem::size_of::<[f32; 3]>() as u64;

    const POSITION_ATTRS: [wgpu::VertexAttribute; 1] =
        wgpu::vertex_attr_array![0 => Float32x3];
    const NORMAL_ATTRS: [wgpu::VertexAttribute; 1] =
        wgpu::vertex_attr_array![1 => Float32x3];
    const COLOR_ATTRS: [wgpu::VertexAttribute; 1] =
        wgpu::vertex_attr_array![2 => Float32x3];

    pub fn buffers() -> [wgpu::VertexBufferLayout<'static>; 3] {
        [
            Self::stream(&Self::POSITION_ATTRS),
            Self::stream(&Self::NORMAL_ATTRS),
            Self::stream(&Self::COLOR_ATTRS),
        ]
    }

    fn stream(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// A [`Mesh`] resident on the GPU: four static buffers (positions, normals,
/// colors, `u32` indices).
///
/// Contents are never written after upload.
pub struct GpuMesh {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    colors: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    released: bool,
}

impl GpuMesh {
    /// Uploads `mesh`, consuming it.
    pub fn upload(device: &wgpu::Device, mesh: Mesh) -> Self {
        let Mesh {
            positions,
            normals,
            colors,
            indices,
        } = mesh;

        let vertex_buffer = |label: &str, data: &[[f32; 3]]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        let gpu_mesh = Self {
            positions: vertex_buffer("sphaera mesh positions", &positions),
            normals: vertex_buffer("sphaera mesh normals", &normals),
            colors: vertex_buffer("sphaera mesh colors", &colors),
            indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sphaera mesh indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: indices.len() as u32,
            released: false,
        };

        log::debug!(
            "uploaded mesh: {} vertices, {} indices",
            positions.len(),
            gpu_mesh.index_count
        );
        gpu_mesh
    }

    /// Binds the three vertex streams to slots 0..=2 and the index buffer.
    pub fn bind(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(MeshLayout::POSITION, self.positions.slice(..));
        rpass.set_vertex_buffer(MeshLayout::NORMAL, self.normals.slice(..));
        rpass.set_vertex_buffer(MeshLayout::COLOR, self.colors.slice(..));
        rpass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Destroys all four buffers. Returns `false` if already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.positions.destroy();
        self.normals.destroy();
        self.colors.destroy();
        self.indices.destroy();
        self.released = true;
        true
    }
}

impl MeshResource for GpuMesh {
    fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_binds_one_attribute_per_slot() {
        let buffers = MeshLayout::buffers();
        for (slot, layout) in buffers.iter().enumerate() {
            assert_eq!(layout.array_stride, 12);
            assert_eq!(layout.attributes.len(), 1);
            assert_eq!(layout.attributes[0].shader_location, slot as u32);
            assert_eq!(layout.attributes[0].offset, 0);
            assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x3);
        }
    }
}
