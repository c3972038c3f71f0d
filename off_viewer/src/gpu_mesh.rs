use anyhow::Result;
use wgpu::util::DeviceExt;

use off_mesh::{MeshData, VertexAttributes};

/// GPU-resident mesh: one buffer per vertex attribute plus the index buffer.
///
/// [`GpuMesh::upload`] consumes the CPU-side arrays; they are freed as soon
/// as the bulk copies are staged, leaving the GPU buffers as the sole owners
/// of the data. Dropping a `GpuMesh` destroys every buffer, so the viewer's
/// destroy-old-then-create-new replacement order falls out of assignment
/// order alone.
#[derive(Debug)]
pub struct GpuMesh {
    pub position_buffer: wgpu::Buffer,
    pub normal_buffer: wgpu::Buffer,
    pub tex_coord_buffer: wgpu::Buffer,
    pub tangent_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,

    pub vertex_count: u32,
    pub index_count: u32,
}

impl GpuMesh {
    const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
        wgpu::vertex_attr_array![0 => Float32x4];
    const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
    const TEX_COORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
        wgpu::vertex_attr_array![2 => Float32x2];
    const TANGENT_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x4];

    /// One single-attribute buffer per slot: positions, normals, texture
    /// coordinates, tangents.
    pub const fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 4] {
        [
            wgpu::VertexBufferLayout {
                array_stride: 4 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &Self::POSITION_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: 3 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &Self::NORMAL_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: 2 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &Self::TEX_COORD_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: 4 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &Self::TANGENT_ATTRIBUTES,
            },
        ]
    }

    /// Upload a mesh and its derived attributes into fresh GPU buffers.
    ///
    /// Whole-mesh atomic: the five allocations run inside an out-of-memory
    /// error scope, and any reported error discards every buffer created for
    /// this load before it is surfaced. No partial buffer set ever escapes.
    pub fn upload(
        device: &wgpu::Device,
        mesh: MeshData,
        attributes: VertexAttributes,
    ) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Position Buffer"),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Normal Buffer"),
            contents: bytemuck::cast_slice(&attributes.normals),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let tex_coord_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh TexCoord Buffer"),
            contents: bytemuck::cast_slice(&attributes.tex_coords),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let tangent_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Tangent Buffer"),
            contents: bytemuck::cast_slice(&attributes.tangents),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let vertex_count = mesh.vertex_count() as u32;
        let index_count = mesh.indices.len() as u32;

        // The GPU copies are staged: release the CPU-side arrays now.
        drop(mesh);
        drop(attributes);

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            anyhow::bail!("mesh upload failed: {error}");
        }

        Ok(Self {
            position_buffer,
            normal_buffer,
            tex_coord_buffer,
            tangent_buffer,
            index_buffer,
            vertex_count,
            index_count,
        })
    }
}

impl Drop for GpuMesh {
    fn drop(&mut self) {
        // Release GPU memory eagerly instead of waiting for wgpu to collect
        // the handles.
        self.position_buffer.destroy();
        self.normal_buffer.destroy();
        self.tex_coord_buffer.destroy();
        self.tangent_buffer.destroy();
        self.index_buffer.destroy();
    }
}
