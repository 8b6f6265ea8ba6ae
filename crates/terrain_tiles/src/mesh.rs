//! Shared terrain mesh.
//!
//! One regular grid of `(N+1)^2` vertices over the unit tile square, reused
//! by every tile; per-tile elevation rides in a separate vertex buffer slot.

use bytemuck::{Pod, Zeroable};
use terrain_protocol::{grid_index_count, grid_vertex_count};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TerrainVertex {
    /// Grid position in the tile-local [0, 1] square.
    pub pos: [f32; 2],
}

/// Draw range over the shared index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshSegment {
    pub index_offset: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshCreateError {
    MeshSizeZero,
    /// `(N+1)^2` must stay addressable by 16-bit indices.
    MeshSizeExceedsIndexRange { mesh_size: u32 },
}

pub struct TerrainMesh {
    mesh_size: u32,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    segments: Vec<MeshSegment>,
}

impl TerrainMesh {
    pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;

    pub fn new(device: &wgpu::Device, mesh_size: u32) -> Result<Self, MeshCreateError> {
        if mesh_size == 0 {
            return Err(MeshCreateError::MeshSizeZero);
        }
        if grid_vertex_count(mesh_size) > u16::MAX as usize + 1 {
            return Err(MeshCreateError::MeshSizeExceedsIndexRange { mesh_size });
        }

        let edge = mesh_size + 1;
        let step = 1.0 / mesh_size as f32;
        let mut vertices = Vec::with_capacity(grid_vertex_count(mesh_size));
        for y in 0..edge {
            for x in 0..edge {
                vertices.push(TerrainVertex {
                    pos: [x as f32 * step, y as f32 * step],
                });
            }
        }

        // Clockwise winding in screen space: +x right, +y down.
        let mut indices: Vec<u16> = Vec::with_capacity(grid_index_count(mesh_size));
        for y in 0..mesh_size {
            for x in 0..mesh_size {
                let v0 = (y * edge + x) as u16;
                let v1 = v0 + 1;
                let v2 = v0 + edge as u16;
                let v3 = v2 + 1;
                indices.extend_from_slice(&[v0, v1, v2, v1, v3, v2]);
            }
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_tiles.mesh.vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_tiles.mesh.indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            mesh_size,
            vertex_buffer,
            index_buffer,
            segments: vec![MeshSegment {
                index_offset: 0,
                index_count: grid_index_count(mesh_size) as u32,
            }],
        })
    }

    pub const fn mesh_size(&self) -> u32 {
        self.mesh_size
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn segments(&self) -> &[MeshSegment] {
        &self.segments
    }

    /// Vertex layout for shader location 0 (grid position).
    pub const fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TerrainVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }

    /// Vertex layout for shader location 1 (per-vertex elevation).
    pub const fn elevation_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<f32>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32,
            }],
        }
    }
}
