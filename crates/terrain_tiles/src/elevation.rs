//! Elevation sampler.
//!
//! Builds the per-tile elevation vertex buffer: one scalar per mesh vertex,
//! row major, sampled from the DEM collaborator at matching grid positions.

use terrain_protocol::{TileId, grid_vertex_count};
use wgpu::util::DeviceExt;

use crate::source::TileSource;

/// Samples `(mesh_size+1)^2` elevations for `tile`, row major, with the
/// configured sea-level offset already subtracted so shaders receive final
/// meters.
pub fn build_elevation_vertices(
    source: &dyn TileSource,
    tile: TileId,
    mesh_size: u32,
    elevation_offset: f32,
) -> Vec<f32> {
    let mut samples = Vec::with_capacity(grid_vertex_count(mesh_size));
    for y in 0..=mesh_size {
        for x in 0..=mesh_size {
            samples.push(source.elevation(tile, x, y, mesh_size) - elevation_offset);
        }
    }
    samples
}

pub fn create_elevation_buffer(device: &wgpu::Device, samples: &[f32]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("terrain_tiles.elevation.vertices"),
        contents: bytemuck::cast_slice(samples),
        usage: wgpu::BufferUsages::VERTEX,
    })
}
