//! GPU-side tile resources for the terrain pipeline.
//!
//! This crate owns everything the painter needs per tile: the render-target
//! pool handing out pooled color+depth targets per frame, the per-tile
//! resource store (batch color textures and elevation vertex buffers), the
//! shared displacement mesh, the elevation sampler, and the `TileSource`
//! trait through which the external tile cache is consulted.

mod elevation;
mod mesh;
mod pool;
mod resources;
mod source;

pub use elevation::{build_elevation_vertices, create_elevation_buffer};
pub use mesh::{MeshCreateError, MeshSegment, TerrainMesh, TerrainVertex};
pub use pool::{PooledTarget, RenderTargetPool, TargetAcquireError, TargetHandle};
pub use resources::{BatchTexture, TileResourceStore, TileResources};
pub use source::{DemTexture, TileSource};

/// Format of pooled tile color targets. Non-sRGB so picking and test
/// read-backs stay byte exact.
pub const COLOR_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Depth format shared by pooled targets and the screen depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
