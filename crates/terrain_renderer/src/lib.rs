//! Terrain painter crate root.
//!
//! This module defines the public API (`TerrainPainter` and its pass
//! surface) and wires internal modules around the state compartments used
//! by the per-frame pass sequence:
//! - `painter_init`: constructs pipelines, samplers, and layouts.
//! - `painter_prepare`: per-tile resource preparation and the clear pass.
//! - `painter_draw`: the tile color pass and the screen composite pass.
//! - `painter_coords`: the coordinate-encoding pass and pixel decode.
//! - `geometry`: tile-to-clip matrix math shared by the draw passes.
//!
//! Pass sequence per frame: `begin_frame` -> `prepare_terrain` +
//! `clear_terrain` + `tile_color_pass` per renderable tile ->
//! `draw_terrain` -> `draw_terrain_coords` when picking is needed.

use terrain_protocol::{TileKey, Viewport};
use terrain_tiles::{
    MeshCreateError, RenderTargetPool, TargetAcquireError, TerrainMesh, TileResourceStore,
};

pub use terrain_protocol::{
    BlendMode, DepthRange, TerrainCoordsIndex, TerrainOptions, TileId, TransformMatrix4x4,
    ViewState,
};
pub use terrain_tiles::{DemTexture, TileSource};

mod geometry;
mod painter_coords;
mod painter_draw;
mod painter_init;
mod painter_prepare;

/// Format of the coordinate-encoding framebuffer. Non-sRGB so encoded
/// channel values survive a read-back bit exact.
pub const COORDS_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub(crate) const IDENTITY_MATRIX: TransformMatrix4x4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Per-tile uniform block shared by all three terrain shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct TerrainUniforms {
    /// Tile-local (u, v, elevation) to clip space.
    pub matrix: TransformMatrix4x4,
    /// Mesh uv to DEM texture uv.
    pub dem_transform: TransformMatrix4x4,
    /// Channel weights + bias decoding a DEM texel into meters.
    pub dem_unpack: [f32; 4],
    /// x: encoded coords id in [0, 1]; y: elevation offset in meters;
    /// z: 1.0 when the DEM texture drives displacement; w: unused.
    pub params: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PainterCreateError {
    Mesh(MeshCreateError),
}

impl From<MeshCreateError> for PainterCreateError {
    fn from(error: MeshCreateError) -> Self {
        PainterCreateError::Mesh(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareError {
    /// The tile's DEM has not arrived; skip the tile this frame.
    DemUnavailable,
    Target(TargetAcquireError),
}

impl From<TargetAcquireError> for PrepareError {
    fn from(error: TargetAcquireError) -> Self {
        PrepareError::Target(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainDrawError {
    /// `prepare_terrain` did not run for the tile this frame.
    NotPrepared,
}

pub(crate) struct PipelineState {
    pub tile_bind_group_layout: wgpu::BindGroupLayout,
    pub tile_color: wgpu::RenderPipeline,
    pub composite_alpha: wgpu::RenderPipeline,
    pub composite_multiply: wgpu::RenderPipeline,
    pub composite_unblended: wgpu::RenderPipeline,
    pub coords: wgpu::RenderPipeline,
}

pub(crate) struct CoordsFramebuffer {
    pub size: Viewport,
    pub color_texture: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
}

/// Orchestrates the terrain pass sequence and owns every GPU resource the
/// pipeline allocates: the render-target pool, per-tile resources, the
/// shared mesh, and the coordinate-encoding framebuffer.
pub struct TerrainPainter {
    pub(crate) device: wgpu::Device,
    pub(crate) pipelines: PipelineState,
    pub(crate) sampler_linear: wgpu::Sampler,
    pub(crate) sampler_nearest: wgpu::Sampler,
    pub(crate) pool: RenderTargetPool,
    pub(crate) store: TileResourceStore,
    pub(crate) mesh: TerrainMesh,
    pub(crate) frame: u64,
    pub(crate) coords: Option<CoordsFramebuffer>,
    pub(crate) coords_revision: u64,
    pub(crate) latest_coords_revision: Option<u64>,
}

impl TerrainPainter {
    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    pub fn pool(&self) -> &RenderTargetPool {
        &self.pool
    }

    pub fn store(&self) -> &TileResourceStore {
        &self.store
    }

    /// Color texture of the last coordinate-encoding pass, for read-back.
    pub fn coords_color_texture(&self) -> Option<&wgpu::Texture> {
        self.coords.as_ref().map(|coords| &coords.color_texture)
    }

    pub fn coords_framebuffer_size(&self) -> Option<Viewport> {
        self.coords.as_ref().map(|coords| coords.size)
    }

    /// Drops all GPU resources of an evicted tile.
    pub fn evict_tile(&mut self, key: TileKey) -> bool {
        self.store.evict(key)
    }

    pub(crate) fn composite_pipeline_for(&self, blend: BlendMode) -> &wgpu::RenderPipeline {
        match blend {
            BlendMode::Unblended => &self.pipelines.composite_unblended,
            BlendMode::Alpha => &self.pipelines.composite_alpha,
            BlendMode::Multiply => &self.pipelines.composite_multiply,
        }
    }
}
