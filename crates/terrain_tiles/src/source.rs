//! Tile-source collaborator interface.

use terrain_protocol::{TerrainOptions, TileId, TransformMatrix4x4, ViewState};

/// Per-tile elevation texture with its decode parameters, owned by the
/// tile source.
pub struct DemTexture<'a> {
    pub view: &'a wgpu::TextureView,
    /// Maps mesh-grid uv into the DEM texture's uv space.
    pub transform: TransformMatrix4x4,
    /// Channel weights + bias decoding a texel into meters.
    pub unpack: [f32; 4],
}

/// Capability trait for the external tile cache. The renderable-tile order
/// is authoritative: it drives pool slot assignment and coordinate-encoding
/// index values, and must not change mid-pass.
pub trait TileSource {
    /// Ordered tiles to render for the current view.
    fn renderable_tiles(&self, view: &ViewState) -> Vec<TileId>;

    /// DEM sample at a mesh grid coordinate, in the DEM's encoded meters.
    fn elevation(&self, tile: TileId, x: u32, y: u32, mesh_size: u32) -> f32;

    /// The tile's elevation texture, or `None` while the DEM has not
    /// arrived; callers skip such tiles for the current frame.
    fn dem(&self, tile: TileId) -> Option<DemTexture<'_>>;

    /// Base resolution of the tile's content in pixels.
    fn tile_size(&self, tile: TileId) -> u32;

    /// The tile's base color content for the tile color pass, or `None`
    /// when the tile renders elevation-only.
    fn color_texture_view(&self, tile: TileId) -> Option<&wgpu::TextureView>;

    /// Shared coordinate-space texture sampled by the encoding pass.
    fn coords_texture_view(&self) -> &wgpu::TextureView;

    fn options(&self) -> TerrainOptions;
}
