//! Coordinate-encoding pass and picking decode.
//!
//! Produces an off-screen image in which every terrain pixel's color names
//! the tile that covers it: in-tile uv in red/green, the tile's encoded
//! index (`255 - i` in draw order) in blue. A pixel read back from that
//! image decodes to a tile key through the index the pass returned -
//! and only through that exact index; a rebuilt index makes older
//! read-backs stale.

use log::debug;
use terrain_protocol::{TerrainCoordsIndex, TileKey, ViewState};
use terrain_tiles::{DEPTH_FORMAT, TileSource};

use crate::geometry::tile_clip_matrix;
use crate::{COORDS_TARGET_FORMAT, CoordsFramebuffer, TerrainPainter, TerrainUniforms};

impl TerrainPainter {
    /// Runs the full coordinate-encoding pass and returns the ordered
    /// tile-key index for subsequent pixel decode. Tiles without prepared
    /// resources or a DEM are skipped and absent from the index.
    pub fn draw_terrain_coords(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        source: &dyn TileSource,
        view: &ViewState,
    ) -> TerrainCoordsIndex {
        self.ensure_coords_framebuffer(view);
        self.coords_revision += 1;
        let mut index = TerrainCoordsIndex::new(self.coords_revision);

        let coords = self
            .coords
            .as_ref()
            .expect("coords framebuffer ensured above");
        let coords_texture_view = source.coords_texture_view();
        let tiles = source.renderable_tiles(view);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("terrain.pass.coords"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &coords.color_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &coords.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(&self.pipelines.coords);

        for tile in tiles {
            let Some(resources) = self.store.get(tile.key()) else {
                continue;
            };
            let Some(elevation_buffer) = resources.elevation_buffer() else {
                continue;
            };
            let Some(dem) = source.dem(tile) else {
                continue;
            };
            let Some(encoded) = index.next_encoded_value() else {
                debug!("coords index space exhausted; remaining tiles unencoded");
                break;
            };

            let options = source.options();
            let uniforms = TerrainUniforms {
                matrix: tile_clip_matrix(view, tile),
                dem_transform: dem.transform,
                dem_unpack: dem.unpack,
                params: [
                    encoded as f32 / 255.0,
                    options.elevation_offset,
                    1.0,
                    0.0,
                ],
            };
            let bind_group = self.create_tile_bind_group(
                &uniforms,
                coords_texture_view,
                dem.view,
                "terrain.bind.coords",
            );
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(1, elevation_buffer.slice(..));
            self.draw_mesh_segments(&mut pass);
            index.record(tile.key());
        }
        drop(pass);

        self.latest_coords_revision = Some(index.revision());
        index
    }

    /// Decodes one read-back pixel of the coords framebuffer against the
    /// index a pass returned. Stale indices (a newer pass ran since) and
    /// pixels not covered by terrain decode to `None`, never an error.
    pub fn decode_coords_pixel(
        &self,
        index: &TerrainCoordsIndex,
        pixel: [u8; 4],
    ) -> Option<TileKey> {
        if self.latest_coords_revision != Some(index.revision()) {
            return None;
        }
        if pixel[3] == 0 {
            return None;
        }
        index.decode(pixel[2])
    }

    /// In-tile uv of a decoded pixel, from the red/green channels.
    pub fn decode_coords_uv(pixel: [u8; 4]) -> [f32; 2] {
        [pixel[0] as f32 / 255.0, pixel[1] as f32 / 255.0]
    }

    fn ensure_coords_framebuffer(&mut self, view: &ViewState) {
        let size = view.coords_framebuffer_size();
        if self
            .coords
            .as_ref()
            .is_some_and(|coords| coords.size == size)
        {
            return;
        }
        debug!(
            "allocating coords framebuffer {}x{}",
            size.width, size.height
        );

        let extent = wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        };
        let color_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("terrain.coords.color"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COORDS_TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("terrain.coords.color_view"),
            ..Default::default()
        });
        let depth_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("terrain.coords.depth"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("terrain.coords.depth_view"),
            ..Default::default()
        });
        self.coords = Some(CoordsFramebuffer {
            size,
            color_texture,
            color_view,
            depth_view,
        });
    }
}
