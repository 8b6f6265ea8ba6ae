//! Tile color pass and screen composite pass.

use log::trace;
use terrain_protocol::{BlendMode, TileId, ViewState};
use terrain_tiles::{TerrainMesh, TileSource};
use wgpu::util::DeviceExt;

use crate::geometry::{tile_clip_matrix, tile_target_matrix};
use crate::{TerrainDrawError, TerrainPainter, TerrainUniforms};

impl TerrainPainter {
    pub(crate) fn create_tile_bind_group(
        &self,
        uniforms: &TerrainUniforms,
        color_view: &wgpu::TextureView,
        dem_view: &wgpu::TextureView,
        label: &'static str,
    ) -> wgpu::BindGroup {
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("terrain.tile_uniforms"),
                contents: bytemuck::bytes_of(uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.pipelines.tile_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler_linear),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(dem_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler_nearest),
                },
            ],
        })
    }

    pub(crate) fn draw_mesh_segments(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_index_buffer(self.mesh.index_buffer().slice(..), TerrainMesh::INDEX_FORMAT);
        pass.set_vertex_buffer(0, self.mesh.vertex_buffer().slice(..));
        for segment in self.mesh.segments() {
            pass.draw_indexed(
                segment.index_offset..segment.index_offset + segment.index_count,
                0,
                0..1,
            );
        }
    }

    /// Draws the tile's base color content into its prepared render
    /// target, displaced by elevation. Returns `false` without drawing for
    /// tiles that carry no color content.
    pub fn tile_color_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        source: &dyn TileSource,
        tile: TileId,
    ) -> Result<bool, TerrainDrawError> {
        let resources = self
            .store
            .get(tile.key())
            .ok_or(TerrainDrawError::NotPrepared)?;
        let handle = resources.target().ok_or(TerrainDrawError::NotPrepared)?;
        let elevation_buffer = resources
            .elevation_buffer()
            .ok_or(TerrainDrawError::NotPrepared)?;
        let dem = source.dem(tile).ok_or(TerrainDrawError::NotPrepared)?;
        let Some(base_color) = source.color_texture_view(tile) else {
            return Ok(false);
        };

        let target = self.pool.target(handle);
        let target_color = target.color_view().ok_or(TerrainDrawError::NotPrepared)?;

        let options = source.options();
        let uniforms = TerrainUniforms {
            matrix: tile_target_matrix(),
            dem_transform: dem.transform,
            dem_unpack: dem.unpack,
            params: [0.0, options.elevation_offset, 1.0, 0.0],
        };
        let bind_group =
            self.create_tile_bind_group(&uniforms, base_color, dem.view, "terrain.bind.tile_color");

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("terrain.pass.tile_color"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target_color,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(&self.pipelines.tile_color);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(1, elevation_buffer.slice(..));
        self.draw_mesh_segments(&mut pass);
        Ok(true)
    }

    /// Composites every renderable tile's pre-rendered color target onto
    /// the screen framebuffer, re-applying elevation displacement. Depth
    /// writes are confined to the view's 3D depth range. Returns the
    /// number of tiles drawn; unprepared tiles are skipped.
    pub fn draw_terrain(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        source: &dyn TileSource,
        view: &ViewState,
        screen_color: &wgpu::TextureView,
        screen_depth: &wgpu::TextureView,
        blend: BlendMode,
    ) -> usize {
        let tiles = source.renderable_tiles(view);
        let mut pass = self.begin_composite_pass(encoder, view, screen_color, screen_depth);
        pass.set_pipeline(self.composite_pipeline_for(blend));
        let mut drawn = 0;
        for tile in tiles {
            if self.composite_tile_in_pass(&mut pass, source, view, tile) {
                drawn += 1;
            }
        }
        trace!("terrain composite pass drew {drawn} tiles");
        drawn
    }

    /// Composites a single tile; the renderable set is not consulted.
    pub fn draw_terrain_tile(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        source: &dyn TileSource,
        view: &ViewState,
        screen_color: &wgpu::TextureView,
        screen_depth: &wgpu::TextureView,
        blend: BlendMode,
        tile: TileId,
    ) -> Result<(), TerrainDrawError> {
        let mut pass = self.begin_composite_pass(encoder, view, screen_color, screen_depth);
        pass.set_pipeline(self.composite_pipeline_for(blend));
        if self.composite_tile_in_pass(&mut pass, source, view, tile) {
            Ok(())
        } else {
            Err(TerrainDrawError::NotPrepared)
        }
    }

    fn begin_composite_pass<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        view: &ViewState,
        screen_color: &wgpu::TextureView,
        screen_depth: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("terrain.pass.composite"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: screen_color,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: screen_depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_viewport(
            0.0,
            0.0,
            view.width as f32,
            view.height as f32,
            view.depth_range.min,
            view.depth_range.max,
        );
        pass
    }

    fn composite_tile_in_pass(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        source: &dyn TileSource,
        view: &ViewState,
        tile: TileId,
    ) -> bool {
        let Some(resources) = self.store.get(tile.key()) else {
            return false;
        };
        let (Some(handle), Some(elevation_buffer)) =
            (resources.target(), resources.elevation_buffer())
        else {
            return false;
        };
        let Some(target_color) = self.pool.target(handle).color_view() else {
            return false;
        };
        let Some(dem) = source.dem(tile) else {
            return false;
        };

        let options = source.options();
        let uniforms = TerrainUniforms {
            matrix: tile_clip_matrix(view, tile),
            dem_transform: dem.transform,
            dem_unpack: dem.unpack,
            params: [0.0, options.elevation_offset, 1.0, 0.0],
        };
        let bind_group =
            self.create_tile_bind_group(&uniforms, target_color, dem.view, "terrain.bind.composite");
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(1, elevation_buffer.slice(..));
        self.draw_mesh_segments(pass);
        true
    }
}
