//! Per-tile preparation and the clear pass.
//!
//! `prepare_terrain` is the only mutator of the render-target pool: it
//! lazily creates the tile's batch color texture and elevation vertex
//! buffer, acquires a pooled target for the frame, and attaches the batch
//! texture as the target's color attachment.

use log::{debug, trace};
use terrain_protocol::TileId;
use terrain_tiles::{TileSource, build_elevation_vertices};

use crate::{PrepareError, TerrainDrawError, TerrainPainter};

impl TerrainPainter {
    /// Resets the pool's per-frame slot cursors. Must run once per frame
    /// before the first `prepare_terrain`.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
        self.pool.begin_frame();
    }

    /// Ensures the tile's GPU resources exist and binds a pooled render
    /// target for this frame. Tiles whose DEM has not arrived are skipped
    /// with `PrepareError::DemUnavailable`; calling twice for the same
    /// tile without a resize allocates nothing new the second time and
    /// reuses the pool slot already assigned this frame, leaving the slot
    /// sequence of later tiles untouched.
    pub fn prepare_terrain(
        &mut self,
        source: &dyn TileSource,
        tile: TileId,
        batch_slot: usize,
    ) -> Result<(), PrepareError> {
        if source.dem(tile).is_none() {
            trace!("tile {tile:?} has no DEM yet; skipping this frame");
            return Err(PrepareError::DemUnavailable);
        }

        let options = source.options();
        let target_size = source.tile_size(tile) * options.quality_factor.max(1);
        let mesh_size = self.mesh.mesh_size();
        let key = tile.key();

        let resources = self.store.entry(key);
        if resources.ensure_batch_texture(&self.device, batch_slot, target_size) {
            debug!("created batch {batch_slot} color texture ({target_size}px) for {tile:?}");
        }
        if resources.elevation_buffer().is_none() {
            let samples =
                build_elevation_vertices(source, tile, mesh_size, options.elevation_offset);
            resources.ensure_elevation_buffer(&self.device, &samples);
            debug!("sampled {} elevations for {tile:?}", samples.len());
        }

        let handle = match resources
            .target_for_frame(self.frame)
            .filter(|assigned| assigned.size() == target_size)
        {
            Some(assigned) => assigned,
            None => self.pool.acquire(&self.device, target_size)?,
        };
        let attachment = resources
            .batch_texture(batch_slot)
            .expect("batch texture ensured above")
            .attachment_view();
        self.pool.attach(handle, attachment);
        resources.set_target(handle, self.frame);
        Ok(())
    }

    /// Resets the tile's render target: color to fully transparent, depth
    /// to the far plane.
    pub fn clear_terrain(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        tile: TileId,
    ) -> Result<(), TerrainDrawError> {
        let handle = self
            .store
            .get(tile.key())
            .and_then(|resources| resources.target())
            .ok_or(TerrainDrawError::NotPrepared)?;
        let target = self.pool.target(handle);
        let color_view = target.color_view().ok_or(TerrainDrawError::NotPrepared)?;

        let _clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("terrain.pass.clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view(),
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
        Ok(())
    }
}
