//! Per-tile GPU resource store.
//!
//! Batch color textures and elevation vertex buffers are created lazily on
//! first use and live until the external tile cache evicts the tile;
//! nothing here is freed on frame boundaries.

use std::collections::HashMap;

use log::debug;
use terrain_protocol::TileKey;

use crate::pool::TargetHandle;

pub struct BatchTexture {
    size: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl BatchTexture {
    pub const fn size(&self) -> u32 {
        self.size
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// A fresh view for attaching to a pooled target. Views are cheap
    /// handles onto the same texture.
    pub fn attachment_view(&self) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("terrain_tiles.batch.attachment_view"),
            ..Default::default()
        })
    }
}

#[derive(Default)]
pub struct TileResources {
    batch_textures: Vec<Option<BatchTexture>>,
    elevation_buffer: Option<wgpu::Buffer>,
    elevation_sample_count: usize,
    target: Option<TargetHandle>,
    target_frame: Option<u64>,
}

impl TileResources {
    /// Ensures a color texture exists for `batch_slot` at exactly `size`.
    /// A size mismatch (tile resolution or quality factor changed) drops
    /// the cached texture and reallocates. Returns whether a texture was
    /// (re)created.
    pub fn ensure_batch_texture(
        &mut self,
        device: &wgpu::Device,
        batch_slot: usize,
        size: u32,
    ) -> bool {
        if self.batch_textures.len() <= batch_slot {
            self.batch_textures.resize_with(batch_slot + 1, || None);
        }
        if let Some(existing) = &self.batch_textures[batch_slot]
            && existing.size == size
        {
            return false;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("terrain_tiles.batch.color"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: crate::COLOR_TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("terrain_tiles.batch.color_view"),
            ..Default::default()
        });
        self.batch_textures[batch_slot] = Some(BatchTexture {
            size,
            texture,
            view,
        });
        true
    }

    pub fn batch_texture(&self, batch_slot: usize) -> Option<&BatchTexture> {
        self.batch_textures.get(batch_slot)?.as_ref()
    }

    /// Stores the elevation vertex buffer on first call; later calls are
    /// no-ops until the tile is evicted. Returns whether a buffer was
    /// created.
    pub fn ensure_elevation_buffer(
        &mut self,
        device: &wgpu::Device,
        samples: &[f32],
    ) -> bool {
        if self.elevation_buffer.is_some() {
            return false;
        }
        self.elevation_buffer = Some(crate::create_elevation_buffer(device, samples));
        self.elevation_sample_count = samples.len();
        true
    }

    pub fn elevation_buffer(&self) -> Option<&wgpu::Buffer> {
        self.elevation_buffer.as_ref()
    }

    pub const fn elevation_sample_count(&self) -> usize {
        self.elevation_sample_count
    }

    pub fn set_target(&mut self, handle: TargetHandle, frame: u64) {
        self.target = Some(handle);
        self.target_frame = Some(frame);
    }

    pub fn target(&self) -> Option<TargetHandle> {
        self.target
    }

    /// The pooled target already assigned to this tile in `frame`, if any.
    /// Lets repeat preparations within one frame reuse their slot instead
    /// of advancing the pool cursor.
    pub fn target_for_frame(&self, frame: u64) -> Option<TargetHandle> {
        if self.target_frame == Some(frame) {
            self.target
        } else {
            None
        }
    }
}

/// Tile key -> GPU resources, keyed by the external cache's tile identity.
#[derive(Default)]
pub struct TileResourceStore {
    tiles: HashMap<TileKey, TileResources>,
}

impl TileResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&mut self, key: TileKey) -> &mut TileResources {
        self.tiles.entry(key).or_default()
    }

    pub fn get(&self, key: TileKey) -> Option<&TileResources> {
        self.tiles.get(&key)
    }

    pub fn contains(&self, key: TileKey) -> bool {
        self.tiles.contains_key(&key)
    }

    /// Drops all GPU resources for an evicted tile. Resource lifetime
    /// follows tile lifetime, not frame lifetime.
    pub fn evict(&mut self, key: TileKey) -> bool {
        let removed = self.tiles.remove(&key).is_some();
        if removed {
            debug!("evicted terrain resources for tile key {:#x}", key.raw());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
