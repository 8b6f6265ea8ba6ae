//! Render-target pool.
//!
//! Off-screen color+depth targets keyed by tile resolution. Each distinct
//! size owns a persistent slot stack that grows on demand and is never
//! destroyed mid-session; a per-frame cursor hands out slot 0, 1, 2, ... in
//! renderable-tile order so concurrent tiles of equal size get distinct
//! targets within the same frame.

use std::collections::HashMap;

use log::debug;

/// Stable reference to one pooled target: `(size, slot)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle {
    size: u32,
    slot: u32,
}

impl TargetHandle {
    pub const fn size(self) -> u32 {
        self.size
    }

    pub const fn slot(self) -> u32 {
        self.slot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAcquireError {
    SizeZero,
    SizeExceedsDeviceLimit { size: u32, limit: u32 },
}

/// One pooled framebuffer: a persistent depth attachment plus whichever
/// color attachment is currently bound. Re-attaching color invalidates any
/// content previously rendered under the old attachment.
pub struct PooledTarget {
    size: u32,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    color_view: Option<wgpu::TextureView>,
}

impl PooledTarget {
    pub const fn size(&self) -> u32 {
        self.size
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn color_view(&self) -> Option<&wgpu::TextureView> {
        self.color_view.as_ref()
    }

    pub fn depth_texture(&self) -> &wgpu::Texture {
        &self.depth_texture
    }
}

#[derive(Default)]
pub struct RenderTargetPool {
    stacks: HashMap<u32, Vec<PooledTarget>>,
    cursors: HashMap<u32, u32>,
}

impl RenderTargetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the per-size slot cursors. Must run once per frame before the
    /// first `acquire`; pooled targets themselves survive across frames.
    pub fn begin_frame(&mut self) {
        self.cursors.clear();
    }

    /// Hands out the next slot for `size`, creating its depth attachment on
    /// first use. Existing entries are reused as-is and never resized.
    pub fn acquire(
        &mut self,
        device: &wgpu::Device,
        size: u32,
    ) -> Result<TargetHandle, TargetAcquireError> {
        if size == 0 {
            return Err(TargetAcquireError::SizeZero);
        }
        let limit = device.limits().max_texture_dimension_2d;
        if size > limit {
            return Err(TargetAcquireError::SizeExceedsDeviceLimit { size, limit });
        }

        let cursor = self.cursors.entry(size).or_insert(0);
        let slot = *cursor;
        *cursor += 1;

        let stack = self.stacks.entry(size).or_default();
        if stack.len() <= slot as usize {
            debug!("render-target pool grows: size {size}, slot {slot}");
            let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("terrain_tiles.pool.depth"),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: crate::DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("terrain_tiles.pool.depth_view"),
                ..Default::default()
            });
            stack.push(PooledTarget {
                size,
                depth_texture,
                depth_view,
                color_view: None,
            });
        }
        Ok(TargetHandle { size, slot })
    }

    /// Rebinds the color attachment of a pooled target without touching its
    /// depth buffer.
    pub fn attach(&mut self, handle: TargetHandle, color_view: wgpu::TextureView) {
        let target = self
            .stacks
            .get_mut(&handle.size)
            .and_then(|stack| stack.get_mut(handle.slot as usize))
            .expect("attach on a handle this pool issued");
        target.color_view = Some(color_view);
    }

    pub fn target(&self, handle: TargetHandle) -> &PooledTarget {
        self.stacks
            .get(&handle.size)
            .and_then(|stack| stack.get(handle.slot as usize))
            .expect("lookup on a handle this pool issued")
    }

    /// Total pooled entries across all sizes, for growth assertions.
    pub fn entry_count(&self) -> usize {
        self.stacks.values().map(Vec::len).sum()
    }
}
