//! Shared terrain protocol types.
//!
//! This crate defines the plain-data vocabulary exchanged between the tile
//! resource store and the terrain painter: tile identifiers and their packed
//! keys, mesh-grid arithmetic, view/viewport descriptions, blend selection,
//! terrain options, and the coordinate-encoding index produced by the
//! picking pass.

const ZOOM_BITS: u64 = 8;
const AXIS_BITS: u64 = 28;

const Y_SHIFT: u64 = 0;
const X_SHIFT: u64 = AXIS_BITS;
const ZOOM_SHIFT: u64 = AXIS_BITS + AXIS_BITS;

const ZOOM_MASK: u64 = (1 << ZOOM_BITS) - 1;
const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;

/// Grid cell of map data at a zoom/x/y coordinate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// Packed tile identity used as a map key and as a picking index entry.
///
/// | zoom + 1 (8) | x (28) | y (28) |
/// 63           56 55    28 27     0
///
/// Zoom is biased by one so no real tile packs to the `EMPTY` sentinel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey(u64);

impl TileKey {
    pub const EMPTY: Self = TileKey(0);

    /// Highest zoom the biased 8-bit field can hold.
    pub const MAX_ZOOM: u8 = (ZOOM_MASK - 1) as u8;

    /// Zoom saturates at `MAX_ZOOM` so the biased field can never wrap back
    /// onto the `EMPTY` sentinel's zoom bits.
    pub fn new(id: TileId) -> Self {
        let zoom = id.z.min(Self::MAX_ZOOM) as u64 + 1;
        let x = id.x as u64 & AXIS_MASK;
        let y = id.y as u64 & AXIS_MASK;
        TileKey(zoom << ZOOM_SHIFT | x << X_SHIFT | y << Y_SHIFT)
    }

    pub fn tile_id(self) -> Option<TileId> {
        if self == Self::EMPTY {
            return None;
        }
        // Packed zoom bits are at least 1 for every key `new` can build.
        Some(TileId {
            z: (((self.0 >> ZOOM_SHIFT) & ZOOM_MASK) as u8).saturating_sub(1),
            x: ((self.0 >> X_SHIFT) & AXIS_MASK) as u32,
            y: ((self.0 >> Y_SHIFT) & AXIS_MASK) as u32,
        })
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl TileId {
    pub fn key(self) -> TileKey {
        TileKey::new(self)
    }
}

/// Vertex count of an NxN-quad elevation grid: `(N+1)^2`.
pub const fn grid_vertex_count(mesh_size: u32) -> usize {
    let edge = mesh_size as usize + 1;
    edge * edge
}

/// Index count of an NxN-quad grid triangulated as two triangles per quad.
pub const fn grid_index_count(mesh_size: u32) -> usize {
    mesh_size as usize * mesh_size as usize * 6
}

pub type TransformMatrix4x4 = [f32; 16];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Depth sub-range a pass is allowed to write, in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRange {
    pub min: f32,
    pub max: f32,
}

impl DepthRange {
    pub const FULL: Self = DepthRange { min: 0.0, max: 1.0 };
}

/// Color blend selection for the composite pass. The coordinate-encoding
/// pass always draws unblended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Unblended,
    Alpha,
    Multiply,
}

/// Numeric terrain configuration read at draw time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainOptions {
    /// Quads per tile edge of the shared mesh.
    pub mesh_size: u32,
    /// Multiplier applied to the tile size when allocating color targets.
    pub quality_factor: u32,
    /// Sea-level offset baked into DEM encodings, in meters.
    pub elevation_offset: f32,
}

impl Default for TerrainOptions {
    fn default() -> Self {
        Self {
            mesh_size: 128,
            quality_factor: 2,
            elevation_offset: 450.0,
        }
    }
}

/// Camera and framebuffer state for one frame, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Framebuffer size in physical pixels.
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f32,
    /// World-to-clip matrix, column major, world in [0, 1] mercator units.
    pub view_proj: TransformMatrix4x4,
    /// Depth range reserved for 3D content in the screen framebuffer.
    pub depth_range: DepthRange,
}

impl ViewState {
    /// Size of the coordinate-encoding framebuffer: logical pixels, so a
    /// picking read-back maps one-to-one to cursor positions.
    pub fn coords_framebuffer_size(&self) -> Viewport {
        Viewport {
            width: ((self.width as f32 / self.device_pixel_ratio) as u32).max(1),
            height: ((self.height as f32 / self.device_pixel_ratio) as u32).max(1),
        }
    }
}

/// Upper bound on tiles one coordinate-encoding pass can index: encoded
/// values are a single color channel counting down from 255.
pub const MAX_COORDS_ENTRIES: usize = 256;

/// Ordered tile-key list produced by one coordinate-encoding pass.
///
/// The i-th recorded tile (0-indexed) is drawn with encoded value `255 - i`.
/// The index is only valid for the exact pass invocation that produced it;
/// `revision` lets callers reject decodes against a superseded pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainCoordsIndex {
    revision: u64,
    keys: Vec<TileKey>,
}

impl TerrainCoordsIndex {
    pub fn new(revision: u64) -> Self {
        Self {
            revision,
            keys: Vec::new(),
        }
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Encoded value the next recorded tile will draw with, or `None` once
    /// the single-channel index space is exhausted.
    pub fn next_encoded_value(&self) -> Option<u8> {
        if self.keys.len() >= MAX_COORDS_ENTRIES {
            None
        } else {
            Some((MAX_COORDS_ENTRIES - 1 - self.keys.len()) as u8)
        }
    }

    pub fn record(&mut self, key: TileKey) {
        debug_assert!(self.keys.len() < MAX_COORDS_ENTRIES);
        self.keys.push(key);
    }

    /// Resolve an encoded channel value back to the tile that drew it.
    pub fn decode(&self, encoded: u8) -> Option<TileKey> {
        let index = MAX_COORDS_ENTRIES - 1 - encoded as usize;
        self.keys.get(index).copied()
    }

    pub fn keys(&self) -> &[TileKey] {
        &self.keys
    }
}
