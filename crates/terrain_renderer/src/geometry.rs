//! Tile-to-clip-space geometry helpers.
//!
//! World space is the [0, 1] web-mercator square; a tile at zoom z covers
//! a `1 / 2^z` span. Elevation enters in meters and is scaled into world
//! units by the mercator circumference.

use terrain_protocol::{TileId, TransformMatrix4x4, ViewState};

/// Meters per world unit at the equator.
pub(crate) const METERS_PER_WORLD_UNIT: f32 = 40_075_016.7;

/// Meters of elevation mapped across the tile target's depth range.
pub(crate) const TILE_DEPTH_RANGE_METERS: f32 = 20_000.0;

/// Column-major 4x4 multiply, `a * b`.
pub(crate) fn matrix_multiply(
    a: &TransformMatrix4x4,
    b: &TransformMatrix4x4,
) -> TransformMatrix4x4 {
    let mut out = [0.0; 16];
    for column in 0..4 {
        for row in 0..4 {
            let mut sum = 0.0;
            for k in 0..4 {
                sum += a[k * 4 + row] * b[column * 4 + k];
            }
            out[column * 4 + row] = sum;
        }
    }
    out
}

/// Maps tile-local (u, v, elevation_m) into mercator world space.
pub(crate) fn tile_model_matrix(tile: TileId) -> TransformMatrix4x4 {
    // Power instead of a shift: every u8 zoom stays in range, deep zooms
    // underflow toward zero instead of overflowing.
    let span = 0.5f32.powi(tile.z as i32);
    let mut matrix = crate::IDENTITY_MATRIX;
    matrix[0] = span;
    matrix[5] = span;
    matrix[10] = 1.0 / METERS_PER_WORLD_UNIT;
    matrix[12] = tile.x as f32 * span;
    matrix[13] = tile.y as f32 * span;
    matrix
}

/// Tile-local (u, v, elevation_m) to clip space for the current view.
pub(crate) fn tile_clip_matrix(view: &ViewState, tile: TileId) -> TransformMatrix4x4 {
    matrix_multiply(&view.view_proj, &tile_model_matrix(tile))
}

/// Orthographic tile-local matrix for rendering into a tile's own target:
/// the unit square fills the target, y down, elevation mapped into depth so
/// higher content wins the `LEqual` test.
pub(crate) fn tile_target_matrix() -> TransformMatrix4x4 {
    let mut matrix = crate::IDENTITY_MATRIX;
    matrix[0] = 2.0;
    matrix[12] = -1.0;
    matrix[5] = -2.0;
    matrix[13] = 1.0;
    matrix[10] = -1.0 / TILE_DEPTH_RANGE_METERS;
    matrix[14] = 0.5;
    matrix
}
