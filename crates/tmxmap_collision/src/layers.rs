//! Collision rectangles from tile layer contents.

use bevy_math::{IRect, IVec2};
use tmxmap_core::error::{TmxError, TmxResult};
use tmxmap_core::gid::Gid;
use tmxmap_core::model::{Layer, Map, TileLayer};
use tracing::debug;

use crate::simplify::simplify;

/// Which tile layer to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSelector<'a> {
    /// Top-level layer index, counting every layer kind.
    Index(usize),
    /// First layer with this name, nested ones included.
    Name(&'a str),
}

/// Which cells of the layer become collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectFilter<'a> {
    /// Every non-empty cell.
    AnyTile,
    /// Cells holding this bare gid, whatever their flip flags.
    Gid(u32),
    /// Cells whose tile belongs to the named tileset.
    Tileset(&'a str),
}

/// Collision rectangles (in pixels) covering the matching cells of a tile layer.
///
/// # Errors
///
/// `LayerNotFound` / `NotATileLayer` for a bad layer selector, `TilesetNotFound`
/// for an unknown tileset name.
pub fn build_rects<H>(map: &Map<H>, layer: LayerSelector<'_>, filter: RectFilter<'_>) -> TmxResult<Vec<IRect>> {
    let tiles = select_layer(map, layer)?;

    let tileset = match filter {
        RectFilter::Tileset(name) => Some(map.tileset_by_name(name)?),
        _ => None,
    };
    let matches = |gid: Gid| match filter {
        RectFilter::AnyTile => true,
        RectFilter::Gid(id) => gid.id() == id,
        RectFilter::Tileset(_) => tileset.is_some_and(|tileset| tileset.contains_gid(gid.id())),
    };

    let points: Vec<IVec2> = tiles
        .tiles()
        .filter(|&(_, _, gid)| matches(gid))
        .map(|(x, y, _)| IVec2::new(x as i32, y as i32))
        .collect();
    let cell_count = points.len();
    let rects = simplify(points, map.tile_width as i32, map.tile_height as i32);

    debug!(
        "merged {} cells of layer '{}' into {} collision rects",
        cell_count,
        tiles.info.name,
        rects.len()
    );
    Ok(rects)
}

fn select_layer<'m, H>(map: &'m Map<H>, selector: LayerSelector<'_>) -> TmxResult<&'m TileLayer> {
    let layer: &Layer<H> = match selector {
        LayerSelector::Index(index) => map
            .layers
            .get(index)
            .ok_or_else(|| TmxError::LayerNotFound(format!("index {index}")))?,
        LayerSelector::Name(name) => map.layer_by_name(name)?,
    };
    layer
        .as_tile_layer()
        .ok_or_else(|| TmxError::NotATileLayer(layer.name().to_string()))
}
