//! The map root and its read-only queries.

use std::collections::HashMap;
use std::path::PathBuf;

use bevy_math::{URect, UVec2, Vec2};

use crate::color::Color;
use crate::error::{TmxError, TmxResult};
use crate::gid::Gid;
use crate::model::layer::{Layer, ObjectGroup, TileLayer};
use crate::model::object::Object;
use crate::model::tileset::{TileData, Tileset};
use crate::properties::Properties;

string_enum! {
    Orientation {
        Orthogonal => "orthogonal",
        Isometric => "isometric",
        Staggered => "staggered",
        Hexagonal => "hexagonal",
    }
}

string_enum! {
    RenderOrder {
        RightDown => "right-down",
        RightUp => "right-up",
        LeftDown => "left-down",
        LeftUp => "left-up",
    }
}

string_enum! {
    StaggerAxis {
        Y => "y",
        X => "x",
    }
}

string_enum! {
    StaggerIndex {
        Odd => "odd",
        Even => "even",
    }
}

/// A fully loaded map.
///
/// `H` is the image handle type produced by the image loader used for the load;
/// [`Map::images`] holds one handle per gid (flag combinations included) that was
/// loaded.
#[derive(Debug, Clone)]
pub struct Map<H> {
    pub version: String,
    pub tiled_version: Option<String>,
    pub class: String,
    pub orientation: Orientation,
    pub render_order: RenderOrder,
    /// Size in tiles.
    pub width: u32,
    pub height: u32,
    /// Size of one grid cell in pixels.
    pub tile_width: u32,
    pub tile_height: u32,
    pub hex_side_length: Option<u32>,
    pub stagger_axis: Option<StaggerAxis>,
    pub stagger_index: Option<StaggerIndex>,
    pub background_color: Option<Color>,
    pub next_layer_id: u32,
    pub next_object_id: u32,
    pub infinite: bool,
    pub parallax_origin: Vec2,

    // ===== CONTENT =====
    pub layers: Vec<Layer<H>>,
    /// Ordered by `first_gid`.
    pub tilesets: Vec<Tileset>,
    pub images: HashMap<Gid, H>,
    pub properties: Properties,

    /// File the map was loaded from.
    pub source: Option<PathBuf>,
}

impl<H> Default for Map<H> {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            tiled_version: None,
            class: String::new(),
            orientation: Orientation::Orthogonal,
            render_order: RenderOrder::RightDown,
            width: 0,
            height: 0,
            tile_width: 0,
            tile_height: 0,
            hex_side_length: None,
            stagger_axis: None,
            stagger_index: None,
            background_color: None,
            next_layer_id: 0,
            next_object_id: 0,
            infinite: false,
            parallax_origin: Vec2::ZERO,
            layers: Vec::new(),
            tilesets: Vec::new(),
            images: HashMap::new(),
            properties: Properties::default(),
            source: None,
        }
    }
}

fn collect_layers<'a, H>(layers: &'a [Layer<H>], visible_only: bool, out: &mut Vec<&'a Layer<H>>) {
    for layer in layers {
        if visible_only && !layer.is_visible() {
            continue;
        }
        out.push(layer);
        if let Layer::Group(group) = layer {
            collect_layers(&group.layers, visible_only, out);
        }
    }
}

impl<H> Map<H> {
    /// Map size in pixels (orthogonal layout), saturating at `u32::MAX`.
    pub fn pixel_size(&self) -> UVec2 {
        UVec2::new(
            self.width.saturating_mul(self.tile_width),
            self.height.saturating_mul(self.tile_height),
        )
    }

    /// Pixel footprint of the cell at `(x, y)`, `None` outside the map.
    pub fn tile_rect(&self, x: u32, y: u32) -> Option<URect> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let (w, h) = (self.tile_width, self.tile_height);
        Some(URect::new(
            x.saturating_mul(w),
            y.saturating_mul(h),
            (x + 1).saturating_mul(w),
            (y + 1).saturating_mul(h),
        ))
    }

    // ===== LAYER QUERIES =====

    /// All layers depth-first, groups before their children.
    pub fn iter_layers(&self) -> impl Iterator<Item = &Layer<H>> {
        let mut out = Vec::new();
        collect_layers(&self.layers, false, &mut out);
        out.into_iter()
    }

    /// Visible layers depth-first; an invisible group hides its whole subtree.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer<H>> {
        let mut out = Vec::new();
        collect_layers(&self.layers, true, &mut out);
        out.into_iter()
    }

    pub fn tile_layers(&self) -> impl Iterator<Item = &TileLayer> {
        self.iter_layers().filter_map(Layer::as_tile_layer)
    }

    pub fn visible_tile_layers(&self) -> impl Iterator<Item = &TileLayer> {
        self.visible_layers().filter_map(Layer::as_tile_layer)
    }

    pub fn object_groups(&self) -> impl Iterator<Item = &ObjectGroup> {
        self.iter_layers().filter_map(Layer::as_object_group)
    }

    pub fn visible_object_groups(&self) -> impl Iterator<Item = &ObjectGroup> {
        self.visible_layers().filter_map(Layer::as_object_group)
    }

    pub fn layer_by_name(&self, name: &str) -> TmxResult<&Layer<H>> {
        self.iter_layers()
            .find(|layer| layer.name() == name)
            .ok_or_else(|| TmxError::LayerNotFound(name.to_string()))
    }

    /// Top-level tile layer by index.
    fn tile_layer_at(&self, layer: usize) -> TmxResult<&TileLayer> {
        let found = self
            .layers
            .get(layer)
            .ok_or_else(|| TmxError::LayerNotFound(format!("index {layer}")))?;
        found
            .as_tile_layer()
            .ok_or_else(|| TmxError::NotATileLayer(found.name().to_string()))
    }

    // ===== OBJECT QUERIES =====

    /// Every object of every object group, in layer order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.object_groups().flat_map(ObjectGroup::iter)
    }

    pub fn object_by_name(&self, name: &str) -> TmxResult<&Object> {
        self.objects()
            .find(|object| object.name == name)
            .ok_or_else(|| TmxError::ObjectNotFound(name.to_string()))
    }

    pub fn object_by_id(&self, id: u32) -> TmxResult<&Object> {
        self.objects()
            .find(|object| object.id == id)
            .ok_or_else(|| TmxError::ObjectNotFound(format!("id {id}")))
    }

    /// Image of a tile object.
    pub fn object_image(&self, object: &Object) -> Option<&H> {
        object.gid.and_then(|gid| self.tile_image_by_gid(gid))
    }

    // ===== TILE QUERIES =====

    pub fn tileset_for_gid(&self, gid: Gid) -> TmxResult<&Tileset> {
        let id = gid.id();
        self.tilesets
            .iter()
            .find(|tileset| tileset.contains_gid(id))
            .ok_or(TmxError::UnknownTile(id))
    }

    pub fn tileset_by_name(&self, name: &str) -> TmxResult<&Tileset> {
        self.tilesets
            .iter()
            .find(|tileset| tileset.name == name)
            .ok_or_else(|| TmxError::TilesetNotFound(name.to_string()))
    }

    /// Per-tile metadata for a gid, flags ignored.
    pub fn tile(&self, gid: Gid) -> Option<&TileData> {
        let tileset = self.tileset_for_gid(gid).ok()?;
        tileset.tile(tileset.local_id(gid.id())?)
    }

    /// Every tile with metadata, keyed by bare gid.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, &TileData)> {
        self.tilesets.iter().flat_map(|tileset| {
            tileset
                .tiles
                .iter()
                .map(|(&local_id, data)| (tileset.gid_of(local_id), data))
        })
    }

    pub fn tile_properties_by_gid(&self, gid: Gid) -> Option<&Properties> {
        self.tile(gid).map(|tile| &tile.properties)
    }

    /// Loaded image for an exact gid (flags included).
    pub fn tile_image_by_gid(&self, gid: Gid) -> Option<&H> {
        self.images.get(&gid)
    }

    /// Raw gid at `(x, y)` of the top-level tile layer `layer`.
    pub fn tile_gid(&self, x: u32, y: u32, layer: usize) -> TmxResult<Gid> {
        self.tile_layer_at(layer)?
            .get(x, y)
            .ok_or(TmxError::InvalidCoordinate { x, y, layer })
    }

    pub fn tile_image(&self, x: u32, y: u32, layer: usize) -> TmxResult<Option<&H>> {
        let gid = self.tile_gid(x, y, layer)?;
        Ok(self.tile_image_by_gid(gid))
    }

    pub fn tile_properties(&self, x: u32, y: u32, layer: usize) -> TmxResult<Option<&Properties>> {
        let gid = self.tile_gid(x, y, layer)?;
        Ok(self.tile_properties_by_gid(gid))
    }

    /// `(x, y, layer)` of every cell holding `gid` (exact match, flags included)
    /// on visible top-level tile layers.
    pub fn tile_locations_by_gid(&self, gid: Gid) -> impl Iterator<Item = (u32, u32, usize)> + '_ {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.is_visible())
            .filter_map(|(index, layer)| layer.as_tile_layer().map(|tiles| (index, tiles)))
            .flat_map(move |(index, tiles)| {
                tiles
                    .tiles()
                    .filter(move |&(_, _, cell)| cell == gid)
                    .map(move |(x, y, _)| (x, y, index))
            })
    }

    /// Distinct gids used by a top-level tile layer that carry tile properties.
    pub fn tile_properties_by_layer(&self, layer: usize) -> TmxResult<Vec<(Gid, &Properties)>> {
        let tiles = self.tile_layer_at(layer)?;
        let mut seen = Vec::new();
        let mut found = Vec::new();
        for (_, _, gid) in tiles.tiles() {
            if seen.contains(&gid) {
                continue;
            }
            seen.push(gid);
            if let Some(properties) = self.tile_properties_by_gid(gid) {
                found.push((gid, properties));
            }
        }
        Ok(found)
    }

    /// Collision groups declared on tiles, keyed by bare gid.
    pub fn tile_colliders(&self) -> impl Iterator<Item = (u32, &ObjectGroup)> {
        self.tiles()
            .filter_map(|(gid, tile)| tile.collision.as_ref().map(|group| (gid, group)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::layer::{GroupLayer, LayerInfo};
    use crate::properties::Property;

    fn info(name: &str, visible: bool) -> LayerInfo {
        LayerInfo {
            name: name.to_string(),
            visible,
            ..Default::default()
        }
    }

    fn sample_map() -> Map<&'static str> {
        let mut rock = TileData::new(1);
        rock.properties.insert(Property::new("name", "rock"));
        rock.collision = Some(ObjectGroup::default());

        let tileset = Tileset {
            first_gid: 1,
            name: "terrain".to_string(),
            tile_count: 4,
            tiles: BTreeMap::from([(1, rock)]),
            ..Default::default()
        };

        let ground = TileLayer {
            info: info("ground", true),
            width: 2,
            height: 2,
            data: vec![vec![Gid(1), Gid(2)], vec![Gid(0), Gid(2)]],
        };
        let hidden = TileLayer {
            info: info("hidden", false),
            width: 2,
            height: 2,
            data: vec![vec![Gid(2), Gid(0)], vec![Gid(0), Gid(0)]],
        };
        let spawn = Object {
            id: 7,
            name: "spawn".to_string(),
            gid: Some(Gid(2)),
            visible: true,
            ..Default::default()
        };
        let group = GroupLayer {
            info: info("things", false),
            layers: vec![Layer::Objects(ObjectGroup {
                info: info("entities", true),
                objects: vec![spawn],
                ..Default::default()
            })],
        };

        let mut map = Map {
            width: 2,
            height: 2,
            tile_width: 16,
            tile_height: 16,
            layers: vec![Layer::Tiles(ground), Layer::Tiles(hidden), Layer::Group(group)],
            tilesets: vec![tileset],
            ..Default::default()
        };
        map.images.insert(Gid(2), "rock.png");
        map
    }

    #[test]
    fn test_layer_by_name_recurses_into_groups() {
        let map = sample_map();
        assert!(map.layer_by_name("entities").is_ok());
        assert!(matches!(
            map.layer_by_name("nope"),
            Err(TmxError::LayerNotFound(_))
        ));
    }

    #[test]
    fn test_visible_layers_skip_hidden_subtrees() {
        let map = sample_map();
        let visible: Vec<_> = map.visible_layers().map(Layer::name).collect();
        assert_eq!(visible, vec!["ground"]);
        assert_eq!(map.iter_layers().count(), 4);
        assert_eq!(map.visible_object_groups().count(), 0);
        assert_eq!(map.object_groups().count(), 1);
    }

    #[test]
    fn test_object_lookup() {
        let map = sample_map();
        assert_eq!(map.object_by_name("spawn").unwrap().id, 7);
        assert_eq!(map.object_by_id(7).unwrap().name, "spawn");
        assert!(matches!(map.object_by_id(8), Err(TmxError::ObjectNotFound(_))));
        assert_eq!(map.object_image(map.object_by_id(7).unwrap()), Some(&"rock.png"));
    }

    #[test]
    fn test_tile_lookups() {
        let map = sample_map();
        assert_eq!(map.tile_gid(1, 0, 0).unwrap(), Gid(2));
        assert_eq!(map.tile_image(1, 1, 0).unwrap(), Some(&"rock.png"));
        assert_eq!(map.tile_image(0, 0, 0).unwrap(), None);
        assert_eq!(
            map.tile_properties(1, 0, 0).unwrap().and_then(|p| p.value("name")),
            Some("rock")
        );
        assert!(matches!(
            map.tile_gid(2, 0, 0),
            Err(TmxError::InvalidCoordinate { x: 2, y: 0, layer: 0 })
        ));
        assert!(matches!(map.tile_gid(0, 0, 2), Err(TmxError::NotATileLayer(_))));
        assert!(matches!(map.tile_gid(0, 0, 9), Err(TmxError::LayerNotFound(_))));
    }

    #[test]
    fn test_tileset_for_gid_ignores_flags() {
        let map = sample_map();
        assert_eq!(map.tileset_for_gid(Gid(0x8000_0002)).unwrap().name, "terrain");
        assert!(matches!(map.tileset_for_gid(Gid(5)), Err(TmxError::UnknownTile(5))));
    }

    #[test]
    fn test_tile_locations_skip_hidden_layers() {
        let map = sample_map();
        let locations: Vec<_> = map.tile_locations_by_gid(Gid(2)).collect();
        assert_eq!(locations, vec![(1, 0, 0), (1, 1, 0)]);
    }

    #[test]
    fn test_tile_properties_by_layer() {
        let map = sample_map();
        let found = map.tile_properties_by_layer(0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, Gid(2));
    }

    #[test]
    fn test_tile_colliders_and_rects() {
        let map = sample_map();
        let colliders: Vec<_> = map.tile_colliders().map(|(gid, _)| gid).collect();
        assert_eq!(colliders, vec![2]);
        assert_eq!(map.tile_rect(1, 1), Some(URect::new(16, 16, 32, 32)));
        assert_eq!(map.tile_rect(2, 0), None);
        assert_eq!(map.pixel_size(), UVec2::new(32, 32));
    }

    #[test]
    fn test_pixel_geometry_saturates() {
        let map: Map<()> = Map {
            width: 3,
            height: 1,
            tile_width: u32::MAX / 2,
            tile_height: 16,
            ..Default::default()
        };
        assert_eq!(map.pixel_size(), UVec2::new(u32::MAX, 16));
        assert_eq!(
            map.tile_rect(2, 0),
            Some(URect::new(u32::MAX - 1, 0, u32::MAX, 16))
        );
    }
}
