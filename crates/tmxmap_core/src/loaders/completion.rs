//! The completion table: what happens when a child element closes inside its parent.

use bevy_math::Vec2;
use tracing::{debug, warn};

use crate::data::{reshape, unpack_with};
use crate::error::{TmxError, TmxResult};
use crate::gid::{GID_MASK, Gid};
use crate::loaders::builder::ParseContext;
use crate::loaders::nodes::{DataNode, ElementKind, Node};
use crate::model::{Layer, Map, Object, ObjectShape, TileLayer, Tileset};
use crate::properties::{Properties, PropertyType};

/// Link a finished child into its parent.
///
/// # Errors
///
/// `UnknownRelationship` for any pairing not listed here, plus whatever the
/// individual rule can fail with.
pub(crate) fn attach<H>(parent: &mut Node<H>, child: Node<H>, ctx: &mut ParseContext<'_>) -> TmxResult<()> {
    let parent_kind = parent.kind();
    match (parent, child) {
        // ===== MAP =====
        (Node::Map(map), Node::Tileset(tileset)) => add_tileset(map, *tileset, ctx)?,
        (Node::Map(map), Node::Layer(layer)) => map.layers.push(Layer::Tiles(finish_tile_layer(*layer))),
        (Node::Map(map), Node::ObjectGroup(group)) => map.layers.push(Layer::Objects(*group)),
        (Node::Map(map), Node::ImageLayer(layer)) => map.layers.push(Layer::Image(*layer)),
        (Node::Map(map), Node::Group(group)) => map.layers.push(Layer::Group(*group)),
        (Node::Map(map), Node::Properties(properties)) => {
            set_properties(ElementKind::Map, &mut map.properties, properties, ctx)?;
        }
        (Node::Map(_), Node::Editor(ElementKind::EditorSettings))
        | (
            Node::Editor(ElementKind::EditorSettings),
            Node::Editor(ElementKind::ChunkSize | ElementKind::Export),
        ) => {}

        // ===== TILESET =====
        (Node::Tileset(tileset), Node::TileOffset(offset)) => tileset.tile_offset = offset,
        (Node::Tileset(tileset), Node::Grid(grid)) => tileset.grid = Some(grid),
        (Node::Tileset(tileset), Node::Transformations(transformations)) => {
            tileset.transformations = Some(transformations);
        }
        (Node::Tileset(tileset), Node::Image(image)) => {
            if image.width.is_none() || image.height.is_none() {
                return Err(TmxError::MissingAttribute {
                    element: "image",
                    attribute: if image.width.is_none() { "width" } else { "height" },
                });
            }
            tileset.image = Some(image);
            if let Some(regions) = tileset.regions() {
                if regions.len() == 0 {
                    warn!("tileset '{}' image is smaller than one tile", tileset.name);
                }
                if tileset.columns == 0 {
                    tileset.columns = regions.columns();
                }
                if tileset.tile_count == 0 {
                    tileset.tile_count = u32::try_from(regions.len()).unwrap_or(u32::MAX);
                }
            }
        }
        (Node::Tileset(tileset), Node::Tile(tile)) => {
            tileset.tiles.insert(tile.id, *tile);
        }
        (Node::Tileset(tileset), Node::Properties(properties)) => {
            set_properties(ElementKind::Tileset, &mut tileset.properties, properties, ctx)?;
        }

        // ===== TILE =====
        (Node::Tile(tile), Node::Image(image)) => tile.image = Some(image),
        (Node::Tile(tile), Node::Animation(frames)) => tile.animation = frames,
        (Node::Tile(tile), Node::ObjectGroup(group)) => tile.collision = Some(*group),
        (Node::Tile(tile), Node::Properties(properties)) => {
            set_properties(ElementKind::Tile, &mut tile.properties, properties, ctx)?;
        }
        (Node::Animation(frames), Node::Frame(frame)) => frames.push(frame),

        // ===== TILE LAYER =====
        (Node::Layer(layer), Node::Data(data)) => fill_layer(layer, data)?,
        (Node::Layer(layer), Node::Properties(properties)) => {
            set_properties(ElementKind::Layer, &mut layer.info.properties, properties, ctx)?;
        }
        (Node::Data(data), Node::DataTile(gid)) => data.tiles.push(gid.raw()),

        // ===== OBJECTS =====
        (Node::ObjectGroup(group), Node::Object(object)) => group.objects.push(*object),
        (Node::ObjectGroup(group), Node::Properties(properties)) => {
            set_properties(ElementKind::ObjectGroup, &mut group.info.properties, properties, ctx)?;
        }
        (Node::Object(object), Node::Ellipse) => object.shape = ObjectShape::Ellipse,
        (Node::Object(object), Node::Point) => object.shape = ObjectShape::Point,
        (Node::Object(object), Node::Polygon(points)) => {
            fit_to_points(object, &points);
            object.shape = ObjectShape::Polygon { points };
        }
        (Node::Object(object), Node::Polyline(points)) => {
            fit_to_points(object, &points);
            object.shape = ObjectShape::Polyline { points };
        }
        (Node::Object(object), Node::Text(text)) => object.shape = ObjectShape::Text(text),
        (Node::Object(object), Node::Properties(properties)) => {
            set_properties(ElementKind::Object, &mut object.properties, properties, ctx)?;
        }

        // ===== IMAGE LAYERS AND GROUPS =====
        (Node::ImageLayer(layer), Node::Image(image)) => layer.source = Some(image),
        (Node::ImageLayer(layer), Node::Properties(properties)) => {
            set_properties(ElementKind::ImageLayer, &mut layer.info.properties, properties, ctx)?;
        }
        (Node::Group(group), Node::Layer(layer)) => {
            group.layers.push(Layer::Tiles(finish_tile_layer(*layer)));
        }
        (Node::Group(group), Node::ObjectGroup(child)) => group.layers.push(Layer::Objects(*child)),
        (Node::Group(group), Node::ImageLayer(child)) => group.layers.push(Layer::Image(*child)),
        (Node::Group(group), Node::Group(child)) => group.layers.push(Layer::Group(*child)),
        (Node::Group(group), Node::Properties(properties)) => {
            set_properties(ElementKind::Group, &mut group.info.properties, properties, ctx)?;
        }

        // ===== PROPERTIES =====
        (Node::Properties(properties), Node::Property(node)) => {
            properties.insert(node.into_property());
        }
        (Node::Property(node), Node::Properties(members)) => {
            node.property.property_type = PropertyType::Class;
            node.property.members = members;
        }

        (_, child) => {
            return Err(TmxError::UnknownRelationship {
                parent: parent_kind.name(),
                child: child.kind().name(),
            });
        }
    }
    Ok(())
}

/// Check reserved names, then merge the properties into their owner.
///
/// A repeated `<properties>` block adds to the earlier ones; same-named entries
/// take the later value.
fn set_properties(
    owner: ElementKind,
    target: &mut Properties,
    properties: Properties,
    ctx: &ParseContext<'_>,
) -> TmxResult<()> {
    if !ctx.config.allow_reserved_property_names {
        let reserved = owner.reserved_property_names();
        if let Some(name) = properties.names().find(|name| reserved.contains(name)) {
            return Err(TmxError::ReservedPropertyName {
                element: owner.name(),
                property: name.to_string(),
            });
        }
    }
    target.extend(properties);
    Ok(())
}

/// Claim the tileset's gid range, assigning `first_gid` when the document left it out.
fn add_tileset<H>(map: &mut Map<H>, mut tileset: Tileset, ctx: &mut ParseContext<'_>) -> TmxResult<()> {
    if tileset.image.is_none() {
        // image collections may have gaps in their ids
        let past_last_id = tileset.tiles.keys().next_back().map_or(0, |id| id.saturating_add(1));
        tileset.tile_count = tileset.tile_count.max(past_last_id);
    }

    if tileset.first_gid == 0 {
        tileset.first_gid = ctx.next_gid;
    } else if tileset.first_gid < ctx.next_gid {
        return Err(TmxError::OverlappingTileset {
            name: tileset.name,
            first_gid: tileset.first_gid,
            next_free: ctx.next_gid,
        });
    }
    let end_gid = tileset
        .first_gid
        .checked_add(tileset.tile_count)
        .filter(|&end| tileset.first_gid <= GID_MASK && end <= GID_MASK + 1);
    let Some(end_gid) = end_gid else {
        return Err(TmxError::GidRangeOverflow {
            name: tileset.name,
            first_gid: tileset.first_gid,
            tile_count: tileset.tile_count,
        });
    };
    ctx.next_gid = end_gid;

    debug!(
        "tileset '{}' covers gids {}..{}",
        tileset.name,
        tileset.first_gid,
        tileset.end_gid()
    );
    map.tilesets.push(tileset);
    Ok(())
}

/// Decode `<data>` into the layer grid.
fn fill_layer(layer: &mut TileLayer, data: DataNode) -> TmxResult<()> {
    let gids = match data.encoding {
        Some(encoding) => unpack_with(&data.text, encoding, data.compression)?,
        None => data.tiles,
    };
    layer.data = reshape(&layer.info.name, gids, layer.width, layer.height)?;
    debug!(
        "layer '{}' decoded ({}x{})",
        layer.info.name, layer.width, layer.height
    );
    Ok(())
}

/// A layer without `<data>` is all empty cells.
fn finish_tile_layer(mut layer: TileLayer) -> TileLayer {
    if layer.data.is_empty() {
        layer.data = vec![vec![Gid::EMPTY; layer.width as usize]; layer.height as usize];
    }
    layer
}

/// Polygon/polyline objects carry no size of their own; use the points' extent
/// around the origin.
fn fit_to_points(object: &mut Object, points: &[Vec2]) {
    if object.width != 0.0 || object.height != 0.0 {
        return;
    }
    let (min, max) = points.iter().fold(
        (Vec2::ZERO, Vec2::ZERO),
        |(min, max), &point| (min.min(point), max.max(point)),
    );
    object.width = max.x - min.x;
    object.height = max.y - min.y;
}
