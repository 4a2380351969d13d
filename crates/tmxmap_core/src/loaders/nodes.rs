//! Element kinds, the typed node built for each element, and the construction
//! table mapping an opening tag to its node.

use bevy_math::{IVec2, Vec2};
use tracing::debug;

use crate::color::Color;
use crate::data::{Compression, Encoding};
use crate::error::{TmxError, TmxResult};
use crate::gid::Gid;
use crate::loaders::attributes::{Attributes, PointList, resolve_path};
use crate::loaders::builder::{ParseContext, PendingTileObject, parse_document};
use crate::model::{
    Frame, GroupLayer, ImageLayer, ImageSource, LayerInfo, Map, Object, ObjectGroup, ObjectShape,
    TextShape, TileData, TileLayer, TileTransformations, Tileset, TilesetGrid,
};
use crate::properties::{Properties, Property, PropertyType};

/// Every element name the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ElementKind {
    Map,
    EditorSettings,
    ChunkSize,
    Export,
    Tileset,
    TileOffset,
    Grid,
    Transformations,
    Tile,
    Image,
    Layer,
    Data,
    Chunk,
    ObjectGroup,
    Object,
    Ellipse,
    Point,
    Polygon,
    Polyline,
    Text,
    ImageLayer,
    Group,
    Properties,
    Property,
    Animation,
    Frame,
}

impl ElementKind {
    const ALL: [ElementKind; 26] = [
        ElementKind::Map,
        ElementKind::EditorSettings,
        ElementKind::ChunkSize,
        ElementKind::Export,
        ElementKind::Tileset,
        ElementKind::TileOffset,
        ElementKind::Grid,
        ElementKind::Transformations,
        ElementKind::Tile,
        ElementKind::Image,
        ElementKind::Layer,
        ElementKind::Data,
        ElementKind::Chunk,
        ElementKind::ObjectGroup,
        ElementKind::Object,
        ElementKind::Ellipse,
        ElementKind::Point,
        ElementKind::Polygon,
        ElementKind::Polyline,
        ElementKind::Text,
        ElementKind::ImageLayer,
        ElementKind::Group,
        ElementKind::Properties,
        ElementKind::Property,
        ElementKind::Animation,
        ElementKind::Frame,
    ];

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub(crate) const fn name(self) -> &'static str {
        match self {
            ElementKind::Map => "map",
            ElementKind::EditorSettings => "editorsettings",
            ElementKind::ChunkSize => "chunksize",
            ElementKind::Export => "export",
            ElementKind::Tileset => "tileset",
            ElementKind::TileOffset => "tileoffset",
            ElementKind::Grid => "grid",
            ElementKind::Transformations => "transformations",
            ElementKind::Tile => "tile",
            ElementKind::Image => "image",
            ElementKind::Layer => "layer",
            ElementKind::Data => "data",
            ElementKind::Chunk => "chunk",
            ElementKind::ObjectGroup => "objectgroup",
            ElementKind::Object => "object",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Point => "point",
            ElementKind::Polygon => "polygon",
            ElementKind::Polyline => "polyline",
            ElementKind::Text => "text",
            ElementKind::ImageLayer => "imagelayer",
            ElementKind::Group => "group",
            ElementKind::Properties => "properties",
            ElementKind::Property => "property",
            ElementKind::Animation => "animation",
            ElementKind::Frame => "frame",
        }
    }

    /// Field names a custom property of this element may not reuse.
    pub(crate) const fn reserved_property_names(self) -> &'static [&'static str] {
        match self {
            ElementKind::Map => &[
                "version", "tiledversion", "class", "orientation", "renderorder", "width",
                "height", "tilewidth", "tileheight", "hexsidelength", "staggeraxis",
                "staggerindex", "backgroundcolor", "nextlayerid", "nextobjectid", "infinite",
                "layers", "tilesets", "images", "properties",
            ],
            ElementKind::Tileset => &[
                "firstgid", "source", "name", "class", "tilewidth", "tileheight", "spacing",
                "margin", "tilecount", "columns", "objectalignment", "tileoffset", "grid",
                "image", "tiles", "properties",
            ],
            ElementKind::Tile => &[
                "id", "class", "type", "probability", "image", "animation", "properties",
            ],
            ElementKind::Layer => &[
                "id", "name", "class", "opacity", "visible", "locked", "tintcolor", "offsetx",
                "offsety", "parallaxx", "parallaxy", "width", "height", "data", "properties",
            ],
            ElementKind::ObjectGroup => &[
                "id", "name", "class", "opacity", "visible", "locked", "tintcolor", "offsetx",
                "offsety", "parallaxx", "parallaxy", "color", "draworder", "objects",
                "properties",
            ],
            ElementKind::ImageLayer => &[
                "id", "name", "class", "opacity", "visible", "locked", "tintcolor", "offsetx",
                "offsety", "parallaxx", "parallaxy", "image", "repeatx", "repeaty",
                "properties",
            ],
            ElementKind::Group => &[
                "id", "name", "class", "opacity", "visible", "locked", "tintcolor", "offsetx",
                "offsety", "parallaxx", "parallaxy", "layers", "properties",
            ],
            ElementKind::Object => &[
                "id", "name", "class", "type", "x", "y", "width", "height", "rotation",
                "visible", "gid", "template", "points", "properties",
            ],
            _ => &[],
        }
    }
}

/// Payload of a `<data>` element while it is open.
#[derive(Debug)]
pub(crate) struct DataNode {
    pub encoding: Option<Encoding>,
    pub compression: Option<Compression>,
    pub text: String,
    /// Gids from `<tile>` children when there is no encoding.
    pub tiles: Vec<u32>,
}

/// A `<property>` while it is open; the value may still arrive as text.
#[derive(Debug)]
pub(crate) struct PropertyNode {
    pub property: Property,
    pub has_value_attribute: bool,
}

impl PropertyNode {
    pub(crate) fn into_property(self) -> Property {
        self.property
    }
}

/// One node per open element.
#[derive(Debug)]
pub(crate) enum Node<H> {
    Map(Box<Map<H>>),
    /// `editorsettings`, `chunksize`, `export`: accepted, not modelled.
    Editor(ElementKind),
    Tileset(Box<Tileset>),
    TileOffset(IVec2),
    Grid(TilesetGrid),
    Transformations(TileTransformations),
    Tile(Box<TileData>),
    /// `<tile>` inside `<data>`.
    DataTile(Gid),
    Image(ImageSource),
    Layer(Box<TileLayer>),
    Data(DataNode),
    ObjectGroup(Box<ObjectGroup>),
    Object(Box<Object>),
    Ellipse,
    Point,
    Polygon(Vec<Vec2>),
    Polyline(Vec<Vec2>),
    Text(Box<TextShape>),
    ImageLayer(Box<ImageLayer<H>>),
    Group(Box<GroupLayer<H>>),
    Properties(Properties),
    Property(PropertyNode),
    Animation(Vec<Frame>),
    Frame(Frame),
}

impl<H> Node<H> {
    pub(crate) fn kind(&self) -> ElementKind {
        match self {
            Node::Map(_) => ElementKind::Map,
            Node::Editor(kind) => *kind,
            Node::Tileset(_) => ElementKind::Tileset,
            Node::TileOffset(_) => ElementKind::TileOffset,
            Node::Grid(_) => ElementKind::Grid,
            Node::Transformations(_) => ElementKind::Transformations,
            Node::Tile(_) | Node::DataTile(_) => ElementKind::Tile,
            Node::Image(_) => ElementKind::Image,
            Node::Layer(_) => ElementKind::Layer,
            Node::Data(_) => ElementKind::Data,
            Node::ObjectGroup(_) => ElementKind::ObjectGroup,
            Node::Object(_) => ElementKind::Object,
            Node::Ellipse => ElementKind::Ellipse,
            Node::Point => ElementKind::Point,
            Node::Polygon(_) => ElementKind::Polygon,
            Node::Polyline(_) => ElementKind::Polyline,
            Node::Text(_) => ElementKind::Text,
            Node::ImageLayer(_) => ElementKind::ImageLayer,
            Node::Group(_) => ElementKind::Group,
            Node::Properties(_) => ElementKind::Properties,
            Node::Property(_) => ElementKind::Property,
            Node::Animation(_) => ElementKind::Animation,
            Node::Frame(_) => ElementKind::Frame,
        }
    }

    /// Append character data. Only text-bearing elements keep it.
    pub(crate) fn push_text(&mut self, text: &str) {
        match self {
            Node::Data(data) => data.text.push_str(text),
            Node::Property(node) if !node.has_value_attribute => node.property.value.push_str(text),
            Node::Text(shape) => shape.text.push_str(text),
            _ => {}
        }
    }
}

/// Build the node for an opening tag.
///
/// `stack` is the chain of currently open ancestors, outermost first.
pub(crate) fn construct<H>(
    kind: ElementKind,
    attrs: Attributes,
    stack: &[Node<H>],
    ctx: &mut ParseContext<'_>,
) -> TmxResult<Node<H>> {
    match kind {
        ElementKind::Map => new_map(attrs),
        ElementKind::EditorSettings => {
            attrs.finish()?;
            Ok(Node::Editor(kind))
        }
        ElementKind::ChunkSize | ElementKind::Export => {
            let mut attrs = attrs;
            attrs.ignore(&["width", "height", "target", "format"]);
            attrs.finish()?;
            Ok(Node::Editor(kind))
        }
        ElementKind::Tileset => new_tileset(attrs, ctx),
        ElementKind::TileOffset => new_tile_offset(attrs),
        ElementKind::Grid => new_grid(attrs),
        ElementKind::Transformations => new_transformations(attrs),
        ElementKind::Tile => match stack.last() {
            Some(Node::Data(_)) => new_data_tile(attrs),
            _ => new_tile(attrs),
        },
        ElementKind::Image => new_image(attrs, ctx),
        ElementKind::Layer => new_layer(attrs, stack),
        ElementKind::Data => new_data(attrs),
        ElementKind::Chunk => Err(TmxError::UnsupportedFeature(
            "infinite maps (chunked layer data)".to_string(),
        )),
        ElementKind::ObjectGroup => new_object_group(attrs),
        ElementKind::Object => new_object(attrs, ctx),
        ElementKind::Ellipse => {
            attrs.finish()?;
            Ok(Node::Ellipse)
        }
        ElementKind::Point => {
            attrs.finish()?;
            Ok(Node::Point)
        }
        ElementKind::Polygon => {
            let mut attrs = attrs;
            let PointList(points) = attrs.required("points")?;
            attrs.finish()?;
            Ok(Node::Polygon(points))
        }
        ElementKind::Polyline => {
            let mut attrs = attrs;
            let PointList(points) = attrs.required("points")?;
            attrs.finish()?;
            Ok(Node::Polyline(points))
        }
        ElementKind::Text => new_text(attrs),
        ElementKind::ImageLayer => new_image_layer(attrs),
        ElementKind::Group => {
            let mut attrs = attrs;
            let info = layer_info(&mut attrs)?;
            attrs.finish()?;
            Ok(Node::Group(Box::new(GroupLayer {
                info,
                layers: Vec::new(),
            })))
        }
        ElementKind::Properties => {
            attrs.finish()?;
            Ok(Node::Properties(Properties::new()))
        }
        ElementKind::Property => new_property(attrs),
        ElementKind::Animation => {
            attrs.finish()?;
            Ok(Node::Animation(Vec::new()))
        }
        ElementKind::Frame => {
            let mut attrs = attrs;
            let frame = Frame {
                tile_id: attrs.required("tileid")?,
                duration: attrs.required("duration")?,
            };
            attrs.finish()?;
            Ok(Node::Frame(frame))
        }
    }
}

fn new_map<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let map = Map {
        version: attrs.or("version", "1.0".to_string())?,
        tiled_version: attrs.optional("tiledversion")?,
        class: attrs.or("class", String::new())?,
        orientation: attrs.or("orientation", Default::default())?,
        render_order: attrs.or("renderorder", Default::default())?,
        width: attrs.required("width")?,
        height: attrs.required("height")?,
        tile_width: attrs.required("tilewidth")?,
        tile_height: attrs.required("tileheight")?,
        hex_side_length: attrs.optional("hexsidelength")?,
        stagger_axis: attrs.optional("staggeraxis")?,
        stagger_index: attrs.optional("staggerindex")?,
        background_color: attrs.optional("backgroundcolor")?,
        next_layer_id: attrs.or("nextlayerid", 0)?,
        next_object_id: attrs.or("nextobjectid", 0)?,
        infinite: attrs.or("infinite", false)?,
        parallax_origin: Vec2::new(
            attrs.or("parallaxoriginx", 0.0)?,
            attrs.or("parallaxoriginy", 0.0)?,
        ),
        ..Map::default()
    };
    attrs.ignore(&["compressionlevel"]);
    attrs.finish()?;
    Ok(Node::Map(Box::new(map)))
}

fn new_tileset<H>(mut attrs: Attributes, ctx: &mut ParseContext<'_>) -> TmxResult<Node<H>> {
    let first_gid = attrs.or("firstgid", 0)?;
    if let Some(source) = attrs.optional::<String>("source")? {
        attrs.finish()?;
        let tileset = load_external_tileset(first_gid, &source, ctx)?;
        return Ok(Node::Tileset(Box::new(tileset)));
    }

    let tileset = Tileset {
        first_gid,
        name: attrs.or("name", String::new())?,
        class: attrs.or("class", String::new())?,
        tile_width: attrs.or("tilewidth", 0)?,
        tile_height: attrs.or("tileheight", 0)?,
        spacing: attrs.or("spacing", 0)?,
        margin: attrs.or("margin", 0)?,
        tile_count: attrs.or("tilecount", 0)?,
        columns: attrs.or("columns", 0)?,
        object_alignment: attrs.optional("objectalignment")?,
        ..Tileset::default()
    };
    attrs.ignore(&[
        "version",
        "tiledversion",
        "tilerendersize",
        "fillmode",
        "backgroundcolor",
    ]);
    attrs.finish()?;
    Ok(Node::Tileset(Box::new(tileset)))
}

/// Parse a `.tsx` file with the same builder, relative to its own directory.
fn load_external_tileset(
    first_gid: u32,
    source: &str,
    ctx: &mut ParseContext<'_>,
) -> TmxResult<Tileset> {
    let path = resolve_path(&ctx.base_dir, source);
    if ctx.external_chain.contains(&path) {
        return Err(TmxError::CircularExternalResource(path));
    }

    let bytes = ctx
        .reader
        .read(&path)
        .map_err(|source| TmxError::MissingExternalResource {
            path: path.clone(),
            source,
        })?;

    let tileset_dir = path.parent().map(Into::into).unwrap_or_default();
    let saved_dir = std::mem::replace(&mut ctx.base_dir, tileset_dir);
    ctx.external_chain.push(path.clone());
    let parsed = parse_document::<(), _>(bytes.as_slice(), ctx);
    ctx.external_chain.pop();
    ctx.base_dir = saved_dir;

    let invalid = |source: TmxError| TmxError::InvalidExternalResource {
        path: path.clone(),
        source: Box::new(source),
    };
    let mut tileset = match parsed.map_err(invalid)? {
        Node::Tileset(tileset) => *tileset,
        other => {
            return Err(invalid(TmxError::MalformedDocument(format!(
                "expected <tileset> root, found <{}>",
                other.kind().name()
            ))));
        }
    };

    debug!("loaded external tileset {}", path.display());
    tileset.first_gid = first_gid;
    tileset.source = Some(path);
    Ok(tileset)
}

fn new_tile_offset<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let offset = IVec2::new(attrs.or("x", 0)?, attrs.or("y", 0)?);
    attrs.finish()?;
    Ok(Node::TileOffset(offset))
}

fn new_grid<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let grid = TilesetGrid {
        orientation: attrs.or("orientation", Default::default())?,
        width: attrs.required("width")?,
        height: attrs.required("height")?,
    };
    attrs.finish()?;
    Ok(Node::Grid(grid))
}

fn new_transformations<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let transformations = TileTransformations {
        hflip: attrs.or("hflip", false)?,
        vflip: attrs.or("vflip", false)?,
        rotate: attrs.or("rotate", false)?,
        prefer_untransformed: attrs.or("preferuntransformed", false)?,
    };
    attrs.finish()?;
    Ok(Node::Transformations(transformations))
}

fn new_data_tile<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let gid = attrs.or("gid", 0)?;
    attrs.finish()?;
    Ok(Node::DataTile(Gid(gid)))
}

fn new_tile<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let mut tile = TileData::new(attrs.required("id")?);
    let class = attrs.optional("class")?;
    let legacy_type = attrs.optional("type")?;
    tile.class = class.or(legacy_type).unwrap_or_default();
    tile.probability = attrs.or("probability", 1.0)?;
    // sub-rectangle of collection images and pre-1.0 terrain ids
    attrs.ignore(&["x", "y", "width", "height", "terrain"]);
    attrs.finish()?;
    Ok(Node::Tile(Box::new(tile)))
}

fn new_image<H>(mut attrs: Attributes, ctx: &ParseContext<'_>) -> TmxResult<Node<H>> {
    let Some(source) = attrs.optional::<String>("source")? else {
        return Err(TmxError::UnsupportedFeature(
            "images without a source file (embedded image data)".to_string(),
        ));
    };
    let image = ImageSource {
        source: resolve_path(&ctx.base_dir, &source),
        width: attrs.optional("width")?,
        height: attrs.optional("height")?,
        transparent: attrs.optional::<Color>("trans")?,
        format: attrs.optional("format")?,
    };
    attrs.finish()?;
    Ok(Node::Image(image))
}

/// Fields shared by all layer kinds.
fn layer_info(attrs: &mut Attributes) -> TmxResult<LayerInfo> {
    let info = LayerInfo {
        id: attrs.or("id", 0)?,
        name: attrs.or("name", String::new())?,
        class: attrs.or("class", String::new())?,
        opacity: attrs.or("opacity", 1.0)?,
        visible: attrs.or("visible", true)?,
        locked: attrs.or("locked", false)?,
        tint: attrs.optional("tintcolor")?,
        offset: Vec2::new(attrs.or("offsetx", 0.0)?, attrs.or("offsety", 0.0)?),
        parallax: Vec2::new(attrs.or("parallaxx", 1.0)?, attrs.or("parallaxy", 1.0)?),
        properties: Properties::new(),
    };
    // legacy layer position, always 0
    attrs.ignore(&["x", "y"]);
    Ok(info)
}

fn new_layer<H>(mut attrs: Attributes, stack: &[Node<H>]) -> TmxResult<Node<H>> {
    let info = layer_info(&mut attrs)?;
    let map = stack.iter().find_map(|node| match node {
        Node::Map(map) => Some(map),
        _ => None,
    });
    let width = match (attrs.optional("width")?, map) {
        (Some(width), _) => width,
        (None, Some(map)) => map.width,
        (None, None) => {
            return Err(TmxError::MissingAttribute {
                element: "layer",
                attribute: "width",
            });
        }
    };
    let height = match (attrs.optional("height")?, map) {
        (Some(height), _) => height,
        (None, Some(map)) => map.height,
        (None, None) => {
            return Err(TmxError::MissingAttribute {
                element: "layer",
                attribute: "height",
            });
        }
    };
    attrs.finish()?;
    Ok(Node::Layer(Box::new(TileLayer {
        info,
        width,
        height,
        data: Vec::new(),
    })))
}

fn new_data<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let encoding = attrs.take("encoding").map(|s| s.parse::<Encoding>()).transpose()?;
    let compression = attrs
        .take("compression")
        .map(|s| s.parse::<Compression>())
        .transpose()?;
    if encoding.is_none() && compression.is_some() {
        return Err(TmxError::UnsupportedFeature(
            "compressed data without an encoding".to_string(),
        ));
    }
    attrs.finish()?;
    Ok(Node::Data(DataNode {
        encoding,
        compression,
        text: String::new(),
        tiles: Vec::new(),
    }))
}

fn new_object_group<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let info = layer_info(&mut attrs)?;
    let group = ObjectGroup {
        info,
        color: attrs.optional("color")?,
        draw_order: attrs.or("draworder", Default::default())?,
        objects: Vec::new(),
    };
    attrs.ignore(&["width", "height"]);
    attrs.finish()?;
    Ok(Node::ObjectGroup(Box::new(group)))
}

fn new_object<H>(mut attrs: Attributes, ctx: &mut ParseContext<'_>) -> TmxResult<Node<H>> {
    let key = ctx.next_object_key;
    ctx.next_object_key += 1;

    let class = attrs.optional("class")?;
    let legacy_type = attrs.optional("type")?;
    let object = Object {
        id: attrs.or("id", 0)?,
        name: attrs.or("name", String::new())?,
        class: class.or(legacy_type).unwrap_or_default(),
        x: attrs.or("x", 0.0)?,
        y: attrs.or("y", 0.0)?,
        width: attrs.or("width", 0.0)?,
        height: attrs.or("height", 0.0)?,
        rotation: attrs.or("rotation", 0.0)?,
        visible: attrs.or("visible", true)?,
        gid: attrs.optional::<u32>("gid")?.map(Gid),
        template: attrs.optional("template")?,
        shape: ObjectShape::Rectangle,
        properties: Properties::new(),
        key,
    };
    attrs.finish()?;

    if let Some(gid) = object.gid.filter(|gid| !gid.is_empty()) {
        ctx.pending_tile_objects.push(PendingTileObject { key, gid });
    }
    Ok(Node::Object(Box::new(object)))
}

fn new_text<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let defaults = TextShape::default();
    let text = TextShape {
        text: String::new(),
        font_family: attrs.or("fontfamily", defaults.font_family)?,
        pixel_size: attrs.or("pixelsize", defaults.pixel_size)?,
        wrap: attrs.or("wrap", defaults.wrap)?,
        color: attrs.or("color", defaults.color)?,
        bold: attrs.or("bold", defaults.bold)?,
        italic: attrs.or("italic", defaults.italic)?,
        underline: attrs.or("underline", defaults.underline)?,
        strikeout: attrs.or("strikeout", defaults.strikeout)?,
        kerning: attrs.or("kerning", defaults.kerning)?,
        halign: attrs.or("halign", defaults.halign)?,
        valign: attrs.or("valign", defaults.valign)?,
    };
    attrs.finish()?;
    Ok(Node::Text(Box::new(text)))
}

fn new_image_layer<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let info = layer_info(&mut attrs)?;
    let layer = ImageLayer {
        info,
        source: None,
        repeat_x: attrs.or("repeatx", false)?,
        repeat_y: attrs.or("repeaty", false)?,
        image: None,
    };
    attrs.finish()?;
    Ok(Node::ImageLayer(Box::new(layer)))
}

fn new_property<H>(mut attrs: Attributes) -> TmxResult<Node<H>> {
    let name: String = attrs.required("name")?;
    let property_type: PropertyType = attrs.or("type", PropertyType::String)?;
    let custom_type = attrs.optional("propertytype")?;
    let value: Option<String> = attrs.optional("value")?;
    attrs.finish()?;

    let has_value_attribute = value.is_some();
    Ok(Node::Property(PropertyNode {
        property: Property {
            name,
            property_type,
            custom_type,
            value: value.unwrap_or_default(),
            members: Properties::new(),
        },
        has_value_attribute,
    }))
}
