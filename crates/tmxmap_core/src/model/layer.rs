//! Layer types: tile grids, object groups, image layers and groups.

use bevy_math::Vec2;

use crate::color::Color;
use crate::gid::Gid;
use crate::model::object::Object;
use crate::model::tileset::ImageSource;
use crate::properties::Properties;

string_enum! {
    /// Object group draw order.
    DrawOrder {
        TopDown => "topdown",
        Index => "index",
    }
}

/// Fields shared by every layer kind.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    pub id: u32,
    pub name: String,
    pub class: String,
    pub opacity: f32,
    pub visible: bool,
    pub locked: bool,
    pub tint: Option<Color>,
    /// Rendering offset in pixels.
    pub offset: Vec2,
    pub parallax: Vec2,
    pub properties: Properties,
}

impl Default for LayerInfo {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            class: String::new(),
            opacity: 1.0,
            visible: true,
            locked: false,
            tint: None,
            offset: Vec2::ZERO,
            parallax: Vec2::ONE,
            properties: Properties::default(),
        }
    }
}

/// A grid of raw gids, `data[y][x]`, flags included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileLayer {
    pub info: LayerInfo,
    pub width: u32,
    pub height: u32,
    pub data: Vec<Vec<Gid>>,
}

impl TileLayer {
    /// Gid at a cell, `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<Gid> {
        self.data.get(y as usize)?.get(x as usize).copied()
    }

    /// Every cell in row-major order as `(x, y, gid)`, empty cells included.
    pub fn iter_data(&self) -> impl Iterator<Item = (u32, u32, Gid)> + '_ {
        self.data.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, &gid)| (x as u32, y as u32, gid))
        })
    }

    /// Only the non-empty cells.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32, Gid)> + '_ {
        self.iter_data().filter(|(_, _, gid)| !gid.is_empty())
    }
}

/// Objects in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectGroup {
    pub info: LayerInfo,
    pub color: Option<Color>,
    pub draw_order: DrawOrder,
    pub objects: Vec<Object>,
}

impl ObjectGroup {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.objects.iter()
    }

    pub fn object_by_name(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|object| object.name == name)
    }
}

impl<'a> IntoIterator for &'a ObjectGroup {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

/// A single image drawn as a layer.
#[derive(Debug, Clone)]
pub struct ImageLayer<H> {
    pub info: LayerInfo,
    pub source: Option<ImageSource>,
    pub repeat_x: bool,
    pub repeat_y: bool,
    /// Handle returned by the image loader, filled after parsing.
    pub image: Option<H>,
}

impl<H> Default for ImageLayer<H> {
    fn default() -> Self {
        Self {
            info: LayerInfo::default(),
            source: None,
            repeat_x: false,
            repeat_y: false,
            image: None,
        }
    }
}

/// Nested layers in document order.
#[derive(Debug, Clone)]
pub struct GroupLayer<H> {
    pub info: LayerInfo,
    pub layers: Vec<Layer<H>>,
}

impl<H> Default for GroupLayer<H> {
    fn default() -> Self {
        Self {
            info: LayerInfo::default(),
            layers: Vec::new(),
        }
    }
}

impl<H> GroupLayer<H> {
    pub fn iter(&self) -> std::slice::Iter<'_, Layer<H>> {
        self.layers.iter()
    }
}

impl<'a, H> IntoIterator for &'a GroupLayer<H> {
    type Item = &'a Layer<H>;
    type IntoIter = std::slice::Iter<'a, Layer<H>>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}

/// Any layer of a map.
#[derive(Debug, Clone)]
pub enum Layer<H> {
    Tiles(TileLayer),
    Objects(ObjectGroup),
    Image(ImageLayer<H>),
    Group(GroupLayer<H>),
}

impl<H> Layer<H> {
    pub fn info(&self) -> &LayerInfo {
        match self {
            Layer::Tiles(layer) => &layer.info,
            Layer::Objects(layer) => &layer.info,
            Layer::Image(layer) => &layer.info,
            Layer::Group(layer) => &layer.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut LayerInfo {
        match self {
            Layer::Tiles(layer) => &mut layer.info,
            Layer::Objects(layer) => &mut layer.info,
            Layer::Image(layer) => &mut layer.info,
            Layer::Group(layer) => &mut layer.info,
        }
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn is_visible(&self) -> bool {
        self.info().visible
    }

    pub fn properties(&self) -> &Properties {
        &self.info().properties
    }

    pub fn as_tile_layer(&self) -> Option<&TileLayer> {
        match self {
            Layer::Tiles(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_object_group(&self) -> Option<&ObjectGroup> {
        match self {
            Layer::Objects(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_image_layer(&self) -> Option<&ImageLayer<H>> {
        match self {
            Layer::Image(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupLayer<H>> {
        match self {
            Layer::Group(layer) => Some(layer),
            _ => None,
        }
    }
}
