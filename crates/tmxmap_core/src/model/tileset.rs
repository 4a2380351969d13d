//! Tilesets and per-tile metadata.

use std::collections::BTreeMap;
use std::path::PathBuf;

use bevy_math::IVec2;

use crate::color::Color;
use crate::model::layer::ObjectGroup;
use crate::properties::Properties;
use crate::regions::{TileRegions, iter_tiles};

string_enum! {
    GridOrientation {
        Orthogonal => "orthogonal",
        Isometric => "isometric",
    }
}

/// An image referenced by a tileset, tile or image layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageSource {
    /// Path resolved against the directory of the document that referenced it.
    pub source: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Color treated as transparent.
    pub transparent: Option<Color>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilesetGrid {
    pub orientation: GridOrientation,
    pub width: u32,
    pub height: u32,
}

/// Which transformations the editor may apply to tiles of this tileset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileTransformations {
    pub hflip: bool,
    pub vflip: bool,
    pub rotate: bool,
    pub prefer_untransformed: bool,
}

/// One animation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Local tile id within the owning tileset.
    pub tile_id: u32,
    /// Milliseconds.
    pub duration: u32,
}

/// Per-tile overrides declared with `<tile>` inside a tileset.
#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    pub id: u32,
    pub class: String,
    pub probability: f32,
    /// Own image for image-collection tilesets.
    pub image: Option<ImageSource>,
    pub animation: Vec<Frame>,
    pub collision: Option<ObjectGroup>,
    pub properties: Properties,
}

impl TileData {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            class: String::new(),
            probability: 1.0,
            image: None,
            animation: Vec::new(),
            collision: None,
            properties: Properties::default(),
        }
    }
}

/// A contiguous gid range `first_gid..first_gid + tile_count`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tileset {
    pub first_gid: u32,
    /// File of an external tileset.
    pub source: Option<PathBuf>,
    pub name: String,
    pub class: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub object_alignment: Option<String>,
    pub tile_offset: IVec2,
    pub grid: Option<TilesetGrid>,
    pub transformations: Option<TileTransformations>,
    pub image: Option<ImageSource>,
    /// Keyed by local tile id.
    pub tiles: BTreeMap<u32, TileData>,
    pub properties: Properties,
}

impl Tileset {
    /// Whether a bare gid falls inside this tileset's range.
    pub fn contains_gid(&self, id: u32) -> bool {
        id >= self.first_gid && id - self.first_gid < self.tile_count
    }

    /// Local tile id of a bare gid owned by this tileset.
    pub fn local_id(&self, id: u32) -> Option<u32> {
        self.contains_gid(id).then(|| id - self.first_gid)
    }

    /// Bare gid of a local tile id, saturating at `u32::MAX`.
    pub fn gid_of(&self, local_id: u32) -> u32 {
        self.first_gid.saturating_add(local_id)
    }

    /// One past the last gid of the range, saturating at `u32::MAX`.
    ///
    /// Loaded tilesets always end at or below `GID_MASK + 1`.
    pub fn end_gid(&self) -> u32 {
        self.first_gid.saturating_add(self.tile_count)
    }

    pub fn tile(&self, local_id: u32) -> Option<&TileData> {
        self.tiles.get(&local_id)
    }

    /// Atlas slots of the tileset image, `None` for image collections or images
    /// without a declared size.
    pub fn regions(&self) -> Option<TileRegions> {
        let image = self.image.as_ref()?;
        Some(iter_tiles(
            image.width?,
            image.height?,
            self.tile_width,
            self.tile_height,
            self.margin,
            self.spacing,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gid_range() {
        let tileset = Tileset {
            first_gid: 5,
            tile_count: 4,
            ..Default::default()
        };
        assert!(!tileset.contains_gid(4));
        assert!(tileset.contains_gid(5));
        assert!(tileset.contains_gid(8));
        assert!(!tileset.contains_gid(9));
        assert_eq!(tileset.local_id(7), Some(2));
        assert_eq!(tileset.gid_of(2), 7);
        assert_eq!(tileset.end_gid(), 9);
    }

    #[test]
    fn test_gid_range_saturates() {
        let tileset = Tileset {
            first_gid: u32::MAX,
            tile_count: 4,
            ..Default::default()
        };
        assert_eq!(tileset.end_gid(), u32::MAX);
        assert_eq!(tileset.gid_of(3), u32::MAX);
        assert!(tileset.contains_gid(u32::MAX));
    }

    #[test]
    fn test_regions_need_image_size() {
        let mut tileset = Tileset {
            tile_width: 4,
            tile_height: 8,
            image: Some(ImageSource {
                source: PathBuf::from("tiles.png"),
                width: Some(8),
                height: Some(16),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(tileset.regions().map(|regions| regions.count()), Some(4));

        tileset.image = None;
        assert!(tileset.regions().is_none());
    }
}
