use std::ops::Deref;

use bevy::math::URect;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use tmxmap_core::gid::{Gid, TileFlags};
use tmxmap_core::model::{Map, Tileset};

/// Image of one tile: the source image plus the sub-rectangle and flips to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct TmxTileImage {
    pub image: Handle<Image>,
    /// Pixel region inside `image`; `None` means the whole image.
    pub rect: Option<URect>,
    pub flags: TileFlags,
}

/// Bevy asset wrapper for Tiled maps (.tmx files)
///
/// The map keeps its layers, tilesets and objects exactly as parsed. Every image
/// it references (tileset atlases, collection tiles, image layers) is loaded as a
/// dependency of this asset.
#[derive(TypePath, Asset, Debug)]
pub struct TmxMapAsset {
    pub map: Map<TmxTileImage>,
}

impl TmxMapAsset {
    /// Image for an exact gid, flags included.
    pub fn tile_image(&self, gid: Gid) -> Option<&TmxTileImage> {
        self.map.tile_image_by_gid(gid)
    }

    /// Every distinct image file the map draws from.
    pub fn image_handles(&self) -> impl Iterator<Item = &Handle<Image>> {
        let mut seen = Vec::new();
        for tile in self.map.images.values() {
            if !seen.contains(&&tile.image) {
                seen.push(&tile.image);
            }
        }
        seen.into_iter()
    }
}

impl Deref for TmxMapAsset {
    type Target = Map<TmxTileImage>;

    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

/// Bevy asset wrapper for standalone Tiled tilesets (.tsx files)
#[derive(TypePath, Asset, Debug)]
pub struct TmxTilesetAsset {
    pub tileset: Tileset,

    /// Spritesheet for atlas tilesets, `None` for image collections.
    pub atlas_image: Option<Handle<Image>>,

    /// Per-tile images of image collections, keyed by local tile id.
    pub tile_images: HashMap<u32, Handle<Image>>,
}

impl TmxTilesetAsset {
    pub fn is_image_collection(&self) -> bool {
        self.atlas_image.is_none()
    }
}
