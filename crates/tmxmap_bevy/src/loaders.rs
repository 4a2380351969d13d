//! Asset loaders for `.tmx` and `.tsx` files.

use std::io;
use std::path::{Path, PathBuf};

use bevy::{
    asset::{AssetLoader, LoadContext, io::Reader},
    math::URect,
    platform::collections::HashMap,
    prelude::*,
    tasks::ConditionalSendFuture,
};
use thiserror::Error;
use tmxmap_core::{
    LoaderConfig, MapLoader, ResourceReader, TileFlags, TmxError, model::ImageSource,
};

use crate::assets::{TmxMapAsset, TmxTileImage, TmxTilesetAsset};

/// Reads external tilesets from the asset directory on disk.
///
/// Paths handed out by the parser are asset-root-relative, so they are joined
/// onto `root` before reading.
#[derive(Debug, Clone)]
pub struct AssetDirReader {
    pub root: PathBuf,
}

impl Default for AssetDirReader {
    fn default() -> Self {
        // Bevy loads assets from the "assets" directory by default
        Self {
            root: PathBuf::from("assets"),
        }
    }
}

impl ResourceReader for AssetDirReader {
    fn read(&mut self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(path))
    }
}

/// Convert a parser path into a Bevy asset path (forward slashes).
pub(crate) fn to_asset_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[derive(Debug, Error)]
pub enum TmxMapLoaderError {
    #[error("Failed to load map: {0}")]
    Tmx(#[from] TmxError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Asset loader for Tiled maps (.tmx files)
///
/// The map document comes through Bevy's reader; external tilesets are read from
/// the asset directory. Every image the map references is loaded as a dependency.
#[derive(Default)]
pub struct TmxMapAssetLoader {
    pub config: LoaderConfig,
    pub reader: AssetDirReader,
}

impl AssetLoader for TmxMapAssetLoader {
    type Asset = TmxMapAsset;
    type Settings = ();
    type Error = TmxMapLoaderError;

    fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        load_context: &mut LoadContext,
    ) -> impl ConditionalSendFuture<Output = Result<Self::Asset, Self::Error>> {
        async move {
            // 1. Read the document
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;
            let asset_path = load_context.asset_path().path().to_path_buf();

            // 2. Parse, turning every image reference into a handle
            let mut loader =
                MapLoader::with_reader(self.reader.clone()).with_config(self.config.clone());
            let map = loader.parse_tmx_map(
                bytes.as_slice(),
                &asset_path,
                |image: &ImageSource, rect: Option<URect>, flags: Option<TileFlags>| TmxTileImage {
                    image: load_context.load(to_asset_path(&image.source)),
                    rect,
                    flags: flags.unwrap_or_default(),
                },
            )?;

            info!(
                "Loaded map {} ({} layers, {} tile images)",
                asset_path.display(),
                map.layers.len(),
                map.images.len()
            );
            Ok(TmxMapAsset { map })
        }
    }

    fn extensions(&self) -> &[&str] {
        &["tmx"]
    }
}

/// Asset loader for standalone Tiled tilesets (.tsx files)
///
/// Supports both texture atlas tilesets (single spritesheet) and image collection
/// tilesets (individual images per tile).
#[derive(Default)]
pub struct TmxTilesetAssetLoader {
    pub config: LoaderConfig,
}

impl AssetLoader for TmxTilesetAssetLoader {
    type Asset = TmxTilesetAsset;
    type Settings = ();
    type Error = TmxMapLoaderError;

    fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        load_context: &mut LoadContext,
    ) -> impl ConditionalSendFuture<Output = Result<Self::Asset, Self::Error>> {
        async move {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;
            let asset_path = load_context.asset_path().path().to_path_buf();

            let tileset = MapLoader::with_reader(AssetDirReader::default())
                .with_config(self.config.clone())
                .parse_tsx_tileset(bytes.as_slice(), &asset_path)?;

            let atlas_image = tileset
                .image
                .as_ref()
                .map(|image| load_context.load(to_asset_path(&image.source)));
            let tile_images: HashMap<u32, Handle<Image>> = tileset
                .tiles
                .iter()
                .filter_map(|(&id, tile)| tile.image.as_ref().map(|image| (id, image)))
                .map(|(id, image)| (id, load_context.load(to_asset_path(&image.source))))
                .collect();

            Ok(TmxTilesetAsset {
                tileset,
                atlas_image,
                tile_images,
            })
        }
    }

    fn extensions(&self) -> &[&str] {
        &["tsx"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_paths_use_forward_slashes() {
        assert_eq!(to_asset_path(Path::new("maps/terrain.png")), "maps/terrain.png");
        assert_eq!(to_asset_path(Path::new(r"maps\tiles\terrain.png")), "maps/tiles/terrain.png");
    }

    #[test]
    fn test_asset_dir_reader_joins_root() {
        let mut reader = AssetDirReader {
            root: PathBuf::from("definitely/not/here"),
        };
        let err = reader.read(Path::new("maps/level.tmx")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
