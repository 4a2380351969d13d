//! Turning TMX/TSX files into [`Map`]s and [`Tileset`]s.
//!
//! Loading runs in two phases:
//! 1. **Build**: a streaming pass over the XML that constructs one typed node per
//!    element and links finished children into their parents.
//! 2. **Resolve**: once the whole document is read, tile metadata is merged into
//!    tile objects and images are loaded through the caller's [`ImageLoader`].
//!
//! External files (the map itself, `.tsx` tilesets) are read through a
//! [`ResourceReader`], the filesystem by default.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bevy_math::URect;
use tracing::info;

use crate::config::LoaderConfig;
use crate::error::{TmxError, TmxResult};
use crate::gid::TileFlags;
use crate::model::{ImageSource, Map, Tileset};

mod attributes;
mod builder;
mod completion;
mod nodes;
mod resolve;

#[cfg(test)]
mod tests;

use builder::{ParseContext, parse_document};
use nodes::Node;

/// Source of file contents for maps and external tilesets.
pub trait ResourceReader {
    fn read(&mut self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads straight from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemReader;

impl ResourceReader for FilesystemReader {
    fn read(&mut self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

impl<F> ResourceReader for F
where
    F: FnMut(&Path) -> io::Result<Vec<u8>>,
{
    fn read(&mut self, path: &Path) -> io::Result<Vec<u8>> {
        self(path)
    }
}

/// Turns an image reference into whatever the caller renders with.
///
/// Called once per tile slot and flag combination, with `rect` set to the slot's
/// pixel rectangle inside the image, or `None` when the whole image is meant
/// (image layers, image-collection tiles). `flags` is `None` for unflipped tiles.
pub trait ImageLoader {
    type Handle;

    fn load(&mut self, image: &ImageSource, rect: Option<URect>, flags: Option<TileFlags>) -> Self::Handle;
}

impl<F, H> ImageLoader for F
where
    F: FnMut(&ImageSource, Option<URect>, Option<TileFlags>) -> H,
{
    type Handle = H;

    fn load(&mut self, image: &ImageSource, rect: Option<URect>, flags: Option<TileFlags>) -> H {
        self(image, rect, flags)
    }
}

/// Description of a tile image, for callers that decode pixels themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    pub source: PathBuf,
    pub rect: Option<URect>,
    pub flags: TileFlags,
}

/// The default [`ImageLoader`]: records what would be loaded without touching
/// pixel data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathImageLoader;

impl ImageLoader for PathImageLoader {
    type Handle = TileImage;

    fn load(&mut self, image: &ImageSource, rect: Option<URect>, flags: Option<TileFlags>) -> TileImage {
        TileImage {
            source: image.source.clone(),
            rect,
            flags: flags.unwrap_or_default(),
        }
    }
}

/// Loads maps and tilesets.
///
/// # Example
///
/// ```no_run
/// use tmxmap_core::{MapLoader, PathImageLoader};
///
/// let map = MapLoader::new()
///     .load_tmx_map("assets/maps/level1.tmx", PathImageLoader)
///     .unwrap();
/// for layer in map.visible_tile_layers() {
///     println!("{} is {}x{}", layer.info.name, layer.width, layer.height);
/// }
/// ```
#[derive(Debug, Default)]
pub struct MapLoader<R: ResourceReader = FilesystemReader> {
    reader: R,
    config: LoaderConfig,
}

impl MapLoader<FilesystemReader> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: ResourceReader> MapLoader<R> {
    /// Use a custom reader for the map and its external tilesets.
    pub fn with_reader(reader: R) -> Self {
        Self {
            reader,
            config: LoaderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read and parse a `.tmx` file.
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, otherwise any parse error.
    pub fn load_tmx_map<L: ImageLoader>(
        &mut self,
        path: impl AsRef<Path>,
        image_loader: L,
    ) -> TmxResult<Map<L::Handle>> {
        let path = path.as_ref();
        let bytes = self.reader.read(path)?;
        self.parse_tmx_map(bytes.as_slice(), path, image_loader)
    }

    /// Parse map XML that was already read; `path` locates relative resources.
    pub fn parse_tmx_map<L: ImageLoader>(
        &mut self,
        source: impl Read,
        path: &Path,
        mut image_loader: L,
    ) -> TmxResult<Map<L::Handle>> {
        let mut ctx = ParseContext::new(parent_dir(path), &mut self.reader, &self.config);
        let root = parse_document::<L::Handle, _>(source, &mut ctx)?;
        let pending = std::mem::take(&mut ctx.pending_tile_objects);

        let mut map = match root {
            Node::Map(map) => *map,
            other => {
                return Err(TmxError::MalformedDocument(format!(
                    "expected <map> root, found <{}>",
                    other.kind().name()
                )));
            }
        };
        map.source = Some(path.to_path_buf());
        resolve::resolve(&mut map, &pending, &mut image_loader, &self.config)?;

        info!(
            "loaded map {} ({}x{} tiles, {} layers, {} tilesets, {} tile images)",
            path.display(),
            map.width,
            map.height,
            map.layers.len(),
            map.tilesets.len(),
            map.images.len()
        );
        Ok(map)
    }

    /// Read and parse a standalone `.tsx` file. Its gids start at 1.
    pub fn load_tsx_tileset(&mut self, path: impl AsRef<Path>) -> TmxResult<Tileset> {
        let path = path.as_ref();
        let bytes = self.reader.read(path)?;
        self.parse_tsx_tileset(bytes.as_slice(), path)
    }

    /// Parse tileset XML that was already read; `path` locates its image.
    pub fn parse_tsx_tileset(&mut self, source: impl Read, path: &Path) -> TmxResult<Tileset> {
        let mut ctx = ParseContext::new(parent_dir(path), &mut self.reader, &self.config);
        let mut tileset = match parse_document::<(), _>(source, &mut ctx)? {
            Node::Tileset(tileset) => *tileset,
            other => {
                return Err(TmxError::MalformedDocument(format!(
                    "expected <tileset> root, found <{}>",
                    other.kind().name()
                )));
            }
        };
        tileset.first_gid = 1;
        tileset.source = Some(path.to_path_buf());
        Ok(tileset)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
