//! # `tmxmap_core`
//!
//! Reads [Tiled](https://www.mapeditor.org/) `.tmx` maps and `.tsx` tilesets into a
//! typed, fully linked object graph.
//!
//! **This crate does NOT decode pixels or draw anything.** Images are handed to an
//! [`ImageLoader`] supplied by the caller, which returns whatever handle the
//! renderer wants (`tmxmap_bevy` returns Bevy `Handle<Image>`s).
//!
//! ## What This Crate Provides
//!
//! 1. **Streaming parser**: one pass over the XML, a typed node per element,
//!    strict validation of elements, attributes and parent/child pairings
//! 2. **Tile data decoding**: CSV, base64, gzip and zlib layer payloads
//! 3. **External tilesets**: `.tsx` files resolved relative to the file that names them
//! 4. **Tile objects**: objects placed with a gid inherit the tile's properties
//! 5. **Accessors**: layer, object, tileset and per-cell lookups on [`Map`]
//!
//! ## What This Crate Does NOT Provide
//!
//! - Infinite (chunked) maps
//! - Embedded image data
//! - Wang sets, terrains, object template resolution
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tmxmap_core::prelude::*;
//!
//! let map = load_tmx_map("assets/maps/level1.tmx").unwrap();
//! for (x, y, layer) in map.tile_locations_by_gid(Gid(3)) {
//!     println!("tile 3 at {x},{y} on layer {layer}");
//! }
//! println!("map is {} pixels", map.pixel_size());
//! ```

use std::path::Path;

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod gid;
pub mod loaders;
pub mod model;
pub mod properties;
pub mod regions;

pub mod prelude {
    //! Common imports for `tmxmap_core` users.

    pub use crate::color::Color;
    pub use crate::config::LoaderConfig;
    pub use crate::error::{TmxError, TmxResult};
    pub use crate::gid::{Gid, TileFlags};
    pub use crate::load_tmx_map;
    pub use crate::loaders::{ImageLoader, MapLoader, PathImageLoader, ResourceReader, TileImage};
    pub use crate::model::{
        Layer, Map, Object, ObjectGroup, ObjectShape, TileData, TileLayer, Tileset,
    };
    pub use crate::properties::{FromProperty, Properties, Property, PropertyType};
}

pub use config::LoaderConfig;
pub use error::{TmxError, TmxResult};
pub use gid::{Gid, TileFlags};
pub use loaders::{
    FilesystemReader, ImageLoader, MapLoader, PathImageLoader, ResourceReader, TileImage,
};
pub use model::Map;

/// Load a map from disk with the default configuration, describing images by
/// path and rectangle.
///
/// # Errors
///
/// See [`TmxError`].
pub fn load_tmx_map(path: impl AsRef<Path>) -> TmxResult<Map<TileImage>> {
    MapLoader::new().load_tmx_map(path, PathImageLoader)
}
