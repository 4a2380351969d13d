//! # `tmxmap_bevy`
//!
//! Bevy asset loading for Tiled maps parsed by `tmxmap_core`.
//!
//! `.tmx` files load as [`TmxMapAsset`]: the parsed map, with every tile image
//! resolved to a `Handle<Image>` plus the sub-rectangle and flips to apply.
//! `.tsx` files load as [`TmxTilesetAsset`].
//!
//! **This crate does NOT spawn entities or render.** Systems read the map asset and
//! build whatever sprites, tilemaps or colliders they need.

pub mod assets;
pub mod loaders;
pub mod plugin;

pub mod prelude {
    //! Common imports for `tmxmap_bevy` users.

    pub use crate::assets::{TmxMapAsset, TmxTileImage, TmxTilesetAsset};
    pub use crate::plugin::TmxMapPlugin;
}

pub use assets::{TmxMapAsset, TmxTileImage, TmxTilesetAsset};
pub use loaders::{AssetDirReader, TmxMapAssetLoader, TmxMapLoaderError, TmxTilesetAssetLoader};
pub use plugin::TmxMapPlugin;
