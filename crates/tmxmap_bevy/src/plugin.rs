use bevy::prelude::*;
use tmxmap_core::LoaderConfig;

use crate::assets::{TmxMapAsset, TmxTilesetAsset};
use crate::loaders::{AssetDirReader, TmxMapAssetLoader, TmxTilesetAssetLoader};

/// Plugin that registers the Tiled asset types and their loaders
///
/// # Example
/// ```no_run
/// use bevy::prelude::*;
/// use tmxmap_bevy::{TmxMapAsset, TmxMapPlugin};
///
/// fn load_level(asset_server: Res<AssetServer>) {
///     let _map: Handle<TmxMapAsset> = asset_server.load("maps/level1.tmx");
/// }
///
/// App::new()
///     .add_plugins(TmxMapPlugin::default())
///     .add_systems(Startup, load_level)
///     .run();
/// ```
///
/// # What this plugin does
///
/// - Registers `TmxMapAsset` (`.tmx`) and `TmxTilesetAsset` (`.tsx`)
/// - Parses documents with the plugin's `LoaderConfig`
///
/// # What this plugin does NOT do
///
/// - Entity spawning or rendering
/// - Collision (see `tmxmap_collision`)
#[derive(Debug, Clone, Default)]
pub struct TmxMapPlugin {
    pub config: LoaderConfig,
}

impl TmxMapPlugin {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }
}

impl Plugin for TmxMapPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<TmxMapAsset>()
            .init_asset::<TmxTilesetAsset>();

        app.register_asset_loader(TmxMapAssetLoader {
            config: self.config.clone(),
            reader: AssetDirReader::default(),
        })
        .register_asset_loader(TmxTilesetAssetLoader {
            config: self.config.clone(),
        });
    }
}
