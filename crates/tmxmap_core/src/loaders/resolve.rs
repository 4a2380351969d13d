//! Second pass over a fully built map.
//!
//! Runs only once the whole document (and every external tileset) has been read,
//! so tile metadata is available no matter where the tileset appeared relative to
//! the objects using it.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::config::LoaderConfig;
use crate::error::TmxResult;
use crate::gid::Gid;
use crate::loaders::ImageLoader;
use crate::loaders::builder::PendingTileObject;
use crate::model::{Layer, Map, Object, TileData, Tileset};

/// Validate gids, merge tile metadata into tile objects, then load images.
pub(crate) fn resolve<L: ImageLoader>(
    map: &mut Map<L::Handle>,
    pending: &[PendingTileObject],
    image_loader: &mut L,
    config: &LoaderConfig,
) -> TmxResult<()> {
    validate_gids(map, pending)?;
    merge_tile_objects(map, pending, config);
    load_images(map, image_loader, config);
    Ok(())
}

fn validate_gids<H>(map: &Map<H>, pending: &[PendingTileObject]) -> TmxResult<()> {
    for layer in map.tile_layers() {
        for (_, _, gid) in layer.tiles() {
            map.tileset_for_gid(gid)?;
        }
    }
    for object in pending {
        map.tileset_for_gid(object.gid)?;
    }
    Ok(())
}

fn find_tile(tilesets: &[Tileset], gid: Gid) -> Option<&TileData> {
    let tileset = tilesets.iter().find(|tileset| tileset.contains_gid(gid.id()))?;
    tileset.tile(tileset.local_id(gid.id())?)
}

/// Visit every layer, nested ones included.
fn for_each_layer_mut<H, F: FnMut(&mut Layer<H>)>(layers: &mut [Layer<H>], f: &mut F) {
    for layer in layers {
        f(&mut *layer);
        if let Layer::Group(group) = layer {
            for_each_layer_mut(&mut group.layers, f);
        }
    }
}

fn merge_tile_objects<H>(map: &mut Map<H>, pending: &[PendingTileObject], config: &LoaderConfig) {
    if pending.is_empty() {
        return;
    }
    let by_key: HashMap<u32, Gid> = pending.iter().map(|entry| (entry.key, entry.gid)).collect();

    let Map {
        layers, tilesets, ..
    } = map;
    let mut merge = |object: &mut Object| {
        let Some(&gid) = by_key.get(&object.key) else {
            return;
        };
        if let Some(tile) = find_tile(tilesets, gid) {
            object.properties.merge_missing(&tile.properties);
        }
        if config.tile_objects_top_left {
            object.y -= object.height;
        }
    };
    for_each_layer_mut(layers, &mut |layer| {
        if let Layer::Objects(group) = layer {
            group.objects.iter_mut().for_each(&mut merge);
        }
    });
    debug!("merged tile metadata into {} tile objects", pending.len());
}

/// Every gid the map actually draws, grouped by bare gid.
fn used_variants<H>(map: &Map<H>) -> HashMap<u32, BTreeSet<Gid>> {
    let mut used: HashMap<u32, BTreeSet<Gid>> = HashMap::new();
    let mut add = |gid: Gid| {
        if !gid.is_empty() {
            used.entry(gid.id()).or_default().insert(gid);
        }
    };

    for layer in map.tile_layers() {
        for (_, _, gid) in layer.tiles() {
            add(gid);
        }
    }
    for gid in map.objects().filter_map(|object| object.gid) {
        add(gid);
    }
    for tileset in &map.tilesets {
        for tile in tileset.tiles.values() {
            for frame in &tile.animation {
                add(Gid(tileset.gid_of(frame.tile_id)));
            }
        }
    }
    used
}

fn load_images<L: ImageLoader>(map: &mut Map<L::Handle>, image_loader: &mut L, config: &LoaderConfig) {
    let used = used_variants(map);
    let variants_of = |gid: u32| -> Vec<Gid> {
        let mut variants: Vec<Gid> = used.get(&gid).into_iter().flatten().copied().collect();
        let plain = Gid(gid);
        if (config.load_all_tiles || config.optional_gids.contains(&gid)) && !variants.contains(&plain) {
            variants.push(plain);
        }
        variants
    };

    let mut images = HashMap::new();
    for tileset in &map.tilesets {
        if let (Some(image), Some(regions)) = (&tileset.image, tileset.regions()) {
            for (local_id, rect) in (0..tileset.tile_count).zip(regions) {
                for variant in variants_of(tileset.gid_of(local_id)) {
                    let handle = image_loader.load(image, Some(rect), variant.flags().non_empty());
                    images.insert(variant, handle);
                }
            }
        }
        // per-tile images replace the atlas slot
        for (&local_id, tile) in &tileset.tiles {
            let Some(image) = &tile.image else {
                continue;
            };
            for variant in variants_of(tileset.gid_of(local_id)) {
                let handle = image_loader.load(image, None, variant.flags().non_empty());
                images.insert(variant, handle);
            }
        }
    }
    debug!("loaded {} tile images", images.len());
    map.images = images;

    for_each_layer_mut(&mut map.layers, &mut |layer| {
        if let Layer::Image(layer) = layer
            && let Some(source) = &layer.source
        {
            layer.image = Some(image_loader.load(source, None, None));
        }
    });
}
