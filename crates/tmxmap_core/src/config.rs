use std::collections::HashSet;

/// Knobs for a map load.
///
/// # Example
///
/// ```
/// use tmxmap_core::LoaderConfig;
///
/// let config = LoaderConfig {
///     load_all_tiles: false,
///     ..Default::default()
/// };
/// assert!(config.tile_objects_top_left);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Accept properties whose names collide with an element's own fields
    /// (e.g. a layer property called `width`). Off by default because such
    /// names are almost always authoring mistakes.
    pub allow_reserved_property_names: bool,

    /// Load an image for every tile slot of every tileset, not just the gids the
    /// map references.
    pub load_all_tiles: bool,

    /// Bare gids to load even when unused and `load_all_tiles` is off.
    pub optional_gids: HashSet<u32>,

    /// Tile objects are anchored bottom-left in the document; move them up by
    /// their height so every object's `(x, y)` is its top-left corner.
    pub tile_objects_top_left: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            allow_reserved_property_names: false,
            load_all_tiles: true,
            optional_gids: HashSet::new(),
            tile_objects_top_left: true,
        }
    }
}
