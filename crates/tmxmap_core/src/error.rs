//! Error type shared by every stage of map loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout `tmxmap_core`.
pub type TmxResult<T> = Result<T, TmxError>;

/// Everything that can go wrong while reading a TMX/TSX document or querying the
/// resulting map.
///
/// Parse errors are fatal: a load either returns a complete [`Map`](crate::model::Map)
/// or one of these. Lookup errors (`InvalidCoordinate`, `LayerNotFound`, ...) only
/// fail the individual query.
#[derive(Debug, Error)]
pub enum TmxError {
    #[error("XML error: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("unknown element <{0}>")]
    UnknownElement(String),

    #[error("<{parent}> cannot contain <{child}>")]
    UnknownRelationship {
        parent: &'static str,
        child: &'static str,
    },

    #[error("unknown attribute '{attribute}' on <{element}>")]
    UnknownAttribute {
        element: &'static str,
        attribute: String,
    },

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("invalid value '{value}' for attribute '{attribute}' on <{element}>: {reason}")]
    InvalidAttribute {
        element: &'static str,
        attribute: String,
        value: String,
        reason: String,
    },

    #[error("malformed layer payload: {0}")]
    MalformedPayload(String),

    #[error("layer '{layer}' has {actual} tiles, expected {expected}")]
    MalformedLayer {
        layer: String,
        expected: usize,
        actual: usize,
    },

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("property '{property}' on <{element}> shadows a built-in field")]
    ReservedPropertyName {
        element: &'static str,
        property: String,
    },

    #[error("external resource {path} could not be read: {source}")]
    MissingExternalResource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("external resource {path} is invalid: {source}")]
    InvalidExternalResource {
        path: PathBuf,
        #[source]
        source: Box<TmxError>,
    },

    #[error("external resource {0} references itself")]
    CircularExternalResource(PathBuf),

    #[error("tileset '{name}' starts at gid {first_gid}, but gids below {next_free} are taken")]
    OverlappingTileset {
        name: String,
        first_gid: u32,
        next_free: u32,
    },

    #[error("tileset '{name}' with {tile_count} tiles from gid {first_gid} does not fit in 29-bit gids")]
    GidRangeOverflow {
        name: String,
        first_gid: u32,
        tile_count: u32,
    },

    #[error("gid {0} does not belong to any tileset")]
    UnknownTile(u32),

    #[error("coordinate ({x}, {y}) on layer {layer} is out of range")]
    InvalidCoordinate { x: u32, y: u32, layer: usize },

    #[error("layer not found: {0}")]
    LayerNotFound(String),

    #[error("layer '{0}' is not a tile layer")]
    NotATileLayer(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("tileset not found: {0}")]
    TilesetNotFound(String),
}
