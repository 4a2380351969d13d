//! The typed map graph produced by the loader.
//!
//! Ownership is a tree: a [`Map`] owns its layers and tilesets, a [`GroupLayer`]
//! its child layers, an [`ObjectGroup`] its objects. Cross references (object →
//! tile, layer cell → tileset) are gid lookups through the map.
//!
//! Types that can hold loaded images are generic over `H`, the handle type
//! returned by the [`ImageLoader`](crate::loaders::ImageLoader) used for the load.

/// Declares a closed string-valued enum with `FromStr`, `Display` and `Default`
/// (the first variant).
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $first:ident => $first_text:literal
            $(, $variant:ident => $text:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $first,
            $($variant,)*
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$first
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $first_text => Ok($name::$first),
                    $($text => Ok($name::$variant),)*
                    other => Err(format!(
                        "expected one of {}, got '{other}'",
                        [$first_text $(, $text)*].join(", ")
                    )),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $name::$first => $first_text,
                    $($name::$variant => $text,)*
                })
            }
        }
    };
}

pub mod layer;
pub mod map;
pub mod object;
pub mod tileset;

pub use layer::{DrawOrder, GroupLayer, ImageLayer, Layer, LayerInfo, ObjectGroup, TileLayer};
pub use map::{Map, Orientation, RenderOrder, StaggerAxis, StaggerIndex};
pub use object::{HorizontalAlignment, Object, ObjectShape, TextShape, VerticalAlignment, rotate};
pub use tileset::{
    Frame, GridOrientation, ImageSource, TileData, TileTransformations, Tileset, TilesetGrid,
};
