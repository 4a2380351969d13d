//! # `tmxmap_collision`
//!
//! Collision geometry for maps loaded by `tmxmap_core`.
//!
//! Tile layers often mark solid ground with hundreds of individual cells. This crate
//! merges those cells into a handful of axis-aligned rectangles in pixel space,
//! ready to hand to a physics engine or an overlap test.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tmxmap_collision::prelude::*;
//! use tmxmap_core::load_tmx_map;
//!
//! let map = load_tmx_map("assets/maps/level1.tmx").unwrap();
//! let walls = build_rects(&map, LayerSelector::Name("walls"), RectFilter::AnyTile).unwrap();
//! for rect in walls {
//!     println!("solid from {} to {}", rect.min, rect.max);
//! }
//! ```

pub mod layers;
pub mod simplify;

pub mod prelude {
    //! Common imports for `tmxmap_collision` users.

    pub use crate::layers::{LayerSelector, RectFilter, build_rects};
    pub use crate::simplify::simplify;
}

pub use layers::{LayerSelector, RectFilter, build_rects};
pub use simplify::simplify;
