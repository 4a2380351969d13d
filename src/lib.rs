//! # tmxmap
//!
//! Tiled map loading for Rust games.
//!
//! This is a unified meta-crate that combines the `tmxmap_*` sub-crates behind
//! feature flags.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tmxmap::prelude::*;
//!
//! let map = load_tmx_map("assets/maps/level1.tmx").unwrap();
//! let ground = map.layer_by_name("ground").unwrap();
//! println!("{} has {} properties", ground.name(), ground.properties().len());
//! ```
//!
//! ## Features
//!
//! - **default**: Includes `collision`
//! - **collision**: Rectangle merging for collision geometry
//! - **bevy**: Bevy asset loaders for `.tmx` and `.tsx` files
//!
//! ## Architecture
//!
//! - [`core`]: Streaming TMX/TSX parser and the typed map model
//! - [`collision`]: Collision rectangles from tile layers (optional)
//! - [`bevy`]: `AssetLoader`s and a plugin (optional)

pub use tmxmap_core as core;

#[cfg(feature = "collision")]
pub use tmxmap_collision as collision;

#[cfg(feature = "bevy")]
pub use tmxmap_bevy as bevy;

/// Unified prelude for tmxmap
///
/// Re-exports the most commonly used types from all enabled sub-crates.
pub mod prelude {
    pub use crate::core::prelude::*;

    #[cfg(feature = "collision")]
    pub use crate::collision::prelude::*;

    #[cfg(feature = "bevy")]
    pub use crate::bevy::prelude::*;
}
