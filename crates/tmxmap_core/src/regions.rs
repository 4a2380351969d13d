//! Tileset image slicing.

use bevy_math::URect;

/// Enumerate the tile slots of a tileset image in row-major order.
///
/// Slot `i` belongs to gid `first_gid + i`. Slots start at `(margin, margin)` and
/// advance by `tile + spacing`; a slot is only produced when it fits entirely inside
/// the image minus the trailing margin.
///
/// # Example
///
/// ```
/// use bevy_math::URect;
/// use tmxmap_core::regions::iter_tiles;
///
/// let slots: Vec<URect> = iter_tiles(8, 16, 4, 8, 0, 0).collect();
/// assert_eq!(slots[1], URect::new(4, 0, 8, 8));
/// ```
pub fn iter_tiles(
    image_width: u32,
    image_height: u32,
    tile_width: u32,
    tile_height: u32,
    margin: u32,
    spacing: u32,
) -> TileRegions {
    TileRegions {
        columns: slots_along(image_width, tile_width, margin, spacing),
        rows: slots_along(image_height, tile_height, margin, spacing),
        tile_width,
        tile_height,
        margin,
        spacing,
        next: 0,
    }
}

/// Widened to `u64` so huge attribute values yield zero slots instead of
/// overflowing. The result never exceeds `extent`, and every counted slot ends at
/// or before `extent - margin`, so slot coordinates fit back into `u32`.
fn slots_along(extent: u32, tile: u32, margin: u32, spacing: u32) -> u32 {
    if tile == 0 {
        return 0;
    }
    let usable = u64::from(extent).saturating_sub(2 * u64::from(margin));
    let slots = (usable + u64::from(spacing)) / (u64::from(tile) + u64::from(spacing));
    u32::try_from(slots).unwrap_or(0)
}

/// Iterator returned by [`iter_tiles`].
#[derive(Debug, Clone)]
pub struct TileRegions {
    columns: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
    margin: u32,
    spacing: u32,
    next: u64,
}

impl TileRegions {
    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    fn total(&self) -> u64 {
        u64::from(self.columns) * u64::from(self.rows)
    }
}

impl Iterator for TileRegions {
    type Item = URect;

    fn next(&mut self) -> Option<URect> {
        if self.next >= self.total() {
            return None;
        }
        let columns = u64::from(self.columns);
        let column = self.next % columns;
        let row = self.next / columns;
        self.next += 1;

        let x = offset(self.margin, column, self.tile_width, self.spacing);
        let y = offset(self.margin, row, self.tile_height, self.spacing);
        Some(URect::new(x, y, x + self.tile_width, y + self.tile_height))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.total() - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileRegions {}

/// Start of slot `index` along one axis; in range for every slot `slots_along` counts.
fn offset(margin: u32, index: u64, tile: u32, spacing: u32) -> u32 {
    let start = u64::from(margin) + index * (u64::from(tile) + u64::from(spacing));
    u32::try_from(start).unwrap_or(u32::MAX)
}
