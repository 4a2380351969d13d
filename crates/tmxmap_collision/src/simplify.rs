//! Greedy merging of grid cells into rectangles.

use std::collections::{BTreeSet, HashSet};

use bevy_math::{IRect, IVec2};

/// Merge a set of grid cells into non-overlapping rectangles.
///
/// Greedy, deterministic:
/// 1. Take the remaining cell with the smallest `(x + y, x, y)` as the origin
/// 2. Extend right while the next cell on the same row remains
/// 3. Extend down while the whole span of the next row remains
/// 4. Remove every covered cell and emit the rectangle
///
/// Rectangles are returned in pixel units (cells scaled by `cell_width` ×
/// `cell_height`). Their union is exactly the input; the count is small but not
/// guaranteed minimal. Pixel coordinates beyond the `i32` range are clamped.
///
/// # Example
///
/// ```
/// use bevy_math::{IRect, IVec2};
/// use tmxmap_collision::simplify;
///
/// let cells = [IVec2::new(0, 0), IVec2::new(1, 0), IVec2::new(0, 1), IVec2::new(1, 1)];
/// assert_eq!(simplify(cells, 16, 16), vec![IRect::new(0, 0, 32, 32)]);
/// ```
pub fn simplify(points: impl IntoIterator<Item = IVec2>, cell_width: i32, cell_height: i32) -> Vec<IRect> {
    let mut remaining: HashSet<IVec2> = points.into_iter().collect();
    let mut origins: BTreeSet<(i64, i32, i32)> = remaining.iter().map(|&point| origin_key(point)).collect();
    let mut rects = Vec::new();

    while let Some((_, x, y)) = origins.pop_first() {
        // Extend horizontally; growth stops at the edge of the i32 grid
        let mut width: i64 = 1;
        while offset(x, width).is_some_and(|next| remaining.contains(&IVec2::new(next, y))) {
            width += 1;
        }

        // Extend vertically, keeping the width
        let mut height: i64 = 1;
        'vertical: loop {
            let Some(row) = offset(y, height) else {
                break 'vertical;
            };
            for dx in 0..width {
                if !offset(x, dx).is_some_and(|column| remaining.contains(&IVec2::new(column, row))) {
                    break 'vertical;
                }
            }
            height += 1;
        }

        for dy in 0..height {
            for dx in 0..width {
                if let (Some(column), Some(row)) = (offset(x, dx), offset(y, dy)) {
                    let covered = IVec2::new(column, row);
                    remaining.remove(&covered);
                    origins.remove(&origin_key(covered));
                }
            }
        }

        rects.push(IRect::new(
            scale(i64::from(x), cell_width),
            scale(i64::from(y), cell_height),
            scale(i64::from(x) + width, cell_width),
            scale(i64::from(y) + height, cell_height),
        ));
    }

    rects
}

fn origin_key(point: IVec2) -> (i64, i32, i32) {
    (i64::from(point.x) + i64::from(point.y), point.x, point.y)
}

/// `start + delta` when it stays on the i32 grid.
fn offset(start: i32, delta: i64) -> Option<i32> {
    i32::try_from(i64::from(start) + delta).ok()
}

/// Cell coordinate to pixels, clamped to the i32 range.
fn scale(cell: i64, size: i32) -> i32 {
    let pixels = cell * i64::from(size);
    i32::try_from(pixels).unwrap_or(if pixels < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(points: &[(i32, i32)]) -> Vec<IVec2> {
        points.iter().map(|&(x, y)| IVec2::new(x, y)).collect()
    }

    /// Every cell covered by `rects`, failing on overlap.
    fn covered(rects: &[IRect], cell: i32) -> HashSet<IVec2> {
        let mut out = HashSet::new();
        for rect in rects {
            for y in rect.min.y / cell..rect.max.y / cell {
                for x in rect.min.x / cell..rect.max.x / cell {
                    assert!(out.insert(IVec2::new(x, y)), "cell ({x}, {y}) covered twice");
                }
            }
        }
        out
    }

    #[test]
    fn test_simplify_empty() {
        assert!(simplify(Vec::new(), 16, 16).is_empty());
    }

    #[test]
    fn test_simplify_single_cell() {
        let rects = simplify(cells(&[(3, 2)]), 16, 8);
        assert_eq!(rects, vec![IRect::new(48, 16, 64, 24)]);
    }

    #[test]
    fn test_simplify_horizontal_strip() {
        let rects = simplify(cells(&[(0, 0), (1, 0), (2, 0)]), 16, 16);
        assert_eq!(rects, vec![IRect::new(0, 0, 48, 16)]);
    }

    #[test]
    fn test_simplify_rectangle() {
        let rects = simplify(cells(&[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2), (1, 2)]), 16, 16);
        assert_eq!(rects, vec![IRect::new(0, 0, 32, 48)]);
    }

    #[test]
    fn test_simplify_l_shape() {
        let rects = simplify(cells(&[(0, 0), (1, 0), (2, 0), (0, 1), (0, 2)]), 16, 16);
        assert_eq!(rects, vec![IRect::new(0, 0, 48, 16), IRect::new(0, 16, 16, 48)]);
    }

    #[test]
    fn test_simplify_covers_input_exactly() {
        let input = cells(&[
            (0, 0), (1, 0), (3, 0),
            (0, 1), (1, 1), (2, 1), (3, 1),
            (2, 2), (5, 2),
            (-1, 3), (0, 3), (1, 3), (2, 3),
        ]);
        let rects = simplify(input.iter().copied(), 4, 4);

        let expected: HashSet<IVec2> = input.into_iter().collect();
        assert_eq!(covered(&rects, 4), expected);
        assert!(rects.len() < expected.len());
    }

    #[test]
    fn test_simplify_at_the_edge_of_the_grid() {
        let rects = simplify(cells(&[(i32::MAX - 1, 0), (i32::MAX, 0), (i32::MIN, i32::MAX)]), 1, 1);
        assert_eq!(
            rects,
            vec![
                IRect::new(i32::MIN, i32::MAX, i32::MIN + 1, i32::MAX),
                IRect::new(i32::MAX - 1, 0, i32::MAX, 1),
            ]
        );
    }

    #[test]
    fn test_simplify_clamps_pixel_coordinates() {
        let rects = simplify(cells(&[(1 << 20, 0)]), 1 << 12, 16);
        assert_eq!(rects, vec![IRect::new(i32::MAX, 0, i32::MAX, 16)]);
    }

    #[test]
    fn test_simplify_ignores_duplicates() {
        let rects = simplify(cells(&[(0, 0), (0, 0), (1, 0)]), 1, 1);
        assert_eq!(rects, vec![IRect::new(0, 0, 2, 1)]);
    }
}
