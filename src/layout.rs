//! Arranges topics on the tile grid so that similar topics sit close together.

use std::f32::consts::TAU;

use crate::math::{Rect, Vec2};

/// Grid cell assigned to one catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub index: usize,
    pub col: usize,
    pub row: usize,
}

/// Projects a K-dimensional weight vector onto the plane, spreading the K axes
/// evenly around the unit circle.
pub fn project_to_2d(vector: &[f32]) -> Vec2 {
    let dims = vector.len();
    if dims == 0 {
        return Vec2::ZERO;
    }
    vector
        .iter()
        .enumerate()
        .fold(Vec2::ZERO, |acc, (k, &w)| {
            let angle = TAU * k as f32 / dims as f32;
            acc + Vec2::from_angle(angle) * w
        })
}

/// Places every vector on a `cols x rows` grid.
///
/// Returns fewer placements than inputs only when the grid is too small.
pub fn arrange(vectors: &[&[f32]], cols: usize, rows: usize) -> Vec<Placement> {
    if vectors.is_empty() || cols == 0 || rows == 0 {
        return Vec::new();
    }

    let projected: Vec<Vec2> = vectors.iter().map(|v| project_to_2d(v)).collect();
    let (min_x, max_x, min_y, max_y) = projected.iter().fold(
        (f32::INFINITY, f32::NEG_INFINITY, f32::INFINITY, f32::NEG_INFINITY),
        |(lx, hx, ly, hy), p| (lx.min(p.x), hx.max(p.x), ly.min(p.y), hy.max(p.y)),
    );
    let range_x = non_zero_range(max_x - min_x);
    let range_y = non_zero_range(max_y - min_y);

    let mut order: Vec<(usize, f32, f32)> = projected
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p.x - min_x) / range_x, (p.y - min_y) / range_y))
        .collect();
    order.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.1.total_cmp(&b.1)));

    let mut occupied = vec![false; cols * rows];
    let mut placements = Vec::with_capacity(vectors.len());
    let max_radius = cols.max(rows) as isize;

    for (index, norm_x, norm_y) in order {
        let target_col = target_cell(norm_x, cols);
        let target_row = target_cell(norm_y, rows);

        let slot = (0..=max_radius).find_map(|radius| {
            ring_offsets(radius).find_map(|(dx, dy)| {
                let c = target_col + dx;
                let r = target_row + dy;
                if c < 0 || r < 0 || c >= cols as isize || r >= rows as isize {
                    return None;
                }
                let cell = r as usize * cols + c as usize;
                (!occupied[cell]).then_some((c as usize, r as usize, cell))
            })
        });

        if let Some((col, row, cell)) = slot {
            occupied[cell] = true;
            placements.push(Placement { index, col, row });
        }
    }

    placements
}

/// Offsets on the perimeter of the square ring at `radius`, in scan order:
/// top row left to right, right column top to bottom, bottom row right to
/// left, left column bottom to top.
pub fn ring_offsets(radius: isize) -> impl Iterator<Item = (isize, isize)> {
    let r = radius.max(0);
    let single = (r == 0).then_some((0, 0));
    let (top, right, bottom, left) = if r == 0 {
        (0..0, 0..0, 0..0, 0..0)
    } else {
        (-r..r + 1, -r + 1..r + 1, 0..2 * r, 0..2 * r - 1)
    };

    single
        .into_iter()
        .chain(top.map(move |dx| (dx, -r)))
        .chain(right.map(move |dy| (r, dy)))
        .chain(bottom.map(move |i| (r - 1 - i, r)))
        .chain(left.map(move |i| (-r, r - 1 - i)))
}

fn target_cell(normalized: f32, cells: usize) -> isize {
    let raw = (normalized * cells as f32 * 0.999).floor() as isize;
    raw.clamp(0, cells as isize - 1)
}

fn non_zero_range(range: f32) -> f32 {
    if range.abs() <= f32::EPSILON || !range.is_finite() {
        1.0
    } else {
        range
    }
}

/// Tile geometry of the topic grid inside a group's bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGrid {
    pub bounds: Rect,
    pub cols: usize,
    pub rows: usize,
}

impl TileGrid {
    pub fn new(bounds: Rect, cols: usize, rows: usize) -> Self {
        Self {
            bounds,
            cols: cols.max(1),
            rows: rows.max(1),
        }
    }

    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(
            self.bounds.w / self.cols as f32,
            self.bounds.h / self.rows as f32,
        )
    }

    pub fn tile_center(&self, col: usize, row: usize) -> Vec2 {
        let tile = self.tile_size();
        Vec2::new(
            self.bounds.x + (col as f32 + 0.5) * tile.x,
            self.bounds.y + (row as f32 + 0.5) * tile.y,
        )
    }

    /// Grid cell containing `point`, or `None` when it lies outside the grid.
    pub fn cell_at(&self, point: Vec2) -> Option<(usize, usize)> {
        let tile = self.tile_size();
        let col = ((point.x - self.bounds.x) / tile.x).floor();
        let row = ((point.y - self.bounds.y) / tile.y).floor();
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        (col < self.cols && row < self.rows).then_some((col, row))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{arrange, project_to_2d, ring_offsets, TileGrid};
    use crate::math::{Rect, Vec2};

    fn one_hot(dims: usize, hot: usize, strength: f32) -> Vec<f32> {
        (0..dims)
            .map(|k| if k == hot { strength } else { (1.0 - strength) / (dims - 1) as f32 })
            .collect()
    }

    #[test]
    fn ring_scan_order_is_explicit() {
        let ring: Vec<_> = ring_offsets(1).collect();
        assert_eq!(
            ring,
            vec![
                (-1, -1),
                (0, -1),
                (1, -1),
                (1, 0),
                (1, 1),
                (0, 1),
                (-1, 1),
                (-1, 0),
            ]
        );
        assert_eq!(ring_offsets(0).collect::<Vec<_>>(), vec![(0, 0)]);
    }

    #[test]
    fn ring_covers_perimeter_exactly_once() {
        for r in 1..5isize {
            let ring: Vec<_> = ring_offsets(r).collect();
            let unique: HashSet<_> = ring.iter().copied().collect();
            assert_eq!(ring.len(), (8 * r) as usize);
            assert_eq!(unique.len(), ring.len());
            assert!(ring.iter().all(|&(dx, dy)| dx.abs() == r || dy.abs() == r));
        }
    }

    #[test]
    fn every_topic_gets_a_unique_cell() {
        let vectors: Vec<Vec<f32>> = (0..20).map(|i| one_hot(20, i, 0.6)).collect();
        let refs: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
        let placements = arrange(&refs, 5, 4);

        assert_eq!(placements.len(), 20);
        let cells: HashSet<_> = placements.iter().map(|p| (p.col, p.row)).collect();
        assert_eq!(cells.len(), 20);
        let indices: HashSet<_> = placements.iter().map(|p| p.index).collect();
        assert_eq!(indices.len(), 20);
        assert!(placements.iter().all(|p| p.col < 5 && p.row < 4));
    }

    #[test]
    fn identical_vectors_spill_into_neighbouring_cells() {
        let vectors = vec![vec![0.5, 0.5, 0.0]; 4];
        let refs: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
        let placements = arrange(&refs, 3, 3);
        let cells: HashSet<_> = placements.iter().map(|p| (p.col, p.row)).collect();
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn undersized_grid_returns_partial_placement() {
        let vectors: Vec<Vec<f32>> = (0..6).map(|i| one_hot(6, i, 0.7)).collect();
        let refs: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
        assert_eq!(arrange(&refs, 2, 2).len(), 4);
    }

    #[test]
    fn projection_follows_dimension_angle() {
        let p = project_to_2d(&[0.0, 1.0, 0.0, 0.0]);
        assert!(p.x.abs() < 1.0e-5);
        assert!((p.y - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn tile_lookup_matches_tile_center() {
        let grid = TileGrid::new(Rect::new(4.0, 4.0, 300.0, 160.0), 5, 4);
        for col in 0..5 {
            for row in 0..4 {
                assert_eq!(grid.cell_at(grid.tile_center(col, row)), Some((col, row)));
            }
        }
        assert_eq!(grid.cell_at(Vec2::new(0.0, 0.0)), None);
        assert_eq!(grid.cell_at(Vec2::new(400.0, 50.0)), None);
    }
}
