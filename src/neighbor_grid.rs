use crate::math::{Rect, Vec2};

const MIN_BOUND: f32 = 1.0e-6;
const MIN_CELL_SIZE: f32 = 1.0e-6;
const INVALID_INDEX: usize = usize::MAX;

/// Uniform bucket grid over a group's bounds, rebuilt every frame.
///
/// Buckets are intrusive singly linked lists: `head[cell]` is the first
/// member in the cell and `next[i]` the one after `i`.
pub struct NeighborGrid {
    cell_size: f32,
    origin: Vec2,
    width: f32,
    height: f32,
    cols: usize,
    rows: usize,
    member_count: usize,
    head: Vec<usize>,
    next: Vec<usize>,
    cached: Vec<Vec2>,
}

impl NeighborGrid {
    pub fn new(count: usize, bounds: Rect, cell_size: f32) -> Self {
        let mut grid = Self {
            cell_size: cell_size.max(MIN_CELL_SIZE),
            origin: Vec2::new(bounds.x, bounds.y),
            width: bounds.w.max(MIN_BOUND),
            height: bounds.h.max(MIN_BOUND),
            cols: 0,
            rows: 0,
            member_count: 0,
            head: Vec::new(),
            next: Vec::new(),
            cached: Vec::new(),
        };

        grid.ensure_layout(count);
        grid
    }

    pub fn rebuild(&mut self, positions: &[Vec2]) {
        let count = positions.len();

        self.ensure_layout(count);
        self.head.fill(INVALID_INDEX);

        if count == 0 {
            return;
        }

        self.cached[..count].copy_from_slice(positions);

        for (i, &p) in positions.iter().enumerate() {
            let cell = self.cell_index_for_position(p);
            self.next[i] = self.head[cell];
            self.head[cell] = i;
        }
    }

    /// Calls `callback` for every member other than `i` within `radius` of it.
    pub fn for_each_neighbor<F>(&self, i: usize, radius: f32, mut callback: F)
    where
        F: FnMut(usize),
    {
        if i >= self.member_count {
            return;
        }

        let radius = radius.max(0.0);
        let radius_sq = radius * radius;
        let cell_radius = (radius / self.cell_size).ceil() as isize;

        let p = self.cached[i];
        let base_cell_x = self.cell_x(p.x);
        let base_cell_y = self.cell_y(p.y);

        let min_y = (base_cell_y - cell_radius).max(0);
        let max_y = (base_cell_y + cell_radius).min(self.rows as isize - 1);
        let min_x = (base_cell_x - cell_radius).max(0);
        let max_x = (base_cell_x + cell_radius).min(self.cols as isize - 1);

        for cell_y in min_y..=max_y {
            for cell_x in min_x..=max_x {
                self.scan_cell(
                    cell_x as usize,
                    cell_y as usize,
                    i,
                    p,
                    radius_sq,
                    &mut callback,
                );
            }
        }
    }

    fn ensure_layout(&mut self, count: usize) {
        self.member_count = count;

        let cols = ((self.width / self.cell_size).ceil() as usize).max(1);
        let rows = ((self.height / self.cell_size).ceil() as usize).max(1);

        if cols != self.cols || rows != self.rows {
            self.cols = cols;
            self.rows = rows;
            self.head.resize(cols * rows, INVALID_INDEX);
        }

        if self.next.len() != count {
            self.next.resize(count, INVALID_INDEX);
            self.cached.resize(count, Vec2::ZERO);
        }
    }

    fn cell_index_for_position(&self, p: Vec2) -> usize {
        self.cell_y(p.y) as usize * self.cols + self.cell_x(p.x) as usize
    }

    fn cell_x(&self, x: f32) -> isize {
        (((x - self.origin.x) / self.cell_size).floor() as isize).clamp(0, self.cols as isize - 1)
    }

    fn cell_y(&self, y: f32) -> isize {
        (((y - self.origin.y) / self.cell_size).floor() as isize).clamp(0, self.rows as isize - 1)
    }

    fn scan_cell<F>(
        &self,
        cell_x: usize,
        cell_y: usize,
        i: usize,
        p: Vec2,
        radius_sq: f32,
        callback: &mut F,
    ) where
        F: FnMut(usize),
    {
        let mut candidate = self.head[cell_y * self.cols + cell_x];

        while candidate != INVALID_INDEX {
            if candidate != i && (self.cached[candidate] - p).length_sq() <= radius_sq {
                callback(candidate);
            }
            candidate = self.next[candidate];
        }
    }
}
