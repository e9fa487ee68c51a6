//! Uniform-grid spatial hashing for pairwise proximity queries.
//!
//! Points are binned into square cells no smaller than the query radius, then
//! sorted by cell with a counting sort so each cell is a contiguous slice of
//! `sorted`. A pair query only has to look at a cell and its forward neighbors,
//! which visits every unordered pair exactly once.

use glam::Vec2;

/// Forward half of the 3x3 neighborhood (self included). Visiting only these
/// offsets from every cell covers each pair of adjacent cells once.
const FORWARD_OFFSETS: [(i32, i32); 5] = [(0, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

/// Cell budget. Point sets spread wider than this at the requested size get
/// coarser cells.
const MAX_CELLS: f32 = (1u32 << 20) as f32;

/// Cell-sorted index over a set of points.
#[derive(Debug, Default, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    origin: Vec2,
    cols: i32,
    rows: i32,
    /// Start offset into `sorted` per cell, plus one trailing end marker.
    cell_start: Vec<u32>,
    /// Point indices ordered by cell.
    sorted: Vec<u32>,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebin `points` with cells of `cell_size`. Buffers are reused between calls.
    pub fn rebuild(&mut self, points: &[Vec2], cell_size: f32) {
        self.cell_size = cell_size.max(1.0);
        self.sorted.clear();
        self.cell_start.clear();

        if points.is_empty() {
            self.cols = 0;
            self.rows = 0;
            return;
        }

        let (min, max) = points
            .iter()
            .fold((Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        self.origin = min;
        let span = max - min;
        let extent = if span.is_finite() {
            let cells = |size: f32| ((span.x / size).floor() + 1.0) * ((span.y / size).floor() + 1.0);
            while cells(self.cell_size) > MAX_CELLS {
                self.cell_size *= 2.0;
            }
            (span / self.cell_size).floor()
        } else {
            Vec2::ZERO
        };
        self.cols = extent.x as i32 + 1;
        self.rows = extent.y as i32 + 1;

        let cell_count = self.cols as usize * self.rows as usize;
        self.cell_start.resize(cell_count + 1, 0);

        // Histogram
        for p in points {
            let cell = self.cell_index(*p);
            self.cell_start[cell + 1] += 1;
        }
        // Prefix sum
        for i in 1..=cell_count {
            self.cell_start[i] += self.cell_start[i - 1];
        }
        // Scatter
        let mut cursor = self.cell_start.clone();
        self.sorted.resize(points.len(), 0);
        for (i, p) in points.iter().enumerate() {
            let cell = self.cell_index(*p);
            self.sorted[cursor[cell] as usize] = i as u32;
            cursor[cell] += 1;
        }
    }

    fn cell_coords(&self, p: Vec2) -> (i32, i32) {
        let c = ((p - self.origin) / self.cell_size).floor();
        (
            (c.x as i32).clamp(0, self.cols - 1),
            (c.y as i32).clamp(0, self.rows - 1),
        )
    }

    fn cell_index(&self, p: Vec2) -> usize {
        let (x, y) = self.cell_coords(p);
        (y * self.cols + x) as usize
    }

    fn cell(&self, x: i32, y: i32) -> &[u32] {
        if x < 0 || y < 0 || x >= self.cols || y >= self.rows {
            return &[];
        }
        let idx = (y * self.cols + x) as usize;
        let start = self.cell_start[idx] as usize;
        let end = self.cell_start[idx + 1] as usize;
        &self.sorted[start..end]
    }

    /// Call `visit(a, b, distance)` once for every unordered pair closer than
    /// `radius`. `points` must be the slice the grid was built from and
    /// `radius` must not exceed the cell size.
    pub fn for_each_pair_within<F>(&self, points: &[Vec2], radius: f32, mut visit: F)
    where
        F: FnMut(u32, u32, f32),
    {
        let radius_sq = radius * radius;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let home = self.cell(x, y);
                if home.is_empty() {
                    continue;
                }
                for &(dx, dy) in &FORWARD_OFFSETS {
                    let same_cell = dx == 0 && dy == 0;
                    let other = self.cell(x + dx, y + dy);
                    for (slot, &a) in home.iter().enumerate() {
                        let candidates = if same_cell { &other[slot + 1..] } else { other };
                        for &b in candidates {
                            let d_sq = points[a as usize].distance_squared(points[b as usize]);
                            if d_sq < radius_sq {
                                visit(a.min(b), a.max(b), d_sq.sqrt());
                            }
                        }
                    }
                }
            }
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }
}
