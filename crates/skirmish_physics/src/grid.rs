//! # Spatial Grid
//!
//! Broad phase for the collision world: a uniform grid of square cells,
//! hashed so that only occupied cells cost memory.
//!
//! A body is registered in every cell its box covers:
//!
//! ```text
//!  cell_size = 1000
//!  x:  0        1000      2000      3000
//!      |---------|---------|---------|
//!                    [#########]         box spanning x 1400..2600
//!                                        -> cells x = 1 and x = 2
//! ```
//!
//! The grid returns *candidates*. A body spanning several cells shows up
//! once per cell; exact tests and de-duplication belong to the caller.

use std::collections::HashMap;

use tracing::debug;

use crate::body::BodyId;
use crate::error::{PhysicsError, PhysicsResult};
use crate::math::Vec2i;
use crate::shape::Aabb;

/// Grid cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

/// Inclusive rectangle of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    /// First column.
    pub min_x: i32,
    /// First row.
    pub min_y: i32,
    /// Last column (inclusive).
    pub max_x: i32,
    /// Last row (inclusive).
    pub max_y: i32,
}

impl CellRange {
    /// Checks if a cell is inside the range.
    #[inline]
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min_x && cell.x <= self.max_x && cell.y >= self.min_y && cell.y <= self.max_y
    }

    /// Number of cells covered.
    #[must_use]
    pub fn len(&self) -> usize {
        let w = i64::from(self.max_x) - i64::from(self.min_x) + 1;
        let h = i64::from(self.max_y) - i64::from(self.min_y) + 1;
        (w.max(0) * h.max(0)) as usize
    }

    /// Checks if the range covers no cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates row by row over the covered cells.
    #[must_use]
    pub const fn cells(&self) -> CellIter {
        CellIter {
            range: *self,
            next: Some(Cell {
                x: self.min_x,
                y: self.min_y,
            }),
        }
    }
}

/// Row-major iterator over a [`CellRange`].
#[derive(Clone, Debug)]
pub struct CellIter {
    range: CellRange,
    next: Option<Cell>,
}

impl Iterator for CellIter {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        let cell = self.next.filter(|cell| self.range.contains(*cell))?;
        self.next = if cell.x < self.range.max_x {
            Some(Cell { x: cell.x + 1, y: cell.y })
        } else if cell.y < self.range.max_y {
            Some(Cell { x: self.range.min_x, y: cell.y + 1 })
        } else {
            None
        };
        Some(cell)
    }
}

/// Hashed uniform grid of body buckets.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: i32,
    buckets: HashMap<Cell, Vec<BodyId>>,
}

impl SpatialGrid {
    /// Creates an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidCellSize`] if `cell_size` is not
    /// positive.
    pub fn new(cell_size: i32) -> PhysicsResult<Self> {
        if cell_size <= 0 {
            return Err(PhysicsError::InvalidCellSize(cell_size));
        }
        debug!(cell_size, "Creating SpatialGrid");
        Ok(Self {
            cell_size,
            buckets: HashMap::new(),
        })
    }

    /// Returns the cell edge length in world units.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Number of occupied cells.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the cell holding a point.
    #[inline]
    #[must_use]
    pub const fn cell_of(&self, point: Vec2i) -> Cell {
        Cell {
            x: point.x.div_euclid(self.cell_size),
            y: point.y.div_euclid(self.cell_size),
        }
    }

    /// Returns the cells a box covers.
    ///
    /// Right and bottom edges are exclusive, matching strict overlap.
    #[must_use]
    pub const fn range_for(&self, shape: &Aabb) -> CellRange {
        let min = self.cell_of(Vec2i::new(shape.left(), shape.top()));
        let max = self.cell_of(Vec2i::new(shape.right() - 1, shape.bottom() - 1));
        CellRange {
            min_x: min.x,
            min_y: min.y,
            max_x: max.x,
            max_y: max.y,
        }
    }

    /// Returns the cells covering a square of `radius` around `center`.
    #[must_use]
    pub fn range_around(&self, center: Vec2i, radius: i32) -> CellRange {
        let radius = radius.max(0);
        let min = self.cell_of(Vec2i::new(
            center.x.saturating_sub(radius),
            center.y.saturating_sub(radius),
        ));
        let max = self.cell_of(Vec2i::new(
            center.x.saturating_add(radius),
            center.y.saturating_add(radius),
        ));
        CellRange {
            min_x: min.x,
            min_y: min.y,
            max_x: max.x,
            max_y: max.y,
        }
    }

    /// Registers a body in every cell of `range`.
    pub fn insert(&mut self, id: BodyId, range: CellRange) {
        for cell in range.cells() {
            self.buckets.entry(cell).or_default().push(id);
        }
    }

    /// Unregisters a body from every cell of `range`.
    pub fn remove(&mut self, id: BodyId, range: CellRange) {
        for cell in range.cells() {
            self.remove_from(cell, id);
        }
    }

    /// Moves a body from `old` to `new`, touching only cells whose
    /// membership changes.
    pub fn relocate(&mut self, id: BodyId, old: CellRange, new: CellRange) {
        if old == new {
            return;
        }
        for cell in old.cells().filter(|cell| !new.contains(*cell)) {
            self.remove_from(cell, id);
        }
        for cell in new.cells().filter(|cell| !old.contains(*cell)) {
            self.buckets.entry(cell).or_default().push(id);
        }
    }

    fn remove_from(&mut self, cell: Cell, id: BodyId) {
        let Some(bucket) = self.buckets.get_mut(&cell) else {
            return;
        };
        // Keep insertion order so candidate enumeration stays stable
        if let Some(pos) = bucket.iter().position(|member| *member == id) {
            bucket.remove(pos);
        }
        if bucket.is_empty() {
            self.buckets.remove(&cell);
        }
    }

    /// Returns the bodies registered in one cell.
    #[must_use]
    pub fn bucket(&self, cell: Cell) -> &[BodyId] {
        self.buckets.get(&cell).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterates over the candidates registered in `range`.
    ///
    /// Cells are visited row by row and each bucket in insertion order. A
    /// body may be yielded more than once.
    #[must_use]
    pub fn candidates(&self, range: CellRange) -> Candidates<'_> {
        Candidates {
            grid: self,
            cells: range.cells(),
            current: <&[BodyId]>::default().iter(),
        }
    }

    /// Drops every bucket.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

/// Candidate iterator returned by [`SpatialGrid::candidates`].
#[derive(Clone, Debug)]
pub struct Candidates<'a> {
    grid: &'a SpatialGrid,
    cells: CellIter,
    current: std::slice::Iter<'a, BodyId>,
}

impl Iterator for Candidates<'_> {
    type Item = BodyId;

    fn next(&mut self) -> Option<BodyId> {
        loop {
            if let Some(id) = self.current.next() {
                return Some(*id);
            }
            let cell = self.cells.next()?;
            self.current = self.grid.bucket(cell).iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(cx: i32, cy: i32, hx: i32, hy: i32) -> Aabb {
        Aabb::new(Vec2i::new(cx, cy), Vec2i::new(hx, hy)).unwrap()
    }

    #[test]
    fn test_range_for_excludes_far_edges() {
        let grid = SpatialGrid::new(1000).unwrap();
        // Exactly one cell: 0..1000 on both axes
        let range = grid.range_for(&aabb(500, 500, 500, 500));
        assert_eq!(range.len(), 1);
        assert_eq!(range.min_x, 0);
        assert_eq!(range.max_x, 0);

        let spanning = grid.range_for(&aabb(2000, 500, 600, 100));
        assert_eq!((spanning.min_x, spanning.max_x), (1, 2));
    }

    #[test]
    fn test_negative_coordinates() {
        let grid = SpatialGrid::new(1000).unwrap();
        let range = grid.range_for(&aabb(-500, -1500, 100, 100));
        assert_eq!((range.min_x, range.min_y), (-1, -2));
        assert_eq!((range.max_x, range.max_y), (-1, -2));
    }

    #[test]
    fn test_cell_iter_row_major() {
        let range = CellRange {
            min_x: 0,
            min_y: 0,
            max_x: 1,
            max_y: 1,
        };
        let cells: Vec<_> = range.cells().map(|c| (c.x, c.y)).collect();
        assert_eq!(cells, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_insert_relocate_remove() {
        let mut grid = SpatialGrid::new(1000).unwrap();
        let id = BodyId::new(0, 0);
        let old = grid.range_for(&aabb(900, 500, 200, 100));
        grid.insert(id, old);
        assert_eq!(grid.cell_count(), 2);

        let new = grid.range_for(&aabb(1500, 500, 200, 100));
        grid.relocate(id, old, new);
        assert_eq!(grid.cell_count(), 1);
        assert!(grid.bucket(Cell { x: 0, y: 0 }).is_empty());
        assert_eq!(grid.bucket(Cell { x: 1, y: 0 }), &[id]);

        grid.remove(id, new);
        assert_eq!(grid.cell_count(), 0);
    }

    #[test]
    fn test_candidates_may_repeat() {
        let mut grid = SpatialGrid::new(100).unwrap();
        let wide = BodyId::new(1, 0);
        let range = grid.range_for(&aabb(100, 50, 90, 10));
        grid.insert(wide, range);
        assert_eq!(grid.candidates(range).filter(|id| *id == wide).count(), 2);
    }

    #[test]
    fn test_invalid_cell_size() {
        assert_eq!(SpatialGrid::new(0).unwrap_err(), PhysicsError::InvalidCellSize(0));
    }
}
