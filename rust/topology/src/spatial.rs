// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grid hash for tolerance-based vertex identity.
//!
//! Two coordinates are the same vertex when they lie within the build
//! tolerance. Rather than comparing every pair, positions are bucketed into
//! square cells of side `cell_size` and a lookup inspects the 3x3
//! neighbourhood of its cell, giving O(1) average-case snapping.

use rustc_hash::FxHashMap;

use crate::arena::VertexArena;
use crate::keys::VertexKey;

/// A spatial hash grid keyed by cell coordinates.
///
/// Entries carry their own position, so the grid works for arena keys
/// during snapping and for plain mesh vertex ids during validation.
#[derive(Debug)]
pub struct VertexGrid<K = VertexKey> {
    cell_size: f64,
    grid: FxHashMap<(i64, i64), Vec<(K, [f64; 2])>>,
}

impl<K: Copy> VertexGrid<K> {
    /// Creates a new grid with the given cell size.
    ///
    /// `cell_size` should be >= the tolerance used for queries.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1e-12),
            grid: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, key: K, x: f64, y: f64) {
        let cell = self.cell_coords(x, y);
        self.grid.entry(cell).or_default().push((key, [x, y]));
    }

    /// Finds the nearest entry within `tolerance` of `(x, y)`.
    ///
    /// Equally near entries resolve to the one inserted first in the
    /// lowest neighbouring cell, so repeated builds snap identically.
    pub fn find_near(&self, x: f64, y: f64, tolerance: f64) -> Option<K> {
        let tol_sq = tolerance * tolerance;
        let mut best: Option<(K, f64)> = None;

        self.visit_neighbourhood(x, y, |key, p| {
            let dist_sq = (p[0] - x).powi(2) + (p[1] - y).powi(2);
            if dist_sq <= tol_sq && best.map_or(true, |(_, d)| dist_sq < d) {
                best = Some((key, dist_sq));
            }
        });

        best.map(|(k, _)| k)
    }

    /// Finds every entry within `tolerance` of `(x, y)`.
    pub fn find_all_near(&self, x: f64, y: f64, tolerance: f64) -> Vec<K> {
        let tol_sq = tolerance * tolerance;
        let mut result = Vec::new();

        self.visit_neighbourhood(x, y, |key, p| {
            let dist_sq = (p[0] - x).powi(2) + (p[1] - y).powi(2);
            if dist_sq <= tol_sq {
                result.push(key);
            }
        });

        result
    }

    pub fn len(&self) -> usize {
        self.grid.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    fn visit_neighbourhood(&self, x: f64, y: f64, mut visit: impl FnMut(K, [f64; 2])) {
        let (cx, cy) = self.cell_coords(x, y);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(entries) = self.grid.get(&(cx + dx, cy + dy)) {
                    for &(key, p) in entries {
                        visit(key, p);
                    }
                }
            }
        }
    }

    fn cell_coords(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }
}

impl VertexArena {
    /// Returns an existing vertex within `tolerance` of `(x, y)`, or creates
    /// a new one. This is the merge-or-create step of ring decomposition.
    ///
    /// A vertex is only created when nothing lies within tolerance, so the
    /// arena's vertices stay pairwise farther apart than `tolerance`.
    pub fn find_or_add_vertex(
        &mut self,
        grid: &mut VertexGrid,
        x: f64,
        y: f64,
        tolerance: f64,
    ) -> VertexKey {
        if let Some(existing) = grid.find_near(x, y, tolerance) {
            return existing;
        }

        let key = self.add_vertex(x, y);
        grid.insert(key, x, y);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_find_near() {
        let mut arena = VertexArena::new();
        let mut grid = VertexGrid::new(0.01);
        let v0 = arena.find_or_add_vertex(&mut grid, 0.0, 0.0, 0.01);
        arena.find_or_add_vertex(&mut grid, 10.0, 10.0, 0.01);

        // Exact match
        assert_eq!(grid.find_near(0.0, 0.0, 0.001), Some(v0));

        // Within tolerance
        assert_eq!(grid.find_near(0.001, 0.0, 0.01), Some(v0));

        // Outside tolerance
        assert_eq!(grid.find_near(1.0, 0.0, 0.01), None);
    }

    #[test]
    fn find_or_add_reuses_vertex() {
        let mut arena = VertexArena::new();
        let mut grid = VertexGrid::new(0.001);

        let v0 = arena.find_or_add_vertex(&mut grid, 0.0, 0.0, 0.001);
        let v1 = arena.find_or_add_vertex(&mut grid, 0.0001, 0.0, 0.001);
        let v2 = arena.find_or_add_vertex(&mut grid, 5.0, 5.0, 0.001);

        assert_eq!(v0, v1);
        assert_ne!(v0, v2);
        assert_eq!(arena.vertex_count(), 2);
    }

    #[test]
    fn neighbouring_cell_is_searched() {
        let mut grid: VertexGrid<usize> = VertexGrid::new(1.0);
        // Just across a cell border from the query point.
        grid.insert(7, 0.99, 0.5);
        assert_eq!(grid.find_near(1.01, 0.5, 0.05), Some(7));
    }

    #[test]
    fn nearest_wins_over_first() {
        let mut grid: VertexGrid<usize> = VertexGrid::new(1.0);
        grid.insert(0, 0.5, 0.0);
        grid.insert(1, 0.1, 0.0);
        assert_eq!(grid.find_near(0.0, 0.0, 1.0), Some(1));
    }

    #[test]
    fn find_all_near() {
        let mut grid: VertexGrid<usize> = VertexGrid::new(0.01);
        grid.insert(0, 0.0, 0.0);
        grid.insert(1, 0.001, 0.0);
        grid.insert(2, 10.0, 10.0);

        let mut near = grid.find_all_near(0.0, 0.0, 0.01);
        near.sort_unstable();
        assert_eq!(near, vec![0, 1]);
        assert_eq!(grid.len(), 3);
    }
}
