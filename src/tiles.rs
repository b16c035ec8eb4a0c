// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rectangular pixel ranges and the recursive bisection that carves a
//! frame into them.  Tiles are plain values with no threading in them,
//! so the partition invariants can be checked without a pool.

use std::ops::Range;

/// A half-open rectangle of pixels, `[row0, row1) x [col0, col1)`.
/// Tiles are ephemeral: the scheduler mints them, exactly one worker
/// task consumes each, and nothing keeps them afterward.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    row0: usize,
    row1: usize,
    col0: usize,
    col1: usize,
}

impl Tile {
    /// Builds a tile from its half-open bounds.
    pub fn new(row0: usize, row1: usize, col0: usize, col1: usize) -> Tile {
        debug_assert!(row0 <= row1);
        debug_assert!(col0 <= col1);
        Tile { row0, row1, col0, col1 }
    }

    /// The tile covering a whole `rows x columns` frame.
    pub fn frame(rows: usize, columns: usize) -> Tile {
        Tile::new(0, rows, 0, columns)
    }

    /// The rows this tile spans.
    pub fn rows(&self) -> Range<usize> {
        self.row0..self.row1
    }

    /// The columns this tile spans.
    pub fn columns(&self) -> Range<usize> {
        self.col0..self.col1
    }

    /// The number of rows in the tile.
    pub fn row_span(&self) -> usize {
        self.row1 - self.row0
    }

    /// The number of columns in the tile.
    pub fn column_span(&self) -> usize {
        self.col1 - self.col0
    }

    /// The number of cells in the tile.
    pub fn area(&self) -> usize {
        self.row_span() * self.column_span()
    }

    /// The longer of the two side lengths; the quantity the grain size
    /// is measured against.
    pub fn longest_side(&self) -> usize {
        self.row_span().max(self.column_span())
    }

    /// True when the tile is small enough to execute as one task.
    pub fn is_leaf(&self, grain: usize) -> bool {
        self.longest_side() <= grain
    }

    /// Halves the tile across whichever axis is longer, at its
    /// midpoint.  Rows win ties.  The halves cover exactly the cells of
    /// the parent and nothing else.
    pub fn split(self) -> (Tile, Tile) {
        if self.row_span() >= self.column_span() {
            let mid = self.row0 + self.row_span() / 2;
            (
                Tile::new(self.row0, mid, self.col0, self.col1),
                Tile::new(mid, self.row1, self.col0, self.col1),
            )
        } else {
            let mid = self.col0 + self.column_span() / 2;
            (
                Tile::new(self.row0, self.row1, self.col0, mid),
                Tile::new(self.row0, self.row1, mid, self.col1),
            )
        }
    }
}

/// Enumerates the leaf tiles the scheduler would execute for a given
/// root and grain size.  This is the same bisection the pool performs,
/// minus the threads.
pub fn leaves(root: Tile, grain: usize) -> Vec<Tile> {
    let grain = grain.max(1);
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(tile) = stack.pop() {
        if tile.area() == 0 {
            continue;
        }
        if tile.is_leaf(grain) {
            out.push(tile);
        } else {
            let (near, far) = tile.split();
            stack.push(far);
            stack.push(near);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(rows: usize, columns: usize, grain: usize) -> Vec<usize> {
        let mut counts = vec![0usize; rows * columns];
        for tile in leaves(Tile::frame(rows, columns), grain) {
            for row in tile.rows() {
                for column in tile.columns() {
                    counts[row * columns + column] += 1;
                }
            }
        }
        counts
    }

    #[test]
    fn split_conserves_cells() {
        let tile = Tile::new(3, 10, 2, 7);
        let (a, b) = tile.split();
        assert_eq!(a.area() + b.area(), tile.area());
        assert_eq!(a.rows().end, b.rows().start);
    }

    #[test]
    fn split_prefers_the_longer_axis() {
        let wide = Tile::new(0, 2, 0, 10);
        let (left, right) = wide.split();
        assert_eq!(left.columns(), 0..5);
        assert_eq!(right.columns(), 5..10);
        assert_eq!(left.rows(), 0..2);
    }

    #[test]
    fn partition_covers_every_cell_exactly_once() {
        for &(rows, columns, grain) in &[
            (5, 7, 2),
            (7, 5, 1),
            (16, 16, 4),
            (100, 100, 13),
            (1, 64, 3),
            (63, 1, 10),
        ] {
            let counts = coverage(rows, columns, grain);
            assert!(
                counts.iter().all(|&c| c == 1),
                "gaps or overlaps for {}x{} at grain {}",
                rows,
                columns,
                grain
            );
        }
    }

    #[test]
    fn oversized_grain_yields_a_single_leaf() {
        let tiles = leaves(Tile::frame(9, 12), 100);
        assert_eq!(tiles, vec![Tile::frame(9, 12)]);
    }

    #[test]
    fn leaves_respect_the_grain() {
        for tile in leaves(Tile::frame(100, 60), 7) {
            assert!(tile.longest_side() <= 7);
            assert!(tile.area() > 0);
        }
    }

    #[test]
    fn empty_frames_produce_no_leaves() {
        assert!(leaves(Tile::frame(0, 10), 4).is_empty());
    }
}
