#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Grainbrot: a tiled Mandelbrot renderer and grain-size benchmark
//!
//! The Mandelbrot set is computed one pixel at a time, and every pixel
//! is independent of every other pixel, which makes it a pleasant
//! specimen for studying task granularity.  This crate carves the image
//! into rectangular tiles by recursive bisection, hands the tiles to a
//! work-stealing pool of worker threads, and then asks an interesting
//! question: how big should a tile be?
//!
//! Tiny tiles balance the load beautifully but drown the pool in
//! scheduling overhead.  Huge tiles carry nearly no overhead but leave
//! workers idle while one straggler grinds through the heart of the
//! set.  The benchmark harness sweeps the maximum tile side (the "grain
//! size") across its useful range, renders one full frame per grain,
//! times each frame, and reports the grain that came out fastest, along
//! with a table and a scatter plot of every sample.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;
#[cfg(test)]
extern crate tempfile;

pub mod error;
pub mod grid;
pub mod mandel;
pub mod palette;
pub mod planes;
pub mod pool;
pub mod sink;
pub mod sweep;
pub mod tiles;

pub use error::Error;
pub use grid::Grid;
pub use palette::{Color, PaletteMode};
pub use planes::PlaneWindow;
pub use pool::TilePool;
pub use sink::OutputSink;
pub use sweep::{run_sweep, BenchmarkSample, SweepConfig, SweepOutcome};
pub use tiles::Tile;
