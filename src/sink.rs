// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Persists what a sweep produces: the full-resolution image, the
//! checkpoint snapshots, the tabular timing report, and a scatter plot
//! of elapsed time against grain size.  Nothing here affects benchmark
//! correctness; given the same samples and dimensions the sink renders
//! the same bytes.

use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use image::png::PNGEncoder;
use image::ColorType;

use error::Error;
use grid::Grid;
use palette::Color;
use sweep::BenchmarkSample;

/// Radius, in pixels, of one scatter-plot sample disk.
const DOT_RADIUS: isize = 3;

/// The color of the minimum-time sample on the scatter plot.
const FASTEST_COLOR: Color = Color(220, 30, 30);

/// Writes every artifact of a run under one directory.
pub struct OutputSink {
    directory: PathBuf,
}

impl OutputSink {
    /// A sink that writes into `directory`.  The directory must
    /// already exist; creating it is the caller's business.
    pub fn new<P: Into<PathBuf>>(directory: P) -> OutputSink {
        OutputSink {
            directory: directory.into(),
        }
    }

    /// Persists the run's primary image as `mandelbrot.png`.
    pub fn write_final(&self, grid: &Grid) -> Result<PathBuf, Error> {
        let path = self.directory.join("mandelbrot.png");
        write_image(&path, grid)?;
        Ok(path)
    }

    /// Persists a checkpoint snapshot, named after the grain size that
    /// produced it.
    pub fn write_checkpoint(&self, grid: &Grid, grain: usize) -> Result<PathBuf, Error> {
        let path = self.directory.join(format!("mandelbrot_at_{}.png", grain));
        write_image(&path, grid)?;
        Ok(path)
    }

    /// Persists the buffer under an operator-supplied name, appending
    /// the `.png` extension when the name lacks it.
    pub fn write_named(&self, grid: &Grid, name: &str) -> Result<PathBuf, Error> {
        let file = if name.ends_with(".png") {
            name.to_string()
        } else {
            format!("{}.png", name)
        };
        let path = self.directory.join(file);
        write_image(&path, grid)?;
        Ok(path)
    }

    /// Persists the sample table as `timings.txt`.
    pub fn write_report(&self, samples: &[BenchmarkSample]) -> Result<PathBuf, Error> {
        let path = self.directory.join("timings.txt");
        fs::write(&path, render_report(samples)).map_err(|err| Error::persist(&path, err))?;
        Ok(path)
    }

    /// Renders and persists the scatter plot as
    /// `time_vs_grain_size.png`, sized like the fractal image itself.
    pub fn write_scatter(
        &self,
        samples: &[BenchmarkSample],
        width: usize,
        height: usize,
    ) -> Result<PathBuf, Error> {
        let path = self.directory.join("time_vs_grain_size.png");
        write_image(&path, &scatter_plot(samples, width, height))?;
        Ok(path)
    }
}

/// The timing report: a fixed header, one `grain\t\tmilliseconds` row
/// per sample, and a summary line naming the fastest grain.
pub fn render_report(samples: &[BenchmarkSample]) -> String {
    let mut out = String::from("grain size\t\telapsed time [ms]\n");
    for sample in samples {
        out.push_str(&format!(
            "{}\t\t{:.3}\n",
            sample.grain_size,
            sample.elapsed_ms()
        ));
    }
    match samples.iter().min_by_key(|sample| sample.elapsed) {
        Some(best) => out.push_str(&format!(
            "minimum elapsed time: {:.3} ms at grain size {}\n",
            best.elapsed_ms(),
            best.grain_size
        )),
        None => out.push_str("no samples recorded\n"),
    }
    out
}

/// Draws the sample cloud: grain size left to right, elapsed time
/// bottom to top, both axes linear, margins keeping the extreme disks
/// clear of the border.  The fastest sample is drawn last, in its own
/// color, so it stays visible even among near-ties.
pub fn scatter_plot(samples: &[BenchmarkSample], width: usize, height: usize) -> Grid {
    let mut grid = Grid::filled(width, height, Color::WHITE);
    if samples.is_empty() || width == 0 || height == 0 {
        return grid;
    }

    let margin_x = (width / 16) + (DOT_RADIUS as usize);
    let margin_y = (height / 16) + (DOT_RADIUS as usize);
    let span_x = width.saturating_sub(2 * margin_x + 1) as f64;
    let span_y = height.saturating_sub(2 * margin_y + 1) as f64;

    let max_grain = samples
        .iter()
        .map(|sample| sample.grain_size)
        .max()
        .unwrap_or(1)
        .max(1) as f64;
    let max_ms = samples
        .iter()
        .map(|sample| sample.elapsed_ms())
        .fold(0.0, f64::max);

    let fastest = samples
        .iter()
        .enumerate()
        .min_by_key(|&(_, sample)| sample.elapsed)
        .map(|(index, _)| index);

    let place = |sample: &BenchmarkSample| {
        let across = (sample.grain_size as f64) / max_grain;
        let up = if max_ms > 0.0 {
            sample.elapsed_ms() / max_ms
        } else {
            0.0
        };
        let column = margin_x + (across * span_x).round() as usize;
        let row = (height - 1)
            .saturating_sub(margin_y)
            .saturating_sub((up * span_y).round() as usize);
        (row, column)
    };

    for (index, sample) in samples.iter().enumerate() {
        if Some(index) == fastest {
            continue;
        }
        let (row, column) = place(sample);
        stamp_disk(&mut grid, row, column, DOT_RADIUS, Color::BLACK);
    }
    if let Some(index) = fastest {
        let (row, column) = place(&samples[index]);
        stamp_disk(&mut grid, row, column, DOT_RADIUS, FASTEST_COLOR);
    }
    grid
}

/// Fills a disc of the given radius, clipped to the grid.
fn stamp_disk(grid: &mut Grid, row: usize, column: usize, radius: isize, color: Color) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dy * dy + dx * dx > radius * radius {
                continue;
            }
            let r = row as isize + dy;
            let c = column as isize + dx;
            if r >= 0 && c >= 0 && (r as usize) < grid.height() && (c as usize) < grid.width() {
                grid.set(r as usize, c as usize, color);
            }
        }
    }
}

fn write_image(path: &Path, grid: &Grid) -> Result<(), Error> {
    let output = File::create(path).map_err(|err| Error::persist(path, err))?;
    PNGEncoder::new(output)
        .encode(
            &grid.rgb_bytes(),
            grid.width() as u32,
            grid.height() as u32,
            ColorType::RGB(8),
        )
        .map_err(|err| Error::persist(path, err))
}
