// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The benchmark harness.  Strictly sequential: one frame per grain
//! size, each frame fully joined before the next begins, each timed
//! with a monotonic clock, each appended to a sample table that only
//! this thread ever touches.

use std::time::{Duration, Instant};

use grid::Grid;
use mandel::MAX_ITERATIONS;
use palette::PaletteMode;
use planes::PlaneWindow;
use pool::TilePool;
use sink::OutputSink;

/// Tuning constants for a sweep.  The stepping policy and the
/// checkpoint interval have no deep rationale; they exist to sample
/// densely where scheduling overhead dominates and coarsely where load
/// balance dominates, so they stay adjustable.
#[derive(Copy, Clone, Debug)]
pub struct SweepConfig {
    /// Below this grain size the schedule advances by one.
    pub dense_limit: usize,
    /// At or above `dense_limit` the schedule advances by this much.
    pub coarse_step: usize,
    /// Grain sizes that are a positive multiple of this get a
    /// checkpoint snapshot, except the final grain size.  Zero
    /// disables checkpoints.
    pub checkpoint_interval: usize,
    /// Iteration ceiling handed to the escape-time kernel.
    pub iteration_limit: usize,
}

impl Default for SweepConfig {
    fn default() -> SweepConfig {
        SweepConfig {
            dense_limit: 10,
            coarse_step: 10,
            checkpoint_interval: 200,
            iteration_limit: MAX_ITERATIONS,
        }
    }
}

/// One timed frame: the grain size it ran at and how long the join
/// took.  Samples are appended in increasing grain order and never
/// mutated afterward.
#[derive(Copy, Clone, Debug)]
pub struct BenchmarkSample {
    /// The maximum tile side used for the frame.
    pub grain_size: usize,
    /// Wall-clock time from dispatch to the completion of the join.
    pub elapsed: Duration,
}

impl BenchmarkSample {
    /// The elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        (self.elapsed.as_micros() as f64) / 1000.0
    }
}

/// What a sweep leaves behind.
#[derive(Debug)]
pub struct SweepOutcome {
    /// One sample per successfully timed grain size, in increasing
    /// grain order.
    pub samples: Vec<BenchmarkSample>,
    /// How many artifacts failed to persist.  The sweep itself
    /// finishes regardless, but a caller should report failure.
    pub persistence_failures: usize,
}

impl SweepOutcome {
    /// The sample with the minimum elapsed time, if any frame
    /// succeeded.  Ties go to the smaller grain size.
    pub fn fastest(&self) -> Option<&BenchmarkSample> {
        self.samples.iter().min_by_key(|sample| sample.elapsed)
    }
}

/// The grain sizes a sweep visits, in order: every size up to
/// `dense_limit`, then multiples of `coarse_step` up to and including
/// `limit` (the display height).
pub fn grain_schedule(config: &SweepConfig, limit: usize) -> Vec<usize> {
    let mut grains = Vec::new();
    let mut grain = 1;
    while grain <= limit {
        grains.push(grain);
        grain = if grain < config.dense_limit {
            grain + 1
        } else {
            grain + config.coarse_step
        };
    }
    grains
}

/// Runs one full sweep: renders and times a frame per scheduled grain
/// size, snapshots checkpoint grains under alternate palettes, and
/// hands the final image, the sample table, and the scatter plot to
/// the sink.
///
/// A frame that fails loses its sample and the sweep moves on; an
/// artifact that fails to persist is counted and the sweep moves on.
pub fn run_sweep(
    pool: &mut TilePool,
    grid: &mut Grid,
    plane: &PlaneWindow,
    sink: &OutputSink,
    config: &SweepConfig,
) -> SweepOutcome {
    let schedule = grain_schedule(config, grid.height());
    let final_grain = schedule.last().cloned();
    let mut samples = Vec::with_capacity(schedule.len());
    let mut persistence_failures = 0;

    info!(
        "sweeping {} grain sizes over a {}x{} grid with {} workers",
        schedule.len(),
        grid.width(),
        grid.height(),
        pool.threads()
    );

    for &grain in &schedule {
        let start = Instant::now();
        match pool.render(grid, plane, PaletteMode::Primary, grain, config.iteration_limit) {
            Ok(()) => {
                let sample = BenchmarkSample {
                    grain_size: grain,
                    elapsed: start.elapsed(),
                };
                info!(
                    "grain size {}: elapsed time {:.3} ms",
                    grain,
                    sample.elapsed_ms()
                );
                samples.push(sample);
            }
            Err(err) => {
                warn!("no sample for grain size {}: {}", grain, err);
                continue;
            }
        }

        if is_checkpoint(config, grain, final_grain) {
            let mode = PaletteMode::cycling(grain / config.checkpoint_interval);
            match pool.render(grid, plane, mode, grain, config.iteration_limit) {
                Ok(()) => {
                    if let Err(err) = sink.write_checkpoint(grid, grain) {
                        error!("{}", err);
                        persistence_failures += 1;
                    }
                }
                Err(err) => warn!("checkpoint at grain size {} abandoned: {}", grain, err),
            }
        }
    }

    if let Err(err) = sink.write_final(grid) {
        error!("{}", err);
        persistence_failures += 1;
    }
    if let Err(err) = sink.write_report(&samples) {
        error!("{}", err);
        persistence_failures += 1;
    }
    if let Err(err) = sink.write_scatter(&samples, grid.width(), grid.height()) {
        error!("{}", err);
        persistence_failures += 1;
    }

    SweepOutcome {
        samples,
        persistence_failures,
    }
}

/// A grain gets a checkpoint when it is a positive multiple of the
/// interval and is not the last grain of the sweep; the final frame
/// already persists as the run's primary image.
fn is_checkpoint(config: &SweepConfig, grain: usize, final_grain: Option<usize>) -> bool {
    config.checkpoint_interval > 0
        && grain % config.checkpoint_interval == 0
        && Some(grain) != final_grain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_is_dense_then_coarse() {
        let config = SweepConfig::default();
        assert_eq!(
            grain_schedule(&config, 60),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 20, 30, 40, 50, 60]
        );
    }

    #[test]
    fn schedule_stops_at_the_limit() {
        let config = SweepConfig::default();
        assert_eq!(
            grain_schedule(&config, 25),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 20]
        );
    }

    #[test]
    fn schedule_honors_custom_stepping() {
        let config = SweepConfig {
            dense_limit: 3,
            coarse_step: 5,
            ..SweepConfig::default()
        };
        assert_eq!(grain_schedule(&config, 20), vec![1, 2, 3, 8, 13, 18]);
    }

    #[test]
    fn schedule_is_strictly_increasing() {
        let config = SweepConfig::default();
        let grains = grain_schedule(&config, 600);
        for pair in grains.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(grains.last(), Some(&600));
    }

    #[test]
    fn fastest_picks_the_minimum_and_breaks_ties_low() {
        let outcome = SweepOutcome {
            samples: vec![
                BenchmarkSample {
                    grain_size: 1,
                    elapsed: Duration::from_millis(9),
                },
                BenchmarkSample {
                    grain_size: 2,
                    elapsed: Duration::from_millis(4),
                },
                BenchmarkSample {
                    grain_size: 3,
                    elapsed: Duration::from_millis(4),
                },
            ],
            persistence_failures: 0,
        };
        assert_eq!(outcome.fastest().unwrap().grain_size, 2);
    }

    #[test]
    fn fastest_of_nothing_is_nothing() {
        let outcome = SweepOutcome {
            samples: vec![],
            persistence_failures: 0,
        };
        assert!(outcome.fastest().is_none());
    }

    #[test]
    fn checkpoints_skip_the_final_grain() {
        let config = SweepConfig {
            checkpoint_interval: 50,
            ..SweepConfig::default()
        };
        assert!(is_checkpoint(&config, 50, Some(100)));
        assert!(!is_checkpoint(&config, 100, Some(100)));
        assert!(!is_checkpoint(&config, 40, Some(100)));
    }

    #[test]
    fn zero_interval_disables_checkpoints() {
        let config = SweepConfig {
            checkpoint_interval: 0,
            ..SweepConfig::default()
        };
        assert!(!is_checkpoint(&config, 50, Some(100)));
    }
}
