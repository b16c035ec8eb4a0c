// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The work-stealing executor.  A fixed set of worker threads is
//! spawned once and reused for every frame of the process; between
//! frames the workers block on a channel, and within a frame they pop
//! tiles from their own LIFO deques, refill from the global injector,
//! and steal from each other when their own queues run dry.
//!
//! A frame is one recursive bisection of the full pixel range.  A
//! worker that pops a tile larger than the grain size splits it and
//! pushes both halves locally; a worker that pops a leaf renders it.
//! Join bookkeeping counts cells rather than tasks: splits conserve
//! area and leaves retire it, so a pending count of zero means every
//! cell has been written exactly once and no tile is left in any queue.

use std::any::Any;
use std::iter;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Receiver, Sender};
use crossbeam::deque::{Injector, Steal, Stealer, Worker};
use crossbeam::utils::Backoff;
use itertools::iproduct;

use error::Error;
use grid::Grid;
use mandel::escape_time;
use palette::{Color, PaletteMode};
use planes::PlaneWindow;
use tiles::Tile;

/// Everything a worker needs to execute one frame.  Lives on the
/// orchestrator's stack for the duration of a single `render` call.
struct FrameCtx {
    buffer: *mut Color,
    width: usize,
    grain: usize,
    limit: usize,
    plane: PlaneWindow,
    mode: PaletteMode,
    pending: AtomicUsize,
    failed: AtomicBool,
}

// Safety: workers share a FrameCtx by reference.  The buffer pointer is
// only written through disjoint tile ranges (the bisection partitions
// the frame exactly), the remaining fields are either immutable plain
// data or atomics, and `render` does not return until every worker has
// acknowledged the frame, so the context outlives all of its users.
unsafe impl Sync for FrameCtx {}

/// A frame announcement sent to each worker.
struct FrameRef(*const FrameCtx);

// Safety: the pointee is alive until every worker acknowledges the
// frame, and `render` blocks on those acknowledgements.
unsafe impl Send for FrameRef {}

struct Shared {
    injector: Injector<Tile>,
    stealers: Vec<Stealer<Tile>>,
}

/// A fixed-size work-stealing pool that renders frames of escape-time
/// tiles.  Create it once and feed it every frame of the sweep.
pub struct TilePool {
    threads: usize,
    shared: Arc<Shared>,
    frame_txs: Vec<Sender<FrameRef>>,
    done_rx: Receiver<()>,
    handles: Vec<JoinHandle<()>>,
}

impl TilePool {
    /// Spawns a pool of exactly `threads` workers (at least one).
    pub fn new(threads: usize) -> TilePool {
        let threads = threads.max(1);

        let mut locals = Vec::with_capacity(threads);
        let mut stealers = Vec::with_capacity(threads);
        for _ in 0..threads {
            let local = Worker::<Tile>::new_lifo();
            stealers.push(local.stealer());
            locals.push(local);
        }

        let shared = Arc::new(Shared {
            injector: Injector::new(),
            stealers,
        });

        let (done_tx, done_rx) = unbounded();
        let mut frame_txs = Vec::with_capacity(threads);
        let mut handles = Vec::with_capacity(threads);
        for (index, local) in locals.into_iter().enumerate() {
            let (frame_tx, frame_rx) = unbounded::<FrameRef>();
            frame_txs.push(frame_tx);
            let shared = shared.clone();
            let done = done_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("tile-worker-{}", index))
                .spawn(move || worker_loop(local, shared, frame_rx, done))
                .expect("failed to spawn tile worker");
            handles.push(handle);
        }

        TilePool {
            threads,
            shared,
            frame_txs,
            done_rx,
            handles,
        }
    }

    /// Spawns one worker per available hardware thread.
    pub fn sized_to_hardware() -> TilePool {
        TilePool::new(::num_cpus::get())
    }

    /// The number of workers in the pool.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Renders one full frame into `grid`: partitions the frame into
    /// tiles no wider or taller than `grain`, executes every tile, and
    /// returns once all of them have completed.  Blocking; frames never
    /// overlap.
    ///
    /// If a worker task fails, the rest of the frame is abandoned, the
    /// buffer contents are unspecified, and the frame's failure is
    /// returned as a single error.  The pool remains usable.
    pub fn render(
        &mut self,
        grid: &mut Grid,
        plane: &PlaneWindow,
        mode: PaletteMode,
        grain: usize,
        limit: usize,
    ) -> Result<(), Error> {
        assert!(grid.width() == plane.columns() && grid.height() == plane.rows());

        let root = Tile::frame(grid.height(), grid.width());
        let ctx = FrameCtx {
            buffer: grid.cells_mut().as_mut_ptr(),
            width: grid.width(),
            grain: grain.max(1),
            limit,
            plane: *plane,
            mode,
            pending: AtomicUsize::new(root.area()),
            failed: AtomicBool::new(false),
        };

        if root.area() > 0 {
            self.shared.injector.push(root);
        }
        for frame_tx in &self.frame_txs {
            frame_tx
                .send(FrameRef(&ctx))
                .expect("tile worker exited early");
        }
        for _ in 0..self.threads {
            self.done_rx.recv().expect("tile worker exited early");
        }

        if ctx.failed.load(Ordering::Relaxed) {
            Err(Error::frame("a worker task panicked mid-frame"))
        } else {
            Ok(())
        }
    }
}

impl Drop for TilePool {
    fn drop(&mut self) {
        // Closing the frame channels lets the workers fall out of
        // their receive loops.
        self.frame_txs.clear();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    local: Worker<Tile>,
    shared: Arc<Shared>,
    frames: Receiver<FrameRef>,
    done: Sender<()>,
) {
    for frame in frames.iter() {
        // Safety: see FrameRef.  The context stays alive until the
        // acknowledgement below has been received.
        let ctx = unsafe { &*frame.0 };
        drain(&local, &shared, ctx);
        if done.send(()).is_err() {
            break;
        }
    }
}

/// Works on the current frame until every cell of it is accounted for.
fn drain(local: &Worker<Tile>, shared: &Shared, ctx: &FrameCtx) {
    let backoff = Backoff::new();
    while ctx.pending.load(Ordering::Acquire) != 0 {
        match next_tile(local, shared) {
            Some(tile) => {
                backoff.reset();
                step(local, ctx, tile);
            }
            None => backoff.snooze(),
        }
    }
}

/// The canonical deque search order: local pop first, then a batch
/// from the global injector, then a steal from any sibling.
fn next_tile(local: &Worker<Tile>, shared: &Shared) -> Option<Tile> {
    local.pop().or_else(|| {
        iter::repeat_with(|| {
            shared
                .injector
                .steal_batch_and_pop(local)
                .or_else(|| shared.stealers.iter().map(|s| s.steal()).collect())
        })
        .find(|steal: &Steal<Tile>| !steal.is_retry())
        .and_then(|steal| steal.success())
    })
}

/// Processes one tile: splits it, renders it, or, on a poisoned frame,
/// retires it unexecuted so the join can still complete.
fn step(local: &Worker<Tile>, ctx: &FrameCtx, tile: Tile) {
    if ctx.failed.load(Ordering::Relaxed) {
        ctx.pending.fetch_sub(tile.area(), Ordering::Release);
        return;
    }
    if tile.is_leaf(ctx.grain) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| paint(ctx, tile))) {
            ctx.failed.store(true, Ordering::Relaxed);
            error!("tile {:?} failed: {}", tile, panic_reason(&payload));
        }
        ctx.pending.fetch_sub(tile.area(), Ordering::Release);
    } else {
        let (near, far) = tile.split();
        local.push(far);
        local.push(near);
    }
}

/// Runs the mapping, kernel, and palette over every cell of one leaf.
fn paint(ctx: &FrameCtx, tile: Tile) {
    for (row, column) in iproduct!(tile.rows(), tile.columns()) {
        let k = escape_time(ctx.plane.point_at(row, column), ctx.limit);
        let color = ctx.mode.shade(k, ctx.limit);
        // Safety: the bisection hands every cell to exactly one leaf,
        // so no other task writes this offset during the frame.
        unsafe {
            *ctx.buffer.add(row * ctx.width + column) = color;
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::Complex;

    fn window(side: usize) -> PlaneWindow {
        PlaneWindow::new(
            side,
            side,
            Complex::new(-2.2, 1.5),
            Complex::new(0.8, -1.5),
        )
        .unwrap()
    }

    /// The obvious serial rendering, used as ground truth.
    fn reference(plane: &PlaneWindow, mode: PaletteMode, limit: usize) -> Grid {
        let mut grid = Grid::new(plane.columns(), plane.rows());
        for row in 0..plane.rows() {
            for column in 0..plane.columns() {
                let k = escape_time(plane.point_at(row, column), limit);
                grid.set(row, column, mode.shade(k, limit));
            }
        }
        grid
    }

    #[test]
    fn pool_matches_the_serial_rendering() {
        let plane = window(64);
        let mut pool = TilePool::new(4);
        let mut grid = Grid::new(64, 64);
        pool.render(&mut grid, &plane, PaletteMode::Primary, 8, 256)
            .unwrap();
        assert_eq!(grid, reference(&plane, PaletteMode::Primary, 256));
    }

    #[test]
    fn rendering_twice_is_idempotent() {
        let plane = window(48);
        let mut pool = TilePool::new(3);
        let mut first = Grid::new(48, 48);
        let mut second = Grid::new(48, 48);
        pool.render(&mut first, &plane, PaletteMode::Primary, 5, 256)
            .unwrap();
        pool.render(&mut second, &plane, PaletteMode::Primary, 5, 256)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn grain_size_does_not_change_the_image() {
        let plane = window(64);
        let mut pool = TilePool::new(4);
        let mut finest = Grid::new(64, 64);
        let mut coarsest = Grid::new(64, 64);
        pool.render(&mut finest, &plane, PaletteMode::Primary, 1, 256)
            .unwrap();
        pool.render(&mut coarsest, &plane, PaletteMode::Primary, 64, 256)
            .unwrap();
        assert_eq!(finest, coarsest);
    }

    #[test]
    fn worker_count_does_not_change_the_image() {
        let plane = window(40);
        let mut narrow = TilePool::new(1);
        let mut wide = TilePool::new(8);
        let mut a = Grid::new(40, 40);
        let mut b = Grid::new(40, 40);
        narrow
            .render(&mut a, &plane, PaletteMode::Secondary, 6, 256)
            .unwrap();
        wide.render(&mut b, &plane, PaletteMode::Secondary, 6, 256)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn pool_survives_many_frames() {
        let plane = window(32);
        let mut pool = TilePool::new(2);
        let mut grid = Grid::new(32, 32);
        for grain in 1..=32 {
            pool.render(&mut grid, &plane, PaletteMode::Primary, grain, 64)
                .unwrap();
        }
    }
}
