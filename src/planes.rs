//! Contains the PlaneWindow struct, which pins a rectangle of the
//! complex plane onto an integral pixel grid with its origin at the
//! top-left corner.  Rows grow downward and the imaginary axis shrinks
//! with them, matching the way raster images are stored.

use num::Complex;

/// A fixed viewport onto the complex plane.  Built once at startup and
/// immutable for the run; every pixel of every frame is mapped through
/// the same window, which is what makes repeated frames comparable.
#[derive(Copy, Clone, Debug)]
pub struct PlaneWindow {
    columns: usize,
    rows: usize,
    top_left: Complex<f64>,
    bottom_right: Complex<f64>,
    delta_x: f64,
    delta_y: f64,
}

impl PlaneWindow {
    /// Constructor.  Takes the grid dimensions and the two corners of
    /// the complex window.  The bottom-right corner must sit to the
    /// right of and below the top-left corner, and the grid must have
    /// at least one pixel on each axis.
    ///
    /// No aspect-ratio correction is performed; a caller that wants an
    /// undistorted image picks corners whose shape matches the grid's.
    pub fn new(
        columns: usize,
        rows: usize,
        top_left: Complex<f64>,
        bottom_right: Complex<f64>,
    ) -> Result<PlaneWindow, String> {
        if columns == 0 || rows == 0 {
            return Err("The pixel grid must have at least one pixel on each axis.".to_string());
        }

        if bottom_right.re <= top_left.re {
            return Err(
                "The bottom right corner is not to the right of the top left corner.".to_string(),
            );
        }

        if bottom_right.im >= top_left.im {
            return Err("The bottom right corner is not below the top left corner.".to_string());
        }

        Ok(PlaneWindow {
            columns,
            rows,
            top_left,
            bottom_right,
            delta_x: (bottom_right.re - top_left.re) / (columns as f64),
            delta_y: (bottom_right.im - top_left.im) / (rows as f64),
        })
    }

    /// The number of pixel columns the window maps onto.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// The number of pixel rows the window maps onto.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The top-left corner of the window.
    pub fn top_left(&self) -> Complex<f64> {
        self.top_left
    }

    /// The bottom-right corner of the window.
    pub fn bottom_right(&self) -> Complex<f64> {
        self.bottom_right
    }

    /// The plane distance covered by one pixel column.
    pub fn delta_x(&self) -> f64 {
        self.delta_x
    }

    /// The plane distance covered by one pixel row.  Negative, since
    /// rows grow downward while the imaginary axis grows upward.
    pub fn delta_y(&self) -> f64 {
        self.delta_y
    }

    /// Given the row and column of a pixel, return the complex number
    /// at the equivalent location on the plane.  Total over
    /// `0 <= row < rows`, `0 <= column < columns`.
    #[inline]
    pub fn point_at(&self, row: usize, column: usize) -> Complex<f64> {
        Complex {
            re: self.top_left.re + self.delta_x * (column as f64),
            im: self.top_left.im + self.delta_y * (row as f64),
        }
    }
}
