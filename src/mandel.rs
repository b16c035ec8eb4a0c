// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernel.  Everything else in this crate exists to
//! call this function many millions of times, so it stays small, pure,
//! and free of surprises.

use num::Complex;

/// The default iteration ceiling.  A point that survives this many
/// rounds of `z = z * z + c` is treated as a member of the set.
pub const MAX_ITERATIONS: usize = 256;

/// Squared magnitude beyond which an orbit has provably escaped.
/// Testing against the square avoids a square root per iteration.
pub const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

/// Returns the number of iterations it took the orbit of `c` to escape
/// the radius-two disc, or `limit` if it never did.  The orbit starts
/// at `c` itself, so a point already outside the disc escapes at zero.
#[inline]
pub fn escape_time(c: Complex<f64>, limit: usize) -> usize {
    let mut z = c;
    let mut k = 0;
    while k != limit && z.norm_sqr() < ESCAPE_RADIUS_SQUARED {
        z = z * z + c;
        k += 1;
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        assert_eq!(
            escape_time(Complex::new(0.0, 0.0), MAX_ITERATIONS),
            MAX_ITERATIONS
        );
    }

    #[test]
    fn far_points_escape_immediately() {
        for c in &[
            Complex::new(3.0, 0.0),
            Complex::new(0.0, -2.5),
            Complex::new(-2.0, 2.0),
        ] {
            assert_eq!(escape_time(*c, MAX_ITERATIONS), 0);
        }
    }

    #[test]
    fn near_points_escape_in_bounded_steps() {
        // |1 + i| < 2, but the first iteration lands on 1 + 3i.
        let k = escape_time(Complex::new(1.0, 1.0), MAX_ITERATIONS);
        assert_eq!(k, 1);
    }

    #[test]
    fn cardioid_interior_reaches_the_limit() {
        assert_eq!(
            escape_time(Complex::new(0.1, 0.1), MAX_ITERATIONS),
            MAX_ITERATIONS
        );
        assert_eq!(escape_time(Complex::new(-1.0, 0.0), MAX_ITERATIONS), MAX_ITERATIONS);
    }

    #[test]
    fn limit_is_respected() {
        assert_eq!(escape_time(Complex::new(0.0, 0.0), 7), 7);
    }
}
