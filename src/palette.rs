// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Maps iteration counts to colors.  The palette is not meant to be
//! pretty; it is meant to be a readable encoding of the escape time, so
//! that two snapshots of the same field can be diffed by eye.  Each
//! mode lights up exactly one channel, which also lets the checkpoint
//! images from different grain sizes tell themselves apart.

use num::clamp;

/// An 8-bit RGB color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// The color of points that never escaped.
    pub const BLACK: Color = Color(0, 0, 0);
    /// The scatter plot background.
    pub const WHITE: Color = Color(255, 255, 255);
}

/// Selects which channel carries the escape time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PaletteMode {
    /// Escape time on the red channel.  The default for swept frames.
    Primary,
    /// Escape time on the green channel.
    Secondary,
    /// Escape time on the blue channel.
    Tertiary,
}

impl PaletteMode {
    /// Picks a mode for the nth checkpoint.  The first checkpoint is
    /// green, the second blue, and the cycle wraps back through red so
    /// consecutive snapshots never share a channel.
    pub fn cycling(index: usize) -> PaletteMode {
        match index % 3 {
            1 => PaletteMode::Secondary,
            2 => PaletteMode::Tertiary,
            _ => PaletteMode::Primary,
        }
    }

    /// Colors an escape time.  `k >= limit` means the point never
    /// escaped and renders black; otherwise the active channel carries
    /// `10 * k`, saturating at 255.
    pub fn shade(self, k: usize, limit: usize) -> Color {
        if k >= limit {
            return Color::BLACK;
        }
        let channel = clamp(10 * k, 0, 255) as u8;
        match self {
            PaletteMode::Primary => Color(channel, 0, 0),
            PaletteMode::Secondary => Color(0, channel, 0),
            PaletteMode::Tertiary => Color(0, 0, channel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandel::MAX_ITERATIONS;

    #[test]
    fn non_escaping_points_are_black_in_every_mode() {
        for mode in &[
            PaletteMode::Primary,
            PaletteMode::Secondary,
            PaletteMode::Tertiary,
        ] {
            assert_eq!(mode.shade(MAX_ITERATIONS, MAX_ITERATIONS), Color::BLACK);
        }
    }

    #[test]
    fn zero_escape_time_is_a_zero_channel() {
        assert_eq!(PaletteMode::Primary.shade(0, MAX_ITERATIONS), Color(0, 0, 0));
        assert_eq!(PaletteMode::Tertiary.shade(0, MAX_ITERATIONS), Color(0, 0, 0));
    }

    #[test]
    fn active_channel_scales_with_escape_time() {
        assert_eq!(PaletteMode::Primary.shade(5, MAX_ITERATIONS), Color(50, 0, 0));
        assert_eq!(PaletteMode::Secondary.shade(12, MAX_ITERATIONS), Color(0, 120, 0));
        assert_eq!(PaletteMode::Tertiary.shade(3, MAX_ITERATIONS), Color(0, 0, 30));
    }

    #[test]
    fn channel_saturates_instead_of_wrapping() {
        assert_eq!(
            PaletteMode::Primary.shade(200, MAX_ITERATIONS),
            Color(255, 0, 0)
        );
    }

    #[test]
    fn checkpoint_modes_cycle() {
        assert_eq!(PaletteMode::cycling(1), PaletteMode::Secondary);
        assert_eq!(PaletteMode::cycling(2), PaletteMode::Tertiary);
        assert_eq!(PaletteMode::cycling(3), PaletteMode::Primary);
        assert_eq!(PaletteMode::cycling(4), PaletteMode::Secondary);
    }
}
