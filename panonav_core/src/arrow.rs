//! Arrow-Icon Mapping
//! ==================
//!
//! Maps a heading onto one of eight compass glyphs for move buttons.
//! The heading is normalized into `[0, 360)` before indexing, so negative
//! headings and headings of 360° or more wrap the same way a compass does.

use panonav_env::normalize_heading;
use serde::{Deserialize, Serialize};

/// One of the eight compass directions, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arrow {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Arrow {
    /// All arrows in table order.
    pub const ALL: [Arrow; 8] = [
        Arrow::North,
        Arrow::NorthEast,
        Arrow::East,
        Arrow::SouthEast,
        Arrow::South,
        Arrow::SouthWest,
        Arrow::West,
        Arrow::NorthWest,
    ];

    /// Picks the arrow nearest to `heading`: `round(h / 45) mod 8`.
    pub fn from_heading(heading: f64) -> Self {
        let h = normalize_heading(heading);
        // h in [0, 360) so the rounded sector is in 0..=8
        let sector = (h / 45.0).round() as usize % 8;
        Self::ALL[sector]
    }

    pub fn glyph(&self) -> char {
        match self {
            Arrow::North => '↑',
            Arrow::NorthEast => '↗',
            Arrow::East => '→',
            Arrow::SouthEast => '↘',
            Arrow::South => '↓',
            Arrow::SouthWest => '↙',
            Arrow::West => '←',
            Arrow::NorthWest => '↖',
        }
    }
}

impl std::fmt::Display for Arrow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// Glyph for a heading.
pub fn heading_to_arrow(heading: f64) -> char {
    Arrow::from_heading(heading).glyph()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cardinal_headings() {
        assert_eq!(heading_to_arrow(0.0), '↑');
        assert_eq!(heading_to_arrow(90.0), '→');
        assert_eq!(heading_to_arrow(180.0), '↓');
        assert_eq!(heading_to_arrow(270.0), '←');
    }

    #[test]
    fn test_wraparound() {
        // round(359 / 45) = 8, 8 mod 8 = 0
        assert_eq!(heading_to_arrow(359.0), '↑');
        assert_eq!(heading_to_arrow(360.0), '↑');
        assert_eq!(heading_to_arrow(-45.0), '↖');
        assert_eq!(heading_to_arrow(-90.0), '←');
        assert_eq!(heading_to_arrow(405.0), '↗');
    }

    #[test]
    fn test_sector_boundaries() {
        assert_eq!(Arrow::from_heading(22.4), Arrow::North);
        assert_eq!(Arrow::from_heading(22.5), Arrow::NorthEast);
        assert_eq!(Arrow::from_heading(337.4), Arrow::NorthWest);
        assert_eq!(Arrow::from_heading(337.5), Arrow::North);
    }

    #[test]
    fn test_non_finite_is_north() {
        assert_eq!(Arrow::from_heading(f64::NAN), Arrow::North);
        assert_eq!(Arrow::from_heading(f64::NEG_INFINITY), Arrow::North);
    }

    proptest! {
        #[test]
        fn prop_total_over_compass(h in 0.0f64..360.0) {
            let glyph = heading_to_arrow(h);
            prop_assert!(Arrow::ALL.iter().any(|a| a.glyph() == glyph));
        }

        #[test]
        fn prop_full_turn_is_identity(deg in 0i32..360, turns in -3i32..3) {
            let h = deg as f64;
            let wrapped = (deg + 360 * turns) as f64;
            prop_assert_eq!(Arrow::from_heading(h), Arrow::from_heading(wrapped));
        }
    }
}
