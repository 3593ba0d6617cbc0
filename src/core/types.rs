//! Core type definitions used throughout the codebase

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Unique identifier for a placed building instance
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "#{}", _0)]
#[serde(transparent)]
pub struct BuildingId(pub u64);

/// Grid position of a building on the city map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two grid cells
    pub fn manhattan(&self, other: &GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Nearest integer with ties toward positive infinity (`-2.5` -> `-2`)
fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Round to the nearest integer, ties up, mapping non-finite values to 0
pub fn round_whole(value: f64) -> f64 {
    if value.is_finite() {
        round_half_up(value)
    } else {
        0.0
    }
}

/// Round to two decimal places, mapping non-finite values to 0
///
/// Era pressures are applied at this precision; building output uses
/// [`round_whole`]. The two must not be swapped.
pub fn round_cents(value: f64) -> f64 {
    if value.is_finite() {
        round_half_up(value * 100.0) / 100.0
    } else {
        0.0
    }
}

/// Treat non-finite numbers as zero and floor the result at zero
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = GridPos::new(2, -3);
        let b = GridPos::new(-1, 4);
        assert_eq!(a.manhattan(&b), 10);
        assert_eq!(b.manhattan(&a), 10);
        assert_eq!(a.manhattan(&a), 0);
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round_whole(13.75), 14.0);
        assert_eq!(round_whole(2.5), 3.0);
        assert_eq!(round_whole(f64::NAN), 0.0);
        assert_eq!(round_whole(-2.5), -2.0);
        assert_eq!(round_whole(-2.6), -3.0);
        assert_eq!(round_whole(0.49999999999999994), 0.0);
        assert_eq!(round_cents(1.23456), 1.23);
        assert_eq!(round_cents(0.005), 0.01);
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(1.2000000000000002), 1.2);
        assert_eq!(round_cents(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(-4.0), 0.0);
        assert_eq!(non_negative(f64::NAN), 0.0);
        assert_eq!(non_negative(7.5), 7.5);
    }

    #[test]
    fn test_building_id_display() {
        assert_eq!(BuildingId(7).to_string(), "#7");
        assert_eq!(BuildingId::from(3u64), BuildingId(3));
    }
}
