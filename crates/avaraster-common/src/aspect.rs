//! Eight-sector compass aspect.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compass direction a slope faces, quantized to 8 sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Aspect {
    /// [337.5°, 22.5°)
    #[serde(rename = "N")]
    North,
    /// [22.5°, 67.5°)
    #[serde(rename = "NE")]
    NorthEast,
    /// [67.5°, 112.5°)
    #[serde(rename = "E")]
    East,
    /// [112.5°, 157.5°)
    #[serde(rename = "SE")]
    SouthEast,
    /// [157.5°, 202.5°)
    #[serde(rename = "S")]
    South,
    /// [202.5°, 247.5°)
    #[serde(rename = "SW")]
    SouthWest,
    /// [247.5°, 292.5°)
    #[serde(rename = "W")]
    West,
    /// [292.5°, 337.5°)
    #[serde(rename = "NW")]
    NorthWest,
}

impl Aspect {
    /// All sectors clockwise from north.
    pub const ALL: [Aspect; 8] = [
        Aspect::North,
        Aspect::NorthEast,
        Aspect::East,
        Aspect::SouthEast,
        Aspect::South,
        Aspect::SouthWest,
        Aspect::West,
        Aspect::NorthWest,
    ];

    /// Sector for a compass bearing in degrees (any value, wrapped to 0..360).
    pub fn from_bearing(bearing: f64) -> Self {
        let bearing = bearing.rem_euclid(360.0);
        if !(22.5..337.5).contains(&bearing) {
            return Aspect::North;
        }
        let sector = ((bearing - 22.5) / 45.0).floor() as usize + 1;
        Self::ALL[sector.min(7)]
    }

    /// Short compass label ("N", "NE", ...).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Aspect::North => "N",
            Aspect::NorthEast => "NE",
            Aspect::East => "E",
            Aspect::SouthEast => "SE",
            Aspect::South => "S",
            Aspect::SouthWest => "SW",
            Aspect::West => "W",
            Aspect::NorthWest => "NW",
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aspect {
    type Err = String;

    /// Parse a compass label, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|aspect| aspect.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown aspect '{s}'"))
    }
}
