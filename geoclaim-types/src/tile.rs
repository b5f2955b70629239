use geo::Point;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Canonical identifier of one lattice cell, formatted as `"{lat},{lng}"`
/// with a fixed number of fractional digits.
///
/// Construction from a string does not validate the format; parsing into
/// coordinates is done by the engine's grid module, which reports
/// malformed keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridKey(String);

impl GridKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for GridKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for GridKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl AsRef<str> for GridKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for GridKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A claimed lattice cell.
///
/// `lat`/`lng` hold the cell's reference (minimum) corner, so deriving a
/// grid key from them reproduces `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub key: GridKey,
    pub owner_id: String,
    pub owner_color: String,
    pub owner_name: String,
    /// Claim or last transfer time, Unix milliseconds.
    pub claimed_at: u64,
    /// Geohash of the reference corner. Empty for records written before
    /// geohash indexing existed.
    #[serde(default)]
    pub geohash: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
}

impl Tile {
    /// Whether the tile is owned by `player_id`.
    #[inline]
    pub fn is_owned_by(&self, player_id: &str) -> bool {
        self.owner_id == player_id
    }

    /// Reference corner as a `geo::Point` (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}
