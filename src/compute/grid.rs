//! Fixed-resolution lattice addressing.
//!
//! Coordinates are floored to a lattice of 10^-4 degree cells (~11 m at the
//! equator). Internally a cell is a pair of integer indices, and keys are
//! formatted from those integers, so neighbor stepping and re-formatting
//! never accumulate floating-point drift.
//!
//! ```
//! use geoclaim::compute::grid::{grid_key, orthogonal_neighbors, parse_key};
//!
//! let key = grid_key(40.71284, -74.00601)?;
//! assert_eq!(key.as_str(), "40.7128,-74.0061");
//!
//! let (lat, lng) = parse_key(key.as_str())?;
//! assert_eq!(grid_key(lat, lng)?, key);
//!
//! let [north, ..] = orthogonal_neighbors(&key)?;
//! assert_eq!(north.as_str(), "40.7129,-74.0061");
//! # Ok::<(), geoclaim::ClaimError>(())
//! ```

use crate::compute::validation::validate_coordinate;
use crate::error::{ClaimError, Result};
use geoclaim_types::GridKey;

/// Fractional digits kept in a grid key.
pub const GRID_DIGITS: usize = 4;

/// Lattice cells per degree on each axis.
pub const CELLS_PER_DEGREE: i64 = 10_000;

/// Size of one cell in degrees.
pub const CELL_STEP: f64 = 1.0 / CELLS_PER_DEGREE as f64;

/// Scaled values this close to a lattice line (in cell units) snap onto it.
/// Absorbs the representation error of decimal corners such as 40.7128.
const SNAP_EPSILON: f64 = 1e-7;

/// Orthogonal step direction on the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// In the order returned by [`orthogonal_neighbors`].
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// (lat, lng) index delta.
    #[inline]
    fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (1, 0),
            Direction::South => (-1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }
}

/// A lattice cell addressed by integer indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub lat_idx: i64,
    pub lng_idx: i64,
}

impl Cell {
    #[inline]
    pub const fn new(lat_idx: i64, lng_idx: i64) -> Self {
        Self { lat_idx, lng_idx }
    }

    /// The cell containing a coordinate.
    pub fn from_coords(lat: f64, lng: f64) -> Result<Self> {
        validate_coordinate(lat, lng)?;
        Ok(Self::new(quantize(lat), quantize(lng)))
    }

    /// The cell addressed by a key.
    ///
    /// Keys whose corner lies outside the valid coordinate range are
    /// rejected as malformed.
    pub fn from_key(key: &str) -> Result<Self> {
        let (lat, lng) = parse_key(key)?;
        validate_coordinate(lat, lng).map_err(|_| ClaimError::MalformedKey(key.to_string()))?;
        Ok(Self::new(quantize(lat), quantize(lng)))
    }

    /// Canonical key of this cell.
    pub fn key(&self) -> GridKey {
        GridKey::new(format!(
            "{},{}",
            format_index(self.lat_idx),
            format_index(self.lng_idx)
        ))
    }

    /// Reference (minimum) corner as (lat, lng).
    pub fn corner(&self) -> (f64, f64) {
        (
            self.lat_idx as f64 / CELLS_PER_DEGREE as f64,
            self.lng_idx as f64 / CELLS_PER_DEGREE as f64,
        )
    }

    /// Corners in winding order: (lat, lng), (lat+s, lng), (lat+s, lng+s), (lat, lng+s).
    pub fn bounds(&self) -> [(f64, f64); 4] {
        let scale = CELLS_PER_DEGREE as f64;
        let lat0 = self.lat_idx as f64 / scale;
        let lng0 = self.lng_idx as f64 / scale;
        let lat1 = (self.lat_idx + 1) as f64 / scale;
        let lng1 = (self.lng_idx + 1) as f64 / scale;
        [(lat0, lng0), (lat1, lng0), (lat1, lng1), (lat0, lng1)]
    }

    #[inline]
    pub fn neighbor(&self, direction: Direction) -> Cell {
        let (dlat, dlng) = direction.offset();
        Cell::new(self.lat_idx + dlat, self.lng_idx + dlng)
    }

    /// North, south, east, west.
    #[inline]
    pub fn orthogonal_neighbors(&self) -> [Cell; 4] {
        Direction::ALL.map(|d| self.neighbor(d))
    }

    /// All eight cells sharing an edge or a corner with this one.
    pub fn surrounding(&self) -> [Cell; 8] {
        let (la, ln) = (self.lat_idx, self.lng_idx);
        [
            Cell::new(la + 1, ln - 1),
            Cell::new(la + 1, ln),
            Cell::new(la + 1, ln + 1),
            Cell::new(la, ln - 1),
            Cell::new(la, ln + 1),
            Cell::new(la - 1, ln - 1),
            Cell::new(la - 1, ln),
            Cell::new(la - 1, ln + 1),
        ]
    }
}

/// Floor a coordinate to its lattice index.
fn quantize(value: f64) -> i64 {
    let scaled = value * CELLS_PER_DEGREE as f64;
    let nearest = scaled.round();
    if (scaled - nearest).abs() < SNAP_EPSILON {
        nearest as i64
    } else {
        scaled.floor() as i64
    }
}

fn format_index(idx: i64) -> String {
    let sign = if idx < 0 { "-" } else { "" };
    let abs = idx.unsigned_abs();
    let per_degree = CELLS_PER_DEGREE as u64;
    format!(
        "{sign}{}.{:0width$}",
        abs / per_degree,
        abs % per_degree,
        width = GRID_DIGITS
    )
}

/// Canonical key of the cell containing (lat, lng).
pub fn grid_key(lat: f64, lng: f64) -> Result<GridKey> {
    Ok(Cell::from_coords(lat, lng)?.key())
}

/// Split a key into its (lat, lng) reference corner.
pub fn parse_key(key: &str) -> Result<(f64, f64)> {
    let mut parts = key.split(',');
    let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ClaimError::MalformedKey(key.to_string()));
    };

    let parse = |raw: &str| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ClaimError::MalformedKey(key.to_string()))
    };

    Ok((parse(lat)?, parse(lng)?))
}

/// Four corners of a tile in winding order.
pub fn bounds(key: &GridKey) -> Result<[(f64, f64); 4]> {
    Ok(Cell::from_key(key.as_str())?.bounds())
}

/// North, south, east and west neighbor keys.
pub fn orthogonal_neighbors(key: &GridKey) -> Result<[GridKey; 4]> {
    Ok(Cell::from_key(key.as_str())?
        .orthogonal_neighbors()
        .map(|cell| cell.key()))
}
