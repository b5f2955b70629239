//! Geohash scoping for proximity queries.
//!
//! Tiles are indexed by a 6-character geohash (~1.2 km × 0.6 km cells), so
//! the 3×3 block around a point covers every tile within the load radius
//! using nine equality lookups. Callers then trim the over-approximation at
//! the block edges with [`distance_meters`].
//!
//! ```
//! use geoclaim::compute::geo_index::{geohash, neighborhood};
//!
//! let cells = neighborhood(40.7128, -74.0060)?;
//! assert_eq!(cells[0], geohash(40.7128, -74.0060)?);
//! assert_eq!(cells.len(), 9);
//! # Ok::<(), geoclaim::ClaimError>(())
//! ```

use crate::compute::validation::validate_coordinate;
use crate::error::Result;
use geo::{Distance, Haversine, Point};
use geoclaim_types::{PositionSample, Tile};
use smallvec::SmallVec;

/// Geohash length used for tile records and neighborhood queries.
pub const GEOHASH_PRECISION: usize = 6;

/// Largest radius a 3×3 neighborhood is guaranteed to cover.
///
/// A precision-6 cell is ~610 m tall and ~1220 m × cos(lat) wide; the
/// bound holds up to roughly ±70° latitude.
pub const MAX_COVERED_RADIUS_M: f64 = 400.0;

const NEIGHBOR_DIRECTIONS: [geohash::Direction; 8] = [
    geohash::Direction::N,
    geohash::Direction::NE,
    geohash::Direction::E,
    geohash::Direction::SE,
    geohash::Direction::S,
    geohash::Direction::SW,
    geohash::Direction::W,
    geohash::Direction::NW,
];

/// Anything with a (lat, lng) position.
pub trait Located {
    fn location(&self) -> (f64, f64);
}

impl Located for Tile {
    fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

impl Located for PositionSample {
    fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

impl<T: Located> Located for &T {
    fn location(&self) -> (f64, f64) {
        (*self).location()
    }
}

/// Geohash of a coordinate at [`GEOHASH_PRECISION`].
pub fn geohash(lat: f64, lng: f64) -> Result<String> {
    validate_coordinate(lat, lng)?;
    Ok(geohash::encode(
        geohash::Coord { x: lng, y: lat },
        GEOHASH_PRECISION,
    )?)
}

/// The cell containing (lat, lng) followed by its eight neighbors.
///
/// Neighbors that fall off the map (past a pole or the antimeridian) are
/// omitted, so fewer than nine codes can be returned at the extremes.
pub fn neighborhood(lat: f64, lng: f64) -> Result<SmallVec<[String; 9]>> {
    let center = geohash(lat, lng)?;
    let mut cells: SmallVec<[String; 9]> = SmallVec::new();

    for direction in NEIGHBOR_DIRECTIONS {
        if let Ok(neighbor) = geohash::neighbor(&center, direction)
            && neighbor != center
            && !cells.contains(&neighbor)
        {
            cells.push(neighbor);
        }
    }

    cells.insert(0, center);
    Ok(cells)
}

/// Center of a geohash cell as (lat, lng).
pub fn decode_geohash(code: &str) -> Result<(f64, f64)> {
    let (coord, _, _) = geohash::decode(code)?;
    Ok((coord.y, coord.x))
}

/// Great-circle distance in meters.
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    Haversine.distance(Point::new(lng1, lat1), Point::new(lng2, lat2))
}

/// Keep the items within `radius_m` of (lat, lng).
pub fn filter_within_radius<T, I>(items: I, lat: f64, lng: f64, radius_m: f64) -> Vec<T>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .filter(|item| {
            let (ilat, ilng) = item.location();
            distance_meters(lat, lng, ilat, ilng) <= radius_m
        })
        .collect()
}
