//! Pure spatial computation.
//!
//! Nothing in this module holds state or touches storage:
//! - [`grid`] maps coordinates to tile keys and steps between neighbors
//! - [`geo_index`] scopes proximity queries with geohash blocks
//! - [`movement`] decides whether a player is moving at walking pace
//! - [`capture`] finds regions enclosed by a player's tiles
//!
//! The engine feeds these from store snapshots.

pub mod capture;
pub mod geo_index;
#[cfg(feature = "geojson")]
pub mod geojson;
pub mod grid;
pub mod movement;
pub mod validation;
