//! # geoclaim-types
//!
//! Data model types for the geoclaim territory engine.
//!
//! - **Tiles**: `GridKey`, `Tile`
//! - **Territories**: `Territory`
//! - **Movement**: `PositionSample`
//! - **Players**: `Player`
//!
//! All types are serializable with Serde. Coordinates are plain `f64`
//! latitude/longitude pairs; conversions to `geo::Point` use x = longitude,
//! y = latitude.
//!
//! ## Examples
//!
//! ```rust
//! use geoclaim_types::sample::PositionSample;
//! use geoclaim_types::tile::GridKey;
//!
//! let sample = PositionSample::new(40.7128, -74.0060, 1_700_000_000_000);
//! assert_eq!(sample.point().y(), 40.7128);
//!
//! let key = GridKey::from("40.7128,-74.0060");
//! assert_eq!(key.as_str(), "40.7128,-74.0060");
//! ```

pub mod player;
pub mod sample;
pub mod territory;
pub mod tile;

pub use player::Player;
pub use sample::PositionSample;
pub use territory::Territory;
pub use tile::{GridKey, Tile};
