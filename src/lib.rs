//! Spatial claim and capture engine for a location-based territory game.
//!
//! Players walk to fixed-size map tiles and claim them. When a player's tiles
//! wall off a region, the region becomes their territory.
//!
//! ```rust
//! use geoclaim::prelude::*;
//!
//! let engine = EngineBuilder::new().build()?;
//! let player = Player::new("p1", "Ada", "#3366ff").with_coins(10);
//! let session = engine.new_session();
//!
//! let key = grid_key(40.7128, -74.0060)?;
//! let outcome = engine.claim(&key, &player, &session, 1_700_000_000_000)?;
//! assert_eq!(outcome.charged, 1);
//!
//! let nearby = engine.nearby_tiles(40.7128, -74.0060)?;
//! assert_eq!(nearby.len(), 1);
//! # Ok::<(), geoclaim::ClaimError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;

pub use builder::EngineBuilder;
pub use config::Config;
pub use engine::{
    BackfillReport, ClaimOutcome, Engine, EventSink, GameEvent, NullSink, PlayerSession,
    ProximityTracker, PurchaseOutcome, RestampSummary,
};
pub use error::{ClaimError, Result};

pub use compute::capture::{CaptureDetector, Enclosure};
pub use compute::geo_index::{distance_meters, geohash, neighborhood};
pub use compute::grid::{Cell, Direction, bounds, grid_key, orthogonal_neighbors, parse_key};
pub use compute::movement::MovementValidator;

pub use store::{MemoryStore, StoreStats, TileStore};
#[cfg(feature = "snapshot")]
pub use store::{SnapshotConfig, SnapshotFile, snapshot::StoreSnapshot};

pub use geoclaim_types::{GridKey, Player, PositionSample, Territory, Tile};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{ClaimError, EngineBuilder, Result};

    pub use crate::{Engine, GameEvent, PlayerSession};

    pub use crate::{grid_key, orthogonal_neighbors, parse_key};

    pub use crate::{MemoryStore, TileStore};

    pub use crate::Config;

    pub use geoclaim_types::{GridKey, Player, PositionSample, Territory, Tile};
}
