//! Tile and territory storage.
//!
//! [`TileStore`] is the seam to whatever persistent store hosts the shared
//! game state. Stores are shared across request handlers, so every method
//! takes `&self` and implementations synchronize internally.

use crate::error::Result;
use geoclaim_types::{GridKey, Territory, Tile};

mod memory;
#[cfg(feature = "snapshot")]
pub mod snapshot;

pub use memory::MemoryStore;
#[cfg(feature = "snapshot")]
pub use snapshot::{SnapshotConfig, SnapshotFile};

/// Keyed tile records plus per-owner territory records.
pub trait TileStore: Send + Sync {
    fn get_tile(&self, key: &GridKey) -> Result<Option<Tile>>;

    /// Insert or replace a tile, returning the previous record.
    fn put_tile(&self, tile: Tile) -> Result<Option<Tile>>;

    /// Insert a tile only if its key is unclaimed.
    ///
    /// Returns `None` when the tile was written, or the existing record when
    /// the key was already taken. Two concurrent first claims on one key must
    /// not both succeed.
    fn insert_tile_if_vacant(&self, tile: Tile) -> Result<Option<Tile>>;

    /// Replace a tile only if it is currently held by `expected_owner`.
    ///
    /// Returns the replaced record on success, or `None` when the key is
    /// vacant or held by someone else. Two concurrent transfers from the
    /// same owner must not both succeed.
    fn transfer_tile(&self, tile: Tile, expected_owner: &str) -> Result<Option<Tile>>;

    /// Tiles whose stored geohash equals `geohash`.
    fn tiles_by_geohash(&self, geohash: &str) -> Result<Vec<Tile>>;

    fn tiles_by_owner(&self, owner_id: &str) -> Result<Vec<Tile>>;

    fn all_tiles(&self) -> Result<Vec<Tile>>;

    fn get_territory(&self, id: &str) -> Result<Option<Territory>>;

    /// Insert or replace a territory by id.
    fn put_territory(&self, territory: Territory) -> Result<()>;

    /// All territories of an owner, active or not.
    fn territories_by_owner(&self, owner_id: &str) -> Result<Vec<Territory>>;

    fn all_territories(&self) -> Result<Vec<Territory>>;

    fn stats(&self) -> Result<StoreStats>;
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub tile_count: usize,
    pub territory_count: usize,
    pub active_territory_count: usize,
    /// Distinct geohash cells holding at least one tile.
    pub geohash_buckets: usize,
    /// Distinct tile owners.
    pub owner_count: usize,
    /// Writes performed since the store was opened.
    pub write_count: u64,
}
