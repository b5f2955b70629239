//! In-memory tile store with geohash and owner indexes.

use super::{StoreStats, TileStore};
use crate::error::Result;
use geoclaim_types::{GridKey, Territory, Tile};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Default)]
struct Inner {
    tiles: FxHashMap<GridKey, Tile>,
    by_geohash: FxHashMap<String, FxHashSet<GridKey>>,
    by_owner: FxHashMap<String, FxHashSet<GridKey>>,
    territories: FxHashMap<String, Territory>,
    territories_by_owner: FxHashMap<String, FxHashSet<String>>,
    write_count: u64,
}

impl Inner {
    fn index_tile(&mut self, tile: &Tile) {
        if !tile.geohash.is_empty() {
            self.by_geohash
                .entry(tile.geohash.clone())
                .or_default()
                .insert(tile.key.clone());
        }
        self.by_owner
            .entry(tile.owner_id.clone())
            .or_default()
            .insert(tile.key.clone());
    }

    fn unindex_tile(&mut self, tile: &Tile) {
        remove_from_bucket(&mut self.by_geohash, &tile.geohash, &tile.key);
        remove_from_bucket(&mut self.by_owner, &tile.owner_id, &tile.key);
    }

    fn insert_tile(&mut self, tile: Tile) -> Option<Tile> {
        let previous = self.tiles.remove(&tile.key);
        if let Some(old) = &previous {
            self.unindex_tile(old);
        }
        self.index_tile(&tile);
        self.tiles.insert(tile.key.clone(), tile);
        self.write_count += 1;
        previous
    }

    fn insert_territory(&mut self, territory: Territory) {
        if let Some(old) = self.territories.get(&territory.id)
            && old.owner_id != territory.owner_id
        {
            let (old_owner, id) = (old.owner_id.clone(), old.id.clone());
            remove_from_bucket(&mut self.territories_by_owner, &old_owner, &id);
        }
        self.territories_by_owner
            .entry(territory.owner_id.clone())
            .or_default()
            .insert(territory.id.clone());
        self.territories.insert(territory.id.clone(), territory);
        self.write_count += 1;
    }

    fn collect_tiles<'a>(&self, keys: impl Iterator<Item = &'a GridKey>) -> Vec<Tile> {
        let mut tiles: Vec<Tile> = keys.filter_map(|k| self.tiles.get(k).cloned()).collect();
        tiles.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        tiles
    }
}

fn remove_from_bucket<K: Eq + std::hash::Hash>(
    index: &mut FxHashMap<String, FxHashSet<K>>,
    bucket: &str,
    member: &K,
) {
    if let Some(set) = index.get_mut(bucket) {
        set.remove(member);
        if set.is_empty() {
            index.remove(bucket);
        }
    }
}

/// Thread-safe in-memory [`TileStore`].
///
/// Tiles without a geohash (legacy records) are stored but not reachable
/// through [`TileStore::tiles_by_geohash`] until backfilled.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing records, e.g. a loaded snapshot.
    pub fn from_records(
        tiles: impl IntoIterator<Item = Tile>,
        territories: impl IntoIterator<Item = Territory>,
    ) -> Self {
        let mut inner = Inner::default();
        for tile in tiles {
            inner.insert_tile(tile);
        }
        for territory in territories {
            inner.insert_territory(territory);
        }
        inner.write_count = 0;
        Self {
            inner: RwLock::new(inner),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().tiles.is_empty()
    }
}

impl TileStore for MemoryStore {
    fn get_tile(&self, key: &GridKey) -> Result<Option<Tile>> {
        Ok(self.inner.read().tiles.get(key).cloned())
    }

    fn put_tile(&self, tile: Tile) -> Result<Option<Tile>> {
        Ok(self.inner.write().insert_tile(tile))
    }

    fn insert_tile_if_vacant(&self, tile: Tile) -> Result<Option<Tile>> {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.tiles.get(&tile.key) {
            return Ok(Some(existing.clone()));
        }
        inner.insert_tile(tile);
        Ok(None)
    }

    fn transfer_tile(&self, tile: Tile, expected_owner: &str) -> Result<Option<Tile>> {
        let mut inner = self.inner.write();
        match inner.tiles.get(&tile.key) {
            Some(current) if current.is_owned_by(expected_owner) => Ok(inner.insert_tile(tile)),
            _ => Ok(None),
        }
    }

    fn tiles_by_geohash(&self, geohash: &str) -> Result<Vec<Tile>> {
        let inner = self.inner.read();
        Ok(match inner.by_geohash.get(geohash) {
            Some(keys) => inner.collect_tiles(keys.iter()),
            None => Vec::new(),
        })
    }

    fn tiles_by_owner(&self, owner_id: &str) -> Result<Vec<Tile>> {
        let inner = self.inner.read();
        Ok(match inner.by_owner.get(owner_id) {
            Some(keys) => inner.collect_tiles(keys.iter()),
            None => Vec::new(),
        })
    }

    fn all_tiles(&self) -> Result<Vec<Tile>> {
        let inner = self.inner.read();
        Ok(inner.collect_tiles(inner.tiles.keys()))
    }

    fn get_territory(&self, id: &str) -> Result<Option<Territory>> {
        Ok(self.inner.read().territories.get(id).cloned())
    }

    fn put_territory(&self, territory: Territory) -> Result<()> {
        self.inner.write().insert_territory(territory);
        Ok(())
    }

    fn territories_by_owner(&self, owner_id: &str) -> Result<Vec<Territory>> {
        let inner = self.inner.read();
        let mut found: Vec<Territory> = inner
            .territories_by_owner
            .get(owner_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.territories.get(id).cloned())
            .collect();
        found.sort_unstable_by(|a, b| a.captured_at.cmp(&b.captured_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    fn all_territories(&self) -> Result<Vec<Territory>> {
        let inner = self.inner.read();
        let mut found: Vec<Territory> = inner.territories.values().cloned().collect();
        found.sort_unstable_by(|a, b| a.captured_at.cmp(&b.captured_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    fn stats(&self) -> Result<StoreStats> {
        let inner = self.inner.read();
        Ok(StoreStats {
            tile_count: inner.tiles.len(),
            territory_count: inner.territories.len(),
            active_territory_count: inner.territories.values().filter(|t| t.active).count(),
            geohash_buckets: inner.by_geohash.len(),
            owner_count: inner.by_owner.len(),
            write_count: inner.write_count,
        })
    }
}
