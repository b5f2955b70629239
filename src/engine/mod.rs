//! Claim, purchase and capture flow over a [`TileStore`].
//!
//! The engine is the only writer. Every mutating call writes the tile
//! first, then runs enclosure detection over a fresh ownership snapshot of
//! the surrounding geohash block, then stores whatever new territories it
//! found. Coin effects are reported through the [`EventSink`] and never
//! applied here.

pub mod events;
pub mod session;

pub use events::{EventSink, GameEvent, NullSink};
pub use session::{PlayerSession, ProximityTracker};

use crate::compute::capture::CaptureDetector;
use crate::compute::geo_index::{filter_within_radius, geohash, neighborhood};
use crate::compute::grid::Cell;
use crate::compute::validation::validate_coordinate;
use crate::config::Config;
use crate::error::{ClaimError, Result};
use crate::store::TileStore;
#[cfg(feature = "snapshot")]
use crate::store::SnapshotFile;
use geoclaim_types::{GridKey, Player, Territory, Tile};
#[cfg(feature = "snapshot")]
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

/// Result of a successful [`Engine::claim`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimOutcome {
    pub tile: Tile,
    /// Coins debited. Zero when the player already owned the tile.
    pub charged: u64,
    /// Territories created by this claim.
    pub territories: Vec<Territory>,
}

/// Result of a successful [`Engine::purchase`].
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOutcome {
    pub tile: Tile,
    pub previous_owner: String,
    /// The seller's territories broken by the transfer, now inactive.
    pub invalidated: Vec<Territory>,
    /// Territories the buyer captured with this tile.
    pub territories: Vec<Territory>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestampSummary {
    pub tiles: usize,
    pub territories: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub updated: usize,
    /// Already consistent.
    pub skipped: usize,
    /// Keys that could not be parsed or lie off the globe.
    pub errors: usize,
}

pub struct Engine<S: TileStore> {
    store: S,
    config: Config,
    detector: CaptureDetector,
    sink: Box<dyn EventSink>,
    #[cfg(feature = "snapshot")]
    snapshot: Option<Mutex<SnapshotFile>>,
}

impl<S: TileStore> Engine<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self::with_sink(store, config, Box::new(NullSink))
    }

    pub fn with_sink(store: S, config: Config, sink: Box<dyn EventSink>) -> Self {
        let detector = CaptureDetector::new(config.capture.fill_cap);
        Self {
            store,
            config,
            detector,
            sink,
            #[cfg(feature = "snapshot")]
            snapshot: None,
        }
    }

    #[cfg(feature = "snapshot")]
    pub(crate) fn attach_snapshot(&mut self, file: SnapshotFile) {
        self.snapshot = Some(Mutex::new(file));
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn detector(&self) -> &CaptureDetector {
        &self.detector
    }

    /// A fresh session using this engine's movement and proximity settings.
    pub fn new_session(&self) -> PlayerSession {
        PlayerSession::from_config(&self.config)
    }

    /// Whether `player` may claim `key` right now.
    pub fn can_claim(&self, key: &GridKey, player: &Player, session: &PlayerSession, now_ms: u64) -> bool {
        self.check_claim(key, player, session, now_ms).is_ok()
    }

    /// Like [`Self::can_claim`], with the reason for a refusal.
    pub fn check_claim(
        &self,
        key: &GridKey,
        player: &Player,
        session: &PlayerSession,
        now_ms: u64,
    ) -> Result<()> {
        let key = Cell::from_key(key.as_str())?.key();
        if session.is_ineligible(now_ms) {
            return Err(ClaimError::MovementRestricted);
        }
        if let Some(tile) = self.store.get_tile(&key)? {
            return Err(ownership_conflict(&tile, player));
        }
        self.ensure_coins(player)
    }

    /// Claim an unowned tile for `player`.
    ///
    /// Re-claiming a tile the player already owns succeeds without a charge
    /// and without duplicating territories.
    pub fn claim(
        &self,
        key: &GridKey,
        player: &Player,
        session: &PlayerSession,
        now_ms: u64,
    ) -> Result<ClaimOutcome> {
        let cell = Cell::from_key(key.as_str())?;
        if session.is_ineligible(now_ms) {
            return Err(ClaimError::MovementRestricted);
        }

        if let Some(existing) = self.store.get_tile(&cell.key())? {
            return self.reclaim(existing, player, now_ms);
        }
        self.ensure_coins(player)?;

        let tile = self.stamp_tile(cell, player, now_ms)?;
        if let Some(existing) = self.store.insert_tile_if_vacant(tile.clone())? {
            // Lost a race for the key.
            return self.reclaim(existing, player, now_ms);
        }

        let amount = self.config.economy.claim_cost;
        self.sink.emit(GameEvent::ClaimCharged {
            player_id: player.id.clone(),
            tile_key: tile.key.to_string(),
            amount,
        });
        log::info!("{} claimed {}", player.id, tile.key);

        let territories = self.capture(player, tile.lat, tile.lng, now_ms)?;
        self.note_write()?;

        Ok(ClaimOutcome {
            tile,
            charged: amount,
            territories,
        })
    }

    fn reclaim(&self, existing: Tile, player: &Player, now_ms: u64) -> Result<ClaimOutcome> {
        if !existing.is_owned_by(&player.id) {
            return Err(ownership_conflict(&existing, player));
        }
        let territories = self.capture(player, existing.lat, existing.lng, now_ms)?;
        if !territories.is_empty() {
            self.note_write()?;
        }
        Ok(ClaimOutcome {
            tile: existing,
            charged: 0,
            territories,
        })
    }

    /// Transfer an owned tile to `buyer`.
    ///
    /// The previous owner is credited, their territories that relied on this
    /// tile are deactivated, and the buyer gets a capture pass.
    pub fn purchase(&self, key: &GridKey, buyer: &Player, now_ms: u64) -> Result<PurchaseOutcome> {
        let cell = Cell::from_key(key.as_str())?;
        let key = cell.key();
        let Some(previous) = self.store.get_tile(&key)? else {
            return Err(ClaimError::TileNotFound(key.into_string()));
        };
        if previous.is_owned_by(&buyer.id) {
            return Err(ClaimError::AlreadyOwned(key.into_string()));
        }

        let tile = self.stamp_tile(cell, buyer, now_ms)?;
        let Some(previous) = self.store.transfer_tile(tile.clone(), &previous.owner_id)? else {
            log::warn!("purchase of {} by {} lost a race", key, buyer.id);
            return Err(ClaimError::PurchaseConflict(key.into_string()));
        };

        self.sink.emit(GameEvent::SaleCredited {
            seller_id: previous.owner_id.clone(),
            buyer_id: buyer.id.clone(),
            tile_key: key.to_string(),
            amount: self.config.economy.sale_credit,
        });
        log::info!("{} bought {} from {}", buyer.id, key, previous.owner_id);

        let mut invalidated = Vec::new();
        for mut territory in self.store.territories_by_owner(&previous.owner_id)? {
            if territory.active && territory.perimeter_contains(&key) {
                territory.active = false;
                self.store.put_territory(territory.clone())?;
                self.sink.emit(GameEvent::TerritoryInvalidated {
                    owner_id: territory.owner_id.clone(),
                    territory_id: territory.id.clone(),
                });
                invalidated.push(territory);
            }
        }
        if !invalidated.is_empty() {
            log::info!(
                "sale of {} broke {} territories of {}",
                key,
                invalidated.len(),
                previous.owner_id
            );
        }

        let territories = self.capture(buyer, tile.lat, tile.lng, now_ms)?;
        self.note_write()?;

        Ok(PurchaseOutcome {
            tile,
            previous_owner: previous.owner_id,
            invalidated,
            territories,
        })
    }

    /// Tiles within the configured load radius of (lat, lng), sorted by key.
    pub fn nearby_tiles(&self, lat: f64, lng: f64) -> Result<Vec<Tile>> {
        let candidates = self.region_tiles(lat, lng)?;
        let scanned = candidates.len();
        let near = filter_within_radius(candidates, lat, lng, self.config.proximity.load_radius_m);
        log::debug!(
            "nearby ({:.5}, {:.5}): {} of {} candidate tiles within {} m",
            lat,
            lng,
            near.len(),
            scanned,
            self.config.proximity.load_radius_m
        );
        Ok(near)
    }

    /// Ownership of every tile in the geohash block around (lat, lng).
    ///
    /// Deliberately wider than the load radius; this is the snapshot the
    /// capture detector runs on.
    pub fn working_region(&self, lat: f64, lng: f64) -> Result<FxHashMap<GridKey, String>> {
        Ok(self
            .region_tiles(lat, lng)?
            .into_iter()
            .map(|t| (t.key, t.owner_id))
            .collect())
    }

    /// Re-check every active territory of `owner_id` against current
    /// ownership, deactivating the broken ones. Returns those.
    pub fn revalidate_territories(&self, owner_id: &str) -> Result<Vec<Territory>> {
        let mut stale = Vec::new();
        for mut territory in self.store.territories_by_owner(owner_id)? {
            if !territory.active {
                continue;
            }

            let mut owners: FxHashMap<GridKey, String> = FxHashMap::default();
            for key in &territory.perimeter {
                if let Some(tile) = self.store.get_tile(key)? {
                    owners.insert(tile.key, tile.owner_id);
                }
            }

            if let Err(e) = self.detector.revalidate(&territory, &owners) {
                log::info!("{}", e);
                territory.active = false;
                self.store.put_territory(territory.clone())?;
                self.sink.emit(GameEvent::TerritoryInvalidated {
                    owner_id: territory.owner_id.clone(),
                    territory_id: territory.id.clone(),
                });
                stale.push(territory);
            }
        }
        if !stale.is_empty() {
            self.note_write()?;
        }
        Ok(stale)
    }

    /// Copy the player's current name and color onto every tile and
    /// territory they own.
    pub fn restamp_owner(&self, player: &Player) -> Result<RestampSummary> {
        let mut summary = RestampSummary::default();

        for mut tile in self.store.tiles_by_owner(&player.id)? {
            if tile.owner_name == player.display_name && tile.owner_color == player.color {
                continue;
            }
            tile.owner_name.clone_from(&player.display_name);
            tile.owner_color.clone_from(&player.color);
            self.store.put_tile(tile)?;
            summary.tiles += 1;
        }

        for mut territory in self.store.territories_by_owner(&player.id)? {
            if territory.owner_name == player.display_name && territory.owner_color == player.color {
                continue;
            }
            territory.owner_name.clone_from(&player.display_name);
            territory.owner_color.clone_from(&player.color);
            self.store.put_territory(territory)?;
            summary.territories += 1;
        }

        log::info!(
            "restamped {}: {} tiles, {} territories",
            player.id,
            summary.tiles,
            summary.territories
        );
        if summary != RestampSummary::default() {
            self.note_write()?;
        }
        Ok(summary)
    }

    /// Recompute `geohash`, `lat` and `lng` for tiles where they are missing
    /// or disagree with the key.
    pub fn backfill_geohashes(&self) -> Result<BackfillReport> {
        let mut report = BackfillReport::default();

        for mut tile in self.store.all_tiles()? {
            report.scanned += 1;

            let located = Cell::from_key(tile.key.as_str()).and_then(|cell| {
                let (lat, lng) = cell.corner();
                Ok((lat, lng, geohash(lat, lng)?))
            });
            let (lat, lng, code) = match located {
                Ok(located) => located,
                Err(e) => {
                    log::warn!("backfill skipped {}: {}", tile.key, e);
                    report.errors += 1;
                    continue;
                }
            };

            if tile.geohash == code && tile.lat == lat && tile.lng == lng {
                report.skipped += 1;
                continue;
            }

            log::warn!(
                "backfill repaired {}: geohash {:?} -> {:?}",
                tile.key,
                tile.geohash,
                code
            );
            tile.geohash = code;
            tile.lat = lat;
            tile.lng = lng;
            self.store.put_tile(tile)?;
            report.updated += 1;
        }

        log::info!(
            "backfill complete: {} scanned, {} updated, {} skipped, {} errors",
            report.scanned,
            report.updated,
            report.skipped,
            report.errors
        );
        if report.updated > 0 {
            self.note_write()?;
        }
        Ok(report)
    }

    /// Write the configured snapshot file now.
    #[cfg(feature = "snapshot")]
    pub fn save_snapshot(&self) -> Result<()> {
        match &self.snapshot {
            Some(file) => file.lock().save_store(&self.store),
            None => Ok(()),
        }
    }

    fn ensure_coins(&self, player: &Player) -> Result<()> {
        let needed = self.config.economy.claim_cost;
        if player.coins < needed {
            return Err(ClaimError::InsufficientCoins {
                needed,
                available: player.coins,
            });
        }
        Ok(())
    }

    fn stamp_tile(&self, cell: Cell, owner: &Player, now_ms: u64) -> Result<Tile> {
        let (lat, lng) = cell.corner();
        Ok(Tile {
            key: cell.key(),
            owner_id: owner.id.clone(),
            owner_color: owner.color.clone(),
            owner_name: owner.display_name.clone(),
            claimed_at: now_ms,
            geohash: geohash(lat, lng)?,
            lat,
            lng,
        })
    }

    fn region_tiles(&self, lat: f64, lng: f64) -> Result<Vec<Tile>> {
        validate_coordinate(lat, lng)?;
        let mut seen: FxHashSet<GridKey> = FxHashSet::default();
        let mut tiles = Vec::new();
        for code in neighborhood(lat, lng)? {
            for tile in self.store.tiles_by_geohash(&code)? {
                if seen.insert(tile.key.clone()) {
                    tiles.push(tile);
                }
            }
        }
        tiles.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        Ok(tiles)
    }

    /// Run detection for `player` around (lat, lng) and store the results.
    fn capture(&self, player: &Player, lat: f64, lng: f64, now_ms: u64) -> Result<Vec<Territory>> {
        let owners = self.working_region(lat, lng)?;
        let known = self.store.territories_by_owner(&player.id)?;
        let enclosures = self.detector.find_new_enclosures(&owners, &player.id, &known);

        let mut captured = Vec::with_capacity(enclosures.len());
        for enclosure in enclosures {
            let territory = Territory {
                id: uuid::Uuid::new_v4().to_string(),
                owner_id: player.id.clone(),
                owner_name: player.display_name.clone(),
                owner_color: player.color.clone(),
                perimeter: enclosure.perimeter,
                enclosed: enclosure.enclosed,
                captured_at: now_ms,
                active: true,
            };
            self.store.put_territory(territory.clone())?;

            self.sink.emit(GameEvent::TerritoryCaptured {
                owner_id: player.id.clone(),
                territory_id: territory.id.clone(),
                enclosed_count: territory.enclosed.len(),
            });
            self.sink.emit(GameEvent::CaptureRewarded {
                player_id: player.id.clone(),
                territory_id: territory.id.clone(),
                amount: self.config.economy.capture_reward,
            });
            log::info!(
                "{} captured territory {} ({} tiles enclosed)",
                player.id,
                territory.id,
                territory.enclosed.len()
            );
            captured.push(territory);
        }
        Ok(captured)
    }

    #[cfg(feature = "snapshot")]
    fn note_write(&self) -> Result<()> {
        if let Some(file) = &self.snapshot {
            let mut file = file.lock();
            file.record_operation();
            if file.should_snapshot() {
                file.save_store(&self.store)?;
            }
        }
        Ok(())
    }

    #[cfg(not(feature = "snapshot"))]
    fn note_write(&self) -> Result<()> {
        Ok(())
    }
}

fn ownership_conflict(tile: &Tile, player: &Player) -> ClaimError {
    if tile.is_owned_by(&player.id) {
        ClaimError::AlreadyOwned(tile.key.to_string())
    } else {
        ClaimError::OwnedByOther {
            key: tile.key.to_string(),
            owner_id: tile.owner_id.clone(),
        }
    }
}
