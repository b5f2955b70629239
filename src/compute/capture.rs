//! Enclosure detection over an ownership snapshot.
//!
//! After a claim the detector flood-fills outward from every open neighbor of
//! the player's tiles. A fill that stays within the cap without escaping is an
//! enclosed region; the player tiles hugging it form its perimeter.
//!
//! Cells absent from the snapshot are treated as open ground, so a snapshot
//! that is scoped too narrowly can only make fills larger. That turns a real
//! enclosure into a missed capture but never turns open space into one.

use crate::compute::grid::Cell;
use crate::error::{ClaimError, Result};
use geoclaim_types::{GridKey, Territory, territory::perimeter_signature};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{HashMap, VecDeque};
use std::hash::BuildHasher;

/// Default upper bound on the size of an enclosed region, in cells.
pub const DEFAULT_FILL_CAP: usize = 100;

/// An enclosed region and the wall of player tiles around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    /// Sorted.
    pub perimeter: Vec<GridKey>,
    /// Sorted.
    pub enclosed: Vec<GridKey>,
}

impl Enclosure {
    pub fn signature(&self) -> String {
        perimeter_signature(&self.perimeter)
    }
}

enum FillOutcome {
    Enclosed(FxHashSet<Cell>),
    Overflow(FxHashSet<Cell>),
}

/// Flood-fill enclosure detector.
#[derive(Debug, Clone, Copy)]
pub struct CaptureDetector {
    fill_cap: usize,
}

impl Default for CaptureDetector {
    fn default() -> Self {
        Self::new(DEFAULT_FILL_CAP)
    }
}

impl CaptureDetector {
    pub fn new(fill_cap: usize) -> Self {
        Self {
            fill_cap: fill_cap.max(1),
        }
    }

    pub fn fill_cap(&self) -> usize {
        self.fill_cap
    }

    /// All regions currently enclosed by `player_id`'s tiles.
    ///
    /// Output order is deterministic: enclosures appear in the order their
    /// first adjacent player tile sorts.
    pub fn find_enclosures<H: BuildHasher>(
        &self,
        owners: &HashMap<GridKey, String, H>,
        player_id: &str,
    ) -> Vec<Enclosure> {
        let walls = player_cells(owners, player_id);
        if walls.len() < 4 {
            // Enclosing even one cell takes four tiles.
            return Vec::new();
        }

        let mut ordered: Vec<Cell> = walls.keys().copied().collect();
        ordered.sort_unstable();

        let mut explored: FxHashSet<Cell> = FxHashSet::default();
        let mut seen_signatures: FxHashSet<String> = FxHashSet::default();
        let mut found = Vec::new();
        let mut fills = 0usize;

        for wall in &ordered {
            for start in wall.orthogonal_neighbors() {
                if walls.contains_key(&start) || explored.contains(&start) {
                    continue;
                }

                fills += 1;
                let region = match self.fill(start, &walls) {
                    FillOutcome::Overflow(partial) => {
                        explored.extend(partial);
                        continue;
                    }
                    FillOutcome::Enclosed(region) => region,
                };
                explored.extend(region.iter().copied());

                let perimeter = perimeter_of(&region, &walls);
                if !is_orthogonally_connected(&perimeter) {
                    log::debug!(
                        "rejecting {}-cell pocket: perimeter of {} tiles is not connected",
                        region.len(),
                        perimeter.len()
                    );
                    continue;
                }

                let enclosure = Enclosure {
                    perimeter: sorted_keys(perimeter.iter().map(|c| walls[c].clone())),
                    enclosed: sorted_keys(region.iter().map(Cell::key)),
                };
                if seen_signatures.insert(enclosure.signature()) {
                    found.push(enclosure);
                }
            }
        }

        log::debug!(
            "capture scan for {}: {} tiles, {} fills, {} enclosures",
            player_id,
            walls.len(),
            fills,
            found.len()
        );

        found
    }

    /// [`Self::find_enclosures`] minus those already held as active territories.
    pub fn find_new_enclosures<H: BuildHasher>(
        &self,
        owners: &HashMap<GridKey, String, H>,
        player_id: &str,
        known: &[Territory],
    ) -> Vec<Enclosure> {
        let held: FxHashSet<String> = known
            .iter()
            .filter(|t| t.active && t.owner_id == player_id)
            .map(Territory::perimeter_signature)
            .collect();

        self.find_enclosures(owners, player_id)
            .into_iter()
            .filter(|e| !held.contains(&e.signature()))
            .collect()
    }

    /// Whether every perimeter tile is still owned by the territory's owner.
    pub fn is_territory_valid<H: BuildHasher>(
        &self,
        territory: &Territory,
        owners: &HashMap<GridKey, String, H>,
    ) -> bool {
        territory
            .perimeter
            .iter()
            .all(|key| owners.get(key).is_some_and(|o| *o == territory.owner_id))
    }

    pub fn revalidate<H: BuildHasher>(
        &self,
        territory: &Territory,
        owners: &HashMap<GridKey, String, H>,
    ) -> Result<()> {
        if self.is_territory_valid(territory, owners) {
            Ok(())
        } else {
            Err(ClaimError::StaleTerritory {
                territory_id: territory.id.clone(),
            })
        }
    }

    fn fill(&self, start: Cell, walls: &FxHashMap<Cell, GridKey>) -> FillOutcome {
        let mut filled: FxHashSet<Cell> = FxHashSet::default();
        let mut queue = VecDeque::new();
        filled.insert(start);
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            for next in cell.orthogonal_neighbors() {
                if walls.contains_key(&next) || !filled.insert(next) {
                    continue;
                }
                if filled.len() > self.fill_cap {
                    return FillOutcome::Overflow(filled);
                }
                queue.push_back(next);
            }
        }

        FillOutcome::Enclosed(filled)
    }
}

/// The player's tiles as lattice cells, mapped back to their stored keys.
fn player_cells<H: BuildHasher>(
    owners: &HashMap<GridKey, String, H>,
    player_id: &str,
) -> FxHashMap<Cell, GridKey> {
    let mut cells = FxHashMap::default();
    for (key, owner) in owners {
        if owner != player_id {
            continue;
        }
        match Cell::from_key(key.as_str()) {
            Ok(cell) => {
                cells.insert(cell, key.clone());
            }
            Err(e) => log::warn!("skipping tile {}: {}", key, e),
        }
    }
    cells
}

fn perimeter_of(region: &FxHashSet<Cell>, walls: &FxHashMap<Cell, GridKey>) -> FxHashSet<Cell> {
    region
        .iter()
        .flat_map(|cell| cell.surrounding())
        .filter(|cell| walls.contains_key(cell))
        .collect()
}

fn is_orthogonally_connected(cells: &FxHashSet<Cell>) -> bool {
    let Some(&first) = cells.iter().next() else {
        return false;
    };

    let mut reached: FxHashSet<Cell> = FxHashSet::default();
    let mut queue = VecDeque::from([first]);
    reached.insert(first);

    while let Some(cell) = queue.pop_front() {
        for next in cell.orthogonal_neighbors() {
            if cells.contains(&next) && reached.insert(next) {
                queue.push_back(next);
            }
        }
    }

    reached.len() == cells.len()
}

fn sorted_keys(keys: impl Iterator<Item = GridKey>) -> Vec<GridKey> {
    let mut keys: Vec<GridKey> = keys.collect();
    keys.sort_unstable();
    keys
}
