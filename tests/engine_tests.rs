use geoclaim::prelude::*;
use geoclaim::{Cell, ClaimOutcome};
use std::sync::mpsc::{Receiver, channel};

const NOW: u64 = 1_700_000_000_000;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine() -> (Engine<MemoryStore>, Receiver<GameEvent>) {
    init();
    let (tx, rx) = channel();
    let engine = EngineBuilder::new().sink(tx).build().unwrap();
    (engine, rx)
}

fn alice() -> Player {
    Player::new("alice", "Alice", "#e91e63").with_coins(100)
}

fn bob() -> Player {
    Player::new("bob", "Bob", "#2196f3").with_coins(100)
}

fn center() -> Cell {
    Cell::from_coords(40.0, -74.0).unwrap()
}

fn claim_all(engine: &Engine<MemoryStore>, player: &Player, cells: &[Cell]) -> Vec<ClaimOutcome> {
    let session = engine.new_session();
    cells
        .iter()
        .map(|c| engine.claim(&c.key(), player, &session, NOW).unwrap())
        .collect()
}

#[test]
fn test_claim_charges_once() {
    let (engine, rx) = engine();
    let player = alice();
    let session = engine.new_session();
    let key = center().key();

    let first = engine.claim(&key, &player, &session, NOW).unwrap();
    assert_eq!(first.charged, 1);
    assert_eq!(first.tile.owner_id, "alice");
    assert_eq!(first.tile.geohash.len(), 6);
    assert_eq!(grid_key(first.tile.lat, first.tile.lng).unwrap(), key);

    let again = engine.claim(&key, &player, &session, NOW + 5).unwrap();
    assert_eq!(again.charged, 0);
    assert_eq!(again.tile, first.tile);

    let events: Vec<GameEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![GameEvent::ClaimCharged {
            player_id: "alice".to_string(),
            tile_key: key.to_string(),
            amount: 1,
        }]
    );
}

#[test]
fn test_claim_normalizes_key() {
    let (engine, _rx) = engine();
    let session = engine.new_session();
    let outcome = engine
        .claim(&GridKey::from("40.00001,-74.0"), &alice(), &session, NOW)
        .unwrap();
    assert_eq!(outcome.tile.key.as_str(), "40.0000,-74.0000");
}

#[test]
fn test_claim_refusals() {
    let (engine, _rx) = engine();
    let session = engine.new_session();
    let key = center().key();
    engine.claim(&key, &alice(), &session, NOW).unwrap();

    assert!(!engine.can_claim(&key, &bob(), &session, NOW));
    assert!(matches!(
        engine.claim(&key, &bob(), &session, NOW),
        Err(ClaimError::OwnedByOther { owner_id, .. }) if owner_id == "alice"
    ));
    assert!(matches!(
        engine.check_claim(&key, &alice(), &session, NOW),
        Err(ClaimError::AlreadyOwned(_))
    ));

    let broke = Player::new("carol", "Carol", "#000000");
    let other = center().neighbor(geoclaim::Direction::East).key();
    assert!(matches!(
        engine.claim(&other, &broke, &session, NOW),
        Err(ClaimError::InsufficientCoins { needed: 1, available: 0 })
    ));

    assert!(matches!(
        engine.claim(&GridKey::from("not a key"), &alice(), &session, NOW),
        Err(ClaimError::MalformedKey(_))
    ));
}

#[test]
fn test_claim_blocked_while_driving() {
    let (engine, rx) = engine();
    let mut session = engine.new_session();
    for i in 0..6u64 {
        let lat = 40.0 + i as f64 * 0.00045;
        session
            .record(PositionSample::new(lat, -74.0, NOW + i * 3_000))
            .unwrap();
    }

    let key = center().key();
    let now = NOW + 15_000;
    assert!(!engine.can_claim(&key, &alice(), &session, now));
    assert!(matches!(
        engine.claim(&key, &alice(), &session, now),
        Err(ClaimError::MovementRestricted)
    ));
    assert!(engine.store().get_tile(&key).unwrap().is_none());
    assert!(rx.try_iter().next().is_none());
}

#[test]
fn test_ring_claim_captures_territory() {
    let (engine, rx) = engine();
    let player = alice();
    let ring = center().surrounding();

    let outcomes = claim_all(&engine, &player, &ring);
    for outcome in &outcomes[..7] {
        assert!(outcome.territories.is_empty());
    }
    let captured = &outcomes[7].territories;
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].enclosed, vec![center().key()]);
    assert_eq!(captured[0].perimeter.len(), 8);
    assert!(captured[0].active);
    assert_eq!(captured[0].owner_name, "Alice");

    let stored = engine.store().territories_by_owner("alice").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, captured[0].id);

    let events: Vec<GameEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 8 + 2);
    assert!(events.contains(&GameEvent::CaptureRewarded {
        player_id: "alice".to_string(),
        territory_id: captured[0].id.clone(),
        amount: 10,
    }));
    assert!(events.contains(&GameEvent::TerritoryCaptured {
        owner_id: "alice".to_string(),
        territory_id: captured[0].id.clone(),
        enclosed_count: 1,
    }));
}

#[test]
fn test_reclaim_does_not_duplicate_territory() {
    let (engine, rx) = engine();
    let player = alice();
    let ring = center().surrounding();
    claim_all(&engine, &player, &ring);
    let _ = rx.try_iter().count();

    let again = claim_all(&engine, &player, &ring);
    assert!(again.iter().all(|o| o.territories.is_empty() && o.charged == 0));
    assert_eq!(engine.store().territories_by_owner("alice").unwrap().len(), 1);
    assert!(rx.try_iter().next().is_none());
}

#[test]
fn test_purchase_breaks_sellers_territory() {
    let (engine, rx) = engine();
    let ring = center().surrounding();
    claim_all(&engine, &alice(), &ring);
    let territory_id = engine.store().territories_by_owner("alice").unwrap()[0].id.clone();
    let _ = rx.try_iter().count();

    let bought = ring[0].key();
    let outcome = engine.purchase(&bought, &bob(), NOW + 1).unwrap();
    assert_eq!(outcome.previous_owner, "alice");
    assert_eq!(outcome.tile.owner_id, "bob");
    assert_eq!(outcome.tile.owner_color, "#2196f3");
    assert_eq!(outcome.invalidated.len(), 1);
    assert!(!outcome.invalidated[0].active);
    assert!(outcome.territories.is_empty());

    let stored = engine.store().get_territory(&territory_id).unwrap().unwrap();
    assert!(!stored.active);

    let events: Vec<GameEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            GameEvent::SaleCredited {
                seller_id: "alice".to_string(),
                buyer_id: "bob".to_string(),
                tile_key: bought.to_string(),
                amount: 20,
            },
            GameEvent::TerritoryInvalidated {
                owner_id: "alice".to_string(),
                territory_id,
            },
        ]
    );
}

#[test]
fn test_purchase_can_complete_buyers_ring() {
    let (engine, _rx) = engine();
    let ring = center().surrounding();
    claim_all(&engine, &bob(), &ring[..7]);
    claim_all(&engine, &alice(), &ring[7..]);

    let outcome = engine.purchase(&ring[7].key(), &bob(), NOW + 1).unwrap();
    assert!(outcome.invalidated.is_empty());
    assert_eq!(outcome.territories.len(), 1);
    assert_eq!(outcome.territories[0].owner_id, "bob");
}

#[test]
fn test_concurrent_purchases_credit_seller_once() {
    let (engine, rx) = engine();
    claim_all(&engine, &alice(), &[center()]);
    let _ = rx.try_iter().count();

    let key = center().key();
    let buyers: Vec<Player> = (0..8)
        .map(|i| Player::new(format!("buyer{i}"), "Buyer", "#009688").with_coins(100))
        .collect();
    let results: Vec<Result<geoclaim::PurchaseOutcome>> = std::thread::scope(|scope| {
        let handles: Vec<_> = buyers
            .iter()
            .map(|buyer| scope.spawn(|| engine.purchase(&key, buyer, NOW + 1)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // A later buyer may legitimately buy from an earlier one, but only one
    // purchase can take the tile from alice.
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let from_alice = winners.iter().filter(|w| w.previous_owner == "alice").count();
    assert_eq!(from_alice, 1);
    for lost in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(lost, Err(ClaimError::PurchaseConflict(_))));
    }

    let credits: Vec<GameEvent> = rx
        .try_iter()
        .filter(|e| matches!(e, GameEvent::SaleCredited { .. }))
        .collect();
    assert_eq!(credits.len(), winners.len());
    let alice_credits = credits
        .iter()
        .filter(|e| matches!(e, GameEvent::SaleCredited { seller_id, .. } if seller_id == "alice"))
        .count();
    assert_eq!(alice_credits, 1);
    let stored = engine.store().get_tile(&key).unwrap().unwrap();
    assert_ne!(stored.owner_id, "alice");
}

#[test]
fn test_purchase_refusals() {
    let (engine, _rx) = engine();
    let key = center().key();
    assert!(matches!(
        engine.purchase(&key, &bob(), NOW),
        Err(ClaimError::TileNotFound(_))
    ));

    claim_all(&engine, &bob(), &[center()]);
    assert!(matches!(
        engine.purchase(&key, &bob(), NOW),
        Err(ClaimError::AlreadyOwned(_))
    ));
}

#[test]
fn test_nearby_tiles_respects_load_radius() {
    let (engine, _rx) = engine();
    let here = center();
    // 0.0010 deg of latitude is ~111 m, 0.0030 is ~334 m.
    let near = Cell::new(here.lat_idx + 10, here.lng_idx);
    let far = Cell::new(here.lat_idx + 30, here.lng_idx);
    claim_all(&engine, &alice(), &[here, near, far]);

    let (lat, lng) = here.corner();
    let found: Vec<GridKey> = engine
        .nearby_tiles(lat, lng)
        .unwrap()
        .into_iter()
        .map(|t| t.key)
        .collect();
    assert_eq!(found, vec![here.key(), near.key()]);

    let region = engine.working_region(lat, lng).unwrap();
    assert!(region.contains_key(&far.key()));
}

#[test]
fn test_nearby_rejects_bad_coordinates() {
    let (engine, _rx) = engine();
    assert!(matches!(
        engine.nearby_tiles(95.0, 0.0),
        Err(ClaimError::InvalidInput(_))
    ));
}

#[test]
fn test_restamp_owner() {
    let (engine, _rx) = engine();
    let ring = center().surrounding();
    claim_all(&engine, &alice(), &ring);

    let renamed = Player::new("alice", "Alice II", "#00bcd4");
    let summary = engine.restamp_owner(&renamed).unwrap();
    assert_eq!(summary.tiles, 8);
    assert_eq!(summary.territories, 1);

    let tile = engine.store().get_tile(&ring[0].key()).unwrap().unwrap();
    assert_eq!(tile.owner_name, "Alice II");
    assert_eq!(tile.owner_color, "#00bcd4");

    let again = engine.restamp_owner(&renamed).unwrap();
    assert_eq!(again, geoclaim::RestampSummary::default());
}

#[test]
fn test_backfill_repairs_legacy_tiles() {
    let (engine, _rx) = engine();
    let here = center();
    claim_all(&engine, &alice(), &[here]);

    let legacy_cell = Cell::new(here.lat_idx + 1, here.lng_idx);
    engine
        .store()
        .put_tile(Tile {
            key: legacy_cell.key(),
            owner_id: "alice".to_string(),
            owner_color: "#e91e63".to_string(),
            owner_name: "Alice".to_string(),
            claimed_at: 1,
            geohash: String::new(),
            lat: 0.0,
            lng: 0.0,
        })
        .unwrap();
    engine
        .store()
        .put_tile(Tile {
            key: GridKey::from("bogus"),
            owner_id: "alice".to_string(),
            owner_color: String::new(),
            owner_name: String::new(),
            claimed_at: 1,
            geohash: String::new(),
            lat: 0.0,
            lng: 0.0,
        })
        .unwrap();
    // Parses, but lies off the globe.
    engine
        .store()
        .put_tile(Tile {
            key: GridKey::from("95.0000,0.0000"),
            owner_id: "alice".to_string(),
            owner_color: String::new(),
            owner_name: String::new(),
            claimed_at: 1,
            geohash: String::new(),
            lat: 0.0,
            lng: 0.0,
        })
        .unwrap();

    let (lat, lng) = here.corner();
    assert_eq!(engine.nearby_tiles(lat, lng).unwrap().len(), 1);

    let report = engine.backfill_geohashes().unwrap();
    assert_eq!(report.scanned, 4);
    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.errors, 2);

    let repaired = engine.store().get_tile(&legacy_cell.key()).unwrap().unwrap();
    assert_eq!(grid_key(repaired.lat, repaired.lng).unwrap(), legacy_cell.key());
    assert_eq!(engine.nearby_tiles(lat, lng).unwrap().len(), 2);

    let rerun = engine.backfill_geohashes().unwrap();
    assert_eq!(rerun.updated, 0);
    assert_eq!(rerun.skipped, 2);
}

#[test]
fn test_revalidate_after_external_transfer() {
    let (engine, rx) = engine();
    let ring = center().surrounding();
    claim_all(&engine, &alice(), &ring);
    let _ = rx.try_iter().count();
    assert!(engine.revalidate_territories("alice").unwrap().is_empty());

    // Ownership changed outside the engine.
    let mut tile = engine.store().get_tile(&ring[3].key()).unwrap().unwrap();
    tile.owner_id = "mallory".to_string();
    engine.store().put_tile(tile).unwrap();

    let stale = engine.revalidate_territories("alice").unwrap();
    assert_eq!(stale.len(), 1);
    assert!(!engine.store().territories_by_owner("alice").unwrap()[0].active);
    assert!(matches!(
        rx.try_iter().next(),
        Some(GameEvent::TerritoryInvalidated { .. })
    ));

    assert!(engine.revalidate_territories("alice").unwrap().is_empty());
}

#[test]
fn test_store_stats_after_play() {
    let (engine, _rx) = engine();
    claim_all(&engine, &alice(), &center().surrounding());
    let stats = engine.store().stats().unwrap();
    assert_eq!(stats.tile_count, 8);
    assert_eq!(stats.territory_count, 1);
    assert_eq!(stats.active_territory_count, 1);
    assert_eq!(stats.owner_count, 1);
}
