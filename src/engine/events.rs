//! Signals the engine emits to the economy and territory layers.
//!
//! The engine never touches coin balances. It reports what happened and the
//! consumer applies the effects.

use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// Debit for a first claim.
    ClaimCharged {
        player_id: String,
        tile_key: String,
        amount: u64,
    },
    /// Credit to the previous owner of a purchased tile.
    SaleCredited {
        seller_id: String,
        buyer_id: String,
        tile_key: String,
        amount: u64,
    },
    CaptureRewarded {
        player_id: String,
        territory_id: String,
        amount: u64,
    },
    TerritoryCaptured {
        owner_id: String,
        territory_id: String,
        enclosed_count: usize,
    },
    /// A territory whose perimeter was broken by a transfer.
    TerritoryInvalidated {
        owner_id: String,
        territory_id: String,
    },
}

/// Receiver of [`GameEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: GameEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: GameEvent) {}
}

impl<F> EventSink for F
where
    F: Fn(GameEvent) + Send + Sync,
{
    fn emit(&self, event: GameEvent) {
        self(event)
    }
}

impl EventSink for Sender<GameEvent> {
    fn emit(&self, event: GameEvent) {
        if self.send(event).is_err() {
            log::warn!("event receiver dropped; discarding game event");
        }
    }
}
