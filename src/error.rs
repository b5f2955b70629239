//! Error types for geoclaim.

use thiserror::Error;

/// Errors surfaced by the claim and capture engine.
///
/// Insufficient movement data and flood-fill overflow are not errors: the
/// former is an absent value (`None`) and the latter silently discards the
/// candidate region.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// A grid key did not split into two parseable coordinates. Treat as
    /// data corruption; retrying will not help.
    #[error("Malformed grid key: {0:?}")]
    MalformedKey(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A territory's perimeter no longer matches current ownership.
    #[error("Territory {territory_id} is no longer enclosed by its owner")]
    StaleTerritory { territory_id: String },

    #[error("Tile not found: {0}")]
    TileNotFound(String),

    #[error("Tile {0} is already owned by this player")]
    AlreadyOwned(String),

    #[error("Tile {key} is owned by {owner_id}; purchase it instead")]
    OwnedByOther { key: String, owner_id: String },

    /// The tile changed hands between the ownership check and the transfer.
    #[error("Tile {0} changed owner during purchase")]
    PurchaseConflict(String),

    /// Recent movement indicates non-pedestrian speed.
    #[error("Claiming is paused while moving faster than walking speed")]
    MovementRestricted,

    #[error("Insufficient coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Geohash error: {0}")]
    Geohash(#[from] geohash::GeohashError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid snapshot format")]
    InvalidFormat,
}

#[cfg(feature = "snapshot")]
impl From<bincode::Error> for ClaimError {
    fn from(err: bincode::Error) -> Self {
        ClaimError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ClaimError {
    fn from(err: serde_json::Error) -> Self {
        ClaimError::Serialization(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClaimError>;
