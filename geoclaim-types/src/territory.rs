use crate::tile::GridKey;
use serde::{Deserialize, Serialize};

/// A captured region: a connected owned perimeter and its enclosed interior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub id: String,
    pub owner_id: String,
    /// Owner's display name at capture time.
    pub owner_name: String,
    /// Owner's display color at capture time.
    pub owner_color: String,
    /// Owned boundary tiles, sorted.
    pub perimeter: Vec<GridKey>,
    /// Captured interior tiles, sorted. May include unowned or foreign tiles.
    pub enclosed: Vec<GridKey>,
    /// Unix milliseconds.
    pub captured_at: u64,
    /// Advisory flag for consumers deciding retention.
    pub active: bool,
}

impl Territory {
    /// Canonical signature of the perimeter: sorted keys joined by `|`.
    pub fn perimeter_signature(&self) -> String {
        perimeter_signature(&self.perimeter)
    }

    pub fn perimeter_contains(&self, key: &GridKey) -> bool {
        self.perimeter.iter().any(|k| k == key)
    }
}

/// Signature of an arbitrary perimeter; order of `keys` does not matter.
pub fn perimeter_signature(keys: &[GridKey]) -> String {
    let mut sorted: Vec<&str> = keys.iter().map(GridKey::as_str).collect();
    sorted.sort_unstable();
    sorted.join("|")
}
