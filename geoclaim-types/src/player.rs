use serde::{Deserialize, Serialize};

/// A player as seen by the engine. Owned by the identity/economy layer;
/// the engine reads it to stamp tiles and territories and never mutates
/// `coins`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub display_name: String,
    pub color: String,
    pub coins: u64,
}

impl Player {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            color: color.into(),
            coins: 0,
        }
    }

    pub fn with_coins(mut self, coins: u64) -> Self {
        self.coins = coins;
        self
    }
}
