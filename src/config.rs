//! Engine configuration.
//!
//! Grid precision and geohash precision are part of the stored key and
//! record formats, so they are fixed constants in [`crate::compute::grid`]
//! and [`crate::compute::geo_index`]. Everything else is tunable here;
//! defaults match the game's published rules.

use crate::compute::validation::validate_radius;
use serde::de::Error;

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub proximity: ProximityConfig,

    #[serde(default)]
    pub movement: MovementConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub economy: EconomyConfig,
}

/// Scoping of "what is near me" queries.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProximityConfig {
    /// Tiles farther than this from the player are not loaded.
    #[serde(default = "ProximityConfig::default_load_radius_m")]
    pub load_radius_m: f64,

    /// Movement that triggers a fresh proximity query.
    #[serde(default = "ProximityConfig::default_requery_threshold_m")]
    pub requery_threshold_m: f64,
}

impl ProximityConfig {
    const fn default_load_radius_m() -> f64 {
        200.0
    }

    const fn default_requery_threshold_m() -> f64 {
        50.0
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            load_radius_m: Self::default_load_radius_m(),
            requery_threshold_m: Self::default_requery_threshold_m(),
        }
    }
}

/// Thresholds for the walking-speed claim gate.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovementConfig {
    #[serde(default = "MovementConfig::default_speed_threshold_kmh")]
    pub speed_threshold_kmh: f64,

    #[serde(default = "MovementConfig::default_window_ms")]
    pub window_ms: u64,

    /// Samples arriving sooner than this after the previous one are dropped.
    #[serde(default = "MovementConfig::default_min_sample_interval_ms")]
    pub min_sample_interval_ms: u64,

    /// Pairs closer in time than this give no speed reading.
    #[serde(default = "MovementConfig::default_min_speed_interval_ms")]
    pub min_speed_interval_ms: u64,

    /// Pairs closer in space than this are GPS noise.
    #[serde(default = "MovementConfig::default_min_speed_distance_m")]
    pub min_speed_distance_m: f64,

    #[serde(default = "MovementConfig::default_min_samples")]
    pub min_samples: usize,

    #[serde(default = "MovementConfig::default_min_speed_readings")]
    pub min_speed_readings: usize,

    /// Fraction of readings above threshold that marks a player ineligible.
    #[serde(default = "MovementConfig::default_ineligible_fraction")]
    pub ineligible_fraction: f64,

    /// History is kept for `window_ms * retention_factor`.
    #[serde(default = "MovementConfig::default_retention_factor")]
    pub retention_factor: f64,
}

impl MovementConfig {
    const fn default_speed_threshold_kmh() -> f64 {
        5.0
    }

    const fn default_window_ms() -> u64 {
        25_000
    }

    const fn default_min_sample_interval_ms() -> u64 {
        2_000
    }

    const fn default_min_speed_interval_ms() -> u64 {
        1_000
    }

    const fn default_min_speed_distance_m() -> f64 {
        3.0
    }

    const fn default_min_samples() -> usize {
        5
    }

    const fn default_min_speed_readings() -> usize {
        3
    }

    const fn default_ineligible_fraction() -> f64 {
        0.7
    }

    const fn default_retention_factor() -> f64 {
        1.5
    }

    /// How long samples are retained, in milliseconds.
    pub fn retention_ms(&self) -> u64 {
        (self.window_ms as f64 * self.retention_factor) as u64
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed_threshold_kmh: Self::default_speed_threshold_kmh(),
            window_ms: Self::default_window_ms(),
            min_sample_interval_ms: Self::default_min_sample_interval_ms(),
            min_speed_interval_ms: Self::default_min_speed_interval_ms(),
            min_speed_distance_m: Self::default_min_speed_distance_m(),
            min_samples: Self::default_min_samples(),
            min_speed_readings: Self::default_min_speed_readings(),
            ineligible_fraction: Self::default_ineligible_fraction(),
            retention_factor: Self::default_retention_factor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    /// Largest region, in cells, that still counts as enclosed.
    #[serde(default = "CaptureConfig::default_fill_cap")]
    pub fill_cap: usize,
}

impl CaptureConfig {
    const fn default_fill_cap() -> usize {
        100
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fill_cap: Self::default_fill_cap(),
        }
    }
}

/// Coin amounts signalled to the external economy layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EconomyConfig {
    #[serde(default = "EconomyConfig::default_claim_cost")]
    pub claim_cost: u64,

    /// Credited to the previous owner when a tile is purchased.
    #[serde(default = "EconomyConfig::default_sale_credit")]
    pub sale_credit: u64,

    /// Paid per newly captured territory.
    #[serde(default = "EconomyConfig::default_capture_reward")]
    pub capture_reward: u64,
}

impl EconomyConfig {
    const fn default_claim_cost() -> u64 {
        1
    }

    const fn default_sale_credit() -> u64 {
        20
    }

    const fn default_capture_reward() -> u64 {
        10
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            claim_cost: Self::default_claim_cost(),
            sale_credit: Self::default_sale_credit(),
            capture_reward: Self::default_capture_reward(),
        }
    }
}

impl Config {
    pub fn with_proximity(mut self, proximity: ProximityConfig) -> Self {
        self.proximity = proximity;
        self
    }

    pub fn with_movement(mut self, movement: MovementConfig) -> Self {
        self.movement = movement;
        self
    }

    pub fn with_fill_cap(mut self, fill_cap: usize) -> Self {
        assert!(fill_cap > 0, "Fill cap must be greater than zero");
        if fill_cap > 10_000 {
            log::warn!(
                "Fill cap of {} cells is very large; every claim runs up to one fill per \
                open neighbor of the player's tiles",
                fill_cap
            );
        }
        self.capture.fill_cap = fill_cap;
        self
    }

    pub fn with_economy(mut self, economy: EconomyConfig) -> Self {
        self.economy = economy;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        let p = &self.proximity;
        validate_radius(p.load_radius_m).map_err(|e| format!("Load radius: {e}"))?;
        // The 3x3 geohash block only guarantees coverage up to the half-width
        // of one cell.
        if p.load_radius_m > crate::compute::geo_index::MAX_COVERED_RADIUS_M {
            return Err(format!(
                "Load radius {} m exceeds the {} m covered by a geohash neighborhood",
                p.load_radius_m,
                crate::compute::geo_index::MAX_COVERED_RADIUS_M
            ));
        }
        if !(p.requery_threshold_m.is_finite() && p.requery_threshold_m >= 0.0) {
            return Err(format!(
                "Re-query threshold must be non-negative, got {}",
                p.requery_threshold_m
            ));
        }

        let m = &self.movement;
        if !(m.speed_threshold_kmh.is_finite() && m.speed_threshold_kmh > 0.0) {
            return Err("Speed threshold must be positive".to_string());
        }
        if m.window_ms == 0 {
            return Err("Consistency window must be greater than zero".to_string());
        }
        if !(0.0..=1.0).contains(&m.ineligible_fraction) {
            return Err(format!(
                "Ineligible fraction must be within [0, 1], got {}",
                m.ineligible_fraction
            ));
        }
        if m.retention_factor < 1.0 {
            return Err("Retention factor must be at least 1.0".to_string());
        }
        if m.min_samples < 2 {
            return Err("At least two samples are needed to measure speed".to_string());
        }

        if self.capture.fill_cap == 0 {
            return Err("Fill cap must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
