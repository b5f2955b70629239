//! Per-player client state: movement history and query scoping.

use crate::compute::geo_index::distance_meters;
use crate::compute::movement::MovementValidator;
use crate::compute::validation::validate_sample;
use crate::config::{Config, MovementConfig, ProximityConfig};
use crate::error::Result;
use geoclaim_types::PositionSample;

/// Decides when the player has moved far enough to reload nearby tiles.
#[derive(Debug, Clone)]
pub struct ProximityTracker {
    threshold_m: f64,
    last_query: Option<(f64, f64)>,
}

impl ProximityTracker {
    pub fn new(threshold_m: f64) -> Self {
        Self {
            threshold_m,
            last_query: None,
        }
    }

    /// True on the first fix and whenever the player is more than the
    /// threshold away from the last query center. A true result moves the
    /// center to (lat, lng).
    pub fn should_requery(&mut self, lat: f64, lng: f64) -> bool {
        let due = match self.last_query {
            None => true,
            Some((qlat, qlng)) => distance_meters(qlat, qlng, lat, lng) > self.threshold_m,
        };
        if due {
            self.last_query = Some((lat, lng));
        }
        due
    }

    pub fn last_query(&self) -> Option<(f64, f64)> {
        self.last_query
    }

    pub fn reset(&mut self) {
        self.last_query = None;
    }
}

/// Movement gate plus proximity tracking for one device.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    movement: MovementValidator,
    proximity: ProximityTracker,
}

impl PlayerSession {
    pub fn new(movement: MovementConfig, proximity: &ProximityConfig) -> Self {
        Self {
            movement: MovementValidator::new(movement),
            proximity: ProximityTracker::new(proximity.requery_threshold_m),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.movement.clone(), &config.proximity)
    }

    /// Validate and record a fix. Returns whether it was kept.
    pub fn record(&mut self, sample: PositionSample) -> Result<bool> {
        validate_sample(&sample)?;
        Ok(self.movement.record(sample))
    }

    pub fn is_ineligible(&self, now_ms: u64) -> bool {
        self.movement.is_ineligible(now_ms)
    }

    pub fn should_requery(&mut self, lat: f64, lng: f64) -> bool {
        self.proximity.should_requery(lat, lng)
    }

    pub fn movement(&self) -> &MovementValidator {
        &self.movement
    }

    pub fn proximity(&self) -> &ProximityTracker {
        &self.proximity
    }

    pub fn latest(&self) -> Option<&PositionSample> {
        self.movement.latest()
    }
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
