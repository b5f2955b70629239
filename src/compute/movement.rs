//! Walking-speed gate for claims.
//!
//! The validator keeps a short rolling window of location fixes and flags a
//! player as ineligible only when most speed readings in the window exceed
//! walking pace. A single GPS jump cannot trip it, and sparse or noisy data
//! always resolves to "eligible".
//!
//! ```
//! use geoclaim::compute::movement::MovementValidator;
//! use geoclaim::config::MovementConfig;
//! use geoclaim::PositionSample;
//!
//! let mut validator = MovementValidator::new(MovementConfig::default());
//! // ~50 m every 3 s is about 60 km/h.
//! for i in 0..6u64 {
//!     let lat = 40.0 + i as f64 * 0.00045;
//!     validator.record(PositionSample::new(lat, -74.0, i * 3_000));
//! }
//! assert!(validator.is_ineligible(15_000));
//! ```

use crate::compute::geo_index::distance_meters;
use crate::config::MovementConfig;
use geoclaim_types::PositionSample;
use std::collections::VecDeque;

const MS_PER_HOUR: f64 = 3_600_000.0;
const METERS_PER_KM: f64 = 1_000.0;

/// Speed between two fixes in km/h.
///
/// Returns `None` when the fixes are too close in time to be reliable or
/// too close in space to be distinguished from GPS noise.
pub fn instantaneous_speed(
    config: &MovementConfig,
    p1: &PositionSample,
    p2: &PositionSample,
) -> Option<f64> {
    let elapsed_ms = p2.timestamp_ms.checked_sub(p1.timestamp_ms)?;
    if elapsed_ms < config.min_speed_interval_ms {
        return None;
    }

    let meters = distance_meters(p1.lat, p1.lng, p2.lat, p2.lng);
    if meters < config.min_speed_distance_m {
        return None;
    }

    Some((meters / METERS_PER_KM) / (elapsed_ms as f64 / MS_PER_HOUR))
}

/// Rolling window of recent fixes for one device.
///
/// Owned by a single sample producer; not meant to be shared between
/// concurrent callers.
#[derive(Debug, Clone)]
pub struct MovementValidator {
    config: MovementConfig,
    history: VecDeque<PositionSample>,
}

impl MovementValidator {
    pub fn new(config: MovementConfig) -> Self {
        // Debounce bounds how many fixes fit in the retention window.
        let capacity = (config.retention_ms() / config.min_sample_interval_ms.max(1)) as usize + 1;
        Self {
            config,
            history: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Recorded fixes, oldest first.
    pub fn samples(&self) -> impl ExactSizeIterator<Item = &PositionSample> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn latest(&self) -> Option<&PositionSample> {
        self.history.back()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Append a fix. Returns `false` if it was debounced.
    ///
    /// Fixes arriving less than the minimum interval after the previous one,
    /// including fixes older than it, are dropped rather than reordered.
    /// After appending, fixes older than the retention window are pruned.
    pub fn record(&mut self, sample: PositionSample) -> bool {
        if let Some(last) = self.history.back() {
            let gap = sample.timestamp_ms.saturating_sub(last.timestamp_ms);
            if gap < self.config.min_sample_interval_ms {
                return false;
            }
        }

        self.history.push_back(sample);

        let cutoff = sample
            .timestamp_ms
            .saturating_sub(self.config.retention_ms());
        while self
            .history
            .front()
            .is_some_and(|oldest| oldest.timestamp_ms < cutoff)
        {
            self.history.pop_front();
        }

        true
    }

    /// Mean of the usable consecutive-pair speeds across the whole history.
    pub fn average_speed(&self) -> Option<f64> {
        let speeds = self.pairwise_speeds(self.history.iter());
        if speeds.is_empty() {
            return None;
        }
        Some(speeds.iter().sum::<f64>() / speeds.len() as f64)
    }

    /// Whether recent movement is sustained above walking speed.
    ///
    /// `now_ms` closes the consistency window. Returns `false` whenever there
    /// is not enough data to judge.
    pub fn is_ineligible(&self, now_ms: u64) -> bool {
        let cfg = &self.config;
        if self.history.len() < cfg.min_samples {
            return false;
        }

        let window_start = now_ms.saturating_sub(cfg.window_ms);
        let recent: Vec<&PositionSample> = self
            .history
            .iter()
            .filter(|s| s.timestamp_ms >= window_start)
            .collect();
        if recent.len() < cfg.min_samples {
            return false;
        }

        let speeds = self.pairwise_speeds(recent.iter().copied());
        if speeds.len() < cfg.min_speed_readings {
            return false;
        }

        let above = speeds
            .iter()
            .filter(|s| **s > cfg.speed_threshold_kmh)
            .count();
        let fraction = above as f64 / speeds.len() as f64;

        log::debug!(
            "movement window: {} fixes, {} readings, {:.0}% above {} km/h",
            recent.len(),
            speeds.len(),
            fraction * 100.0,
            cfg.speed_threshold_kmh
        );

        fraction >= cfg.ineligible_fraction
    }

    /// [`Self::is_ineligible`] with the window ending at the newest fix.
    pub fn is_ineligible_latest(&self) -> bool {
        self.latest()
            .is_some_and(|latest| self.is_ineligible(latest.timestamp_ms))
    }

    fn pairwise_speeds<'a, I>(&self, samples: I) -> Vec<f64>
    where
        I: Iterator<Item = &'a PositionSample>,
    {
        let mut speeds = Vec::new();
        let mut prev: Option<&PositionSample> = None;
        for sample in samples {
            if let Some(p) = prev
                && let Some(speed) = instantaneous_speed(&self.config, p, sample)
            {
                speeds.push(speed);
            }
            prev = Some(sample);
        }
        speeds
    }
}

impl Default for MovementValidator {
    fn default() -> Self {
        Self::new(MovementConfig::default())
    }
}
