use geo::Point;
use serde::{Deserialize, Serialize};

/// A location fix reported by the device sensor.
///
/// # Examples
///
/// ```
/// use geoclaim_types::sample::PositionSample;
///
/// let fix = PositionSample::new(51.5074, -0.1278, 1_000).with_accuracy(8.0);
/// assert_eq!(fix.accuracy_m, Some(8.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub lat: f64,
    pub lng: f64,
    /// Unix milliseconds.
    pub timestamp_ms: u64,
    /// Horizontal accuracy radius reported by the sensor, in meters.
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl PositionSample {
    pub fn new(lat: f64, lng: f64, timestamp_ms: u64) -> Self {
        Self {
            lat,
            lng,
            timestamp_ms,
            accuracy_m: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// x = longitude, y = latitude.
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}
