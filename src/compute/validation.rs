//! Validation for geographic coordinates and location samples.

use crate::error::{ClaimError, Result};
use geoclaim_types::PositionSample;

/// Validates a latitude/longitude pair.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]
///
/// # Examples
///
/// ```
/// use geoclaim::compute::validation::validate_coordinate;
///
/// assert!(validate_coordinate(40.7128, -74.0060).is_ok());
/// assert!(validate_coordinate(95.0, -74.0).is_err());
/// assert!(validate_coordinate(40.0, 200.0).is_err());
/// ```
pub fn validate_coordinate(lat: f64, lng: f64) -> Result<()> {
    if !lat.is_finite() {
        return Err(ClaimError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !lng.is_finite() {
        return Err(ClaimError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lng
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(ClaimError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(ClaimError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lng
        )));
    }

    Ok(())
}

/// Validates a sensor fix: coordinates in range and a sane accuracy value.
pub fn validate_sample(sample: &PositionSample) -> Result<()> {
    validate_coordinate(sample.lat, sample.lng)?;

    if let Some(accuracy) = sample.accuracy_m
        && !(accuracy.is_finite() && accuracy >= 0.0)
    {
        return Err(ClaimError::InvalidInput(format!(
            "Accuracy must be a non-negative distance, got: {}",
            accuracy
        )));
    }

    Ok(())
}

/// Validates a radius for proximity queries.
///
/// ```
/// use geoclaim::compute::validation::validate_radius;
///
/// assert!(validate_radius(200.0).is_ok());
/// assert!(validate_radius(0.0).is_err());
/// assert!(validate_radius(f64::NAN).is_err());
/// ```
pub fn validate_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() {
        return Err(ClaimError::InvalidInput(format!(
            "Radius must be finite, got: {}",
            radius
        )));
    }
    if radius <= 0.0 {
        return Err(ClaimError::InvalidInput(format!(
            "Radius must be positive, got: {}",
            radius
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        assert!(validate_coordinate(40.7128, -74.0060).is_ok());
        assert!(validate_coordinate(51.5074, -0.1278).is_ok());

        // Edge cases
        assert!(validate_coordinate(90.0, 180.0).is_ok());
        assert!(validate_coordinate(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(validate_coordinate(90.1, 0.0).is_err());
        assert!(validate_coordinate(-90.1, 0.0).is_err());
        assert!(validate_coordinate(0.0, 180.1).is_err());
        assert!(validate_coordinate(f64::NAN, 0.0).is_err());
        assert!(validate_coordinate(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_sample_accuracy() {
        let fix = PositionSample::new(1.0, 1.0, 0);
        assert!(validate_sample(&fix).is_ok());
        assert!(validate_sample(&fix.with_accuracy(12.0)).is_ok());
        assert!(validate_sample(&fix.with_accuracy(-1.0)).is_err());
        assert!(validate_sample(&fix.with_accuracy(f64::NAN)).is_err());
    }

    #[test]
    fn test_validate_radius() {
        assert!(validate_radius(0.1).is_ok());
        assert!(validate_radius(-5.0).is_err());
        assert!(validate_radius(f64::INFINITY).is_err());
    }
}
