use geoclaim::compute::movement::{MovementValidator, instantaneous_speed};
use geoclaim::config::MovementConfig;
use geoclaim::{PlayerSession, PositionSample};

const METERS_PER_DEGREE_LAT: f64 = 111_195.0;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fixes heading north at `kmh`, one every `step_ms`.
fn walk(validator: &mut MovementValidator, kmh: f64, step_ms: u64, count: u64, start_ms: u64) {
    let step_m = kmh / 3.6 * (step_ms as f64 / 1000.0);
    for i in 0..count {
        let lat = 51.5 + i as f64 * step_m / METERS_PER_DEGREE_LAT;
        validator.record(PositionSample::new(lat, -0.12, start_ms + i * step_ms));
    }
}

#[test]
fn test_sixty_kmh_is_ineligible() {
    init();
    let mut v = MovementValidator::default();
    walk(&mut v, 60.0, 3_000, 6, 0);
    assert_eq!(v.len(), 6);
    assert!(v.is_ineligible(15_000));
}

#[test]
fn test_three_kmh_is_eligible() {
    init();
    let mut v = MovementValidator::default();
    walk(&mut v, 3.0, 5_000, 6, 0);
    assert!(!v.is_ineligible(25_000));
}

#[test]
fn test_standing_still_is_eligible() {
    init();
    let mut v = MovementValidator::default();
    for i in 0..10u64 {
        v.record(PositionSample::new(51.5, -0.12, i * 2_500));
    }
    assert!(v.average_speed().is_none());
    assert!(!v.is_ineligible_latest());
}

#[test]
fn test_insufficient_data_is_eligible() {
    init();
    let mut v = MovementValidator::default();
    walk(&mut v, 120.0, 3_000, 4, 0);
    assert!(!v.is_ineligible(9_000));
}

#[test]
fn test_debounced_fixes_do_not_count() {
    init();
    let mut v = MovementValidator::default();
    // Ten fixes a second apart: only every other one is kept.
    walk(&mut v, 60.0, 1_000, 10, 0);
    assert_eq!(v.len(), 5);
}

#[test]
fn test_stopping_restores_eligibility() {
    init();
    let mut v = MovementValidator::default();
    walk(&mut v, 60.0, 3_000, 6, 0);
    assert!(v.is_ineligible_latest());

    // Stand still long enough for the fast readings to leave the window.
    let last = *v.latest().unwrap();
    for i in 1..=15u64 {
        v.record(PositionSample::new(last.lat, last.lng, last.timestamp_ms + i * 2_000));
    }
    assert!(!v.is_ineligible_latest());
}

#[test]
fn test_custom_threshold() {
    init();
    let config = MovementConfig {
        speed_threshold_kmh: 100.0,
        ..Default::default()
    };
    let mut v = MovementValidator::new(config);
    walk(&mut v, 60.0, 3_000, 6, 0);
    assert!(!v.is_ineligible_latest());
}

#[test]
fn test_speed_reading() {
    let cfg = MovementConfig::default();
    let a = PositionSample::new(0.0, 0.0, 0);
    let b = PositionSample::new(0.0, 0.0009, 10_000);
    // ~100 m in 10 s.
    let kmh = instantaneous_speed(&cfg, &a, &b).unwrap();
    assert!((kmh - 36.0).abs() < 0.5, "got {kmh}");
}

#[test]
fn test_session_gates_on_movement() {
    init();
    let mut session = PlayerSession::default();
    for i in 0..6u64 {
        let lat = 51.5 + i as f64 * 50.0 / METERS_PER_DEGREE_LAT;
        assert!(session.record(PositionSample::new(lat, -0.12, i * 3_000)).unwrap());
    }
    assert!(session.is_ineligible(15_000));
    assert!(!session.is_ineligible(120_000));
}
