//! Host-level tests for the pulse comparators and averaging.
#![cfg(feature = "host")]

use slowrf::bucket::BucketState;
use slowrf::wave::{check_rf_sync, make_avg, wave_equals, wave_equals_itv3, Wave};

#[test]
fn equal_waves_match() {
    let reference = Wave::new(50, 50);
    assert!(wave_equals(&reference, 50, 50, BucketState::Collect));
    assert!(wave_equals(&reference, 55, 45, BucketState::Collect));
}

#[test]
fn tolerance_is_strict() {
    // 200/16 = 12 scaled units; a difference of exactly 12 is out.
    let reference = Wave::new(50, 50);
    assert!(wave_equals(&reference, 61, 50, BucketState::Collect));
    assert!(!wave_equals(&reference, 62, 50, BucketState::Collect));
    assert!(wave_equals(&reference, 50, 39, BucketState::Collect));
    assert!(!wave_equals(&reference, 50, 38, BucketState::Collect));
}

#[test]
fn sum_difference_rejects_even_when_components_pass() {
    // high and low each drift by 8, the sum drifts by 16.
    let reference = Wave::new(50, 50);
    assert!(!wave_equals(&reference, 58, 58, BucketState::Collect));
}

#[test]
fn intertechno_state_widens_tolerance() {
    let reference = Wave::new(50, 50);
    assert!(!wave_equals(&reference, 65, 50, BucketState::Collect));
    assert!(wave_equals(&reference, 65, 50, BucketState::It));
    // but not in V3 collection, which has its own comparator
    assert!(!wave_equals(&reference, 65, 50, BucketState::ItV3));
}

#[test]
fn large_references_do_not_wrap() {
    // The raw u8 differences would wrap; signed 16-bit math must not.
    let reference = Wave::new(250, 250);
    assert!(!wave_equals(&reference, 10, 10, BucketState::Collect));
    assert!(!wave_equals(&Wave::new(5, 5), 250, 250, BucketState::Collect));
}

#[test]
fn itv3_comparator_uses_ratio_only() {
    assert!(wave_equals_itv3(15, 78));
    assert!(!wave_equals_itv3(15, 15));
    // the margin is the standard tolerance
    assert!(!wave_equals_itv3(15, 27));
    assert!(wave_equals_itv3(15, 28));
}

#[test]
fn averaging_is_idempotent() {
    for value in [0u8, 1, 25, 67, 200, 255] {
        assert_eq!(make_avg(value, value), value);
    }
}

#[test]
fn averaging_converges() {
    // From above the truncating division lands exactly on the target;
    // from below it stalls within the rounding margin.
    let mut value = 200u8;
    for _ in 0..32 {
        value = make_avg(value, 30);
    }
    assert_eq!(value, 30);

    let mut value = 10u8;
    for _ in 0..32 {
        value = make_avg(value, 80);
    }
    assert!(value >= 77 && value <= 80, "converged to {value}");
    assert_eq!(make_avg(value, 80), value);
}

#[test]
fn router_sync_window() {
    // 768:384 µs scaled is 48:24.
    assert!(check_rf_sync(48, 24));
    assert!(check_rf_sync(0x25, 0x0A));
    assert!(check_rf_sync(0x3B, 0x26));
    assert!(!check_rf_sync(0x24, 0x0A));
    assert!(!check_rf_sync(0x3C, 0x0A));
    assert!(!check_rf_sync(0x25, 0x09));
    // long must actually be longer than short
    assert!(!check_rf_sync(0x26, 0x26));
}
