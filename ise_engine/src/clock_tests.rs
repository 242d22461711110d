//! Unit tests for clock.rs

use super::*;

#[test]
fn test_manual_clock_advance() {
    let clock = ManualClock::new();
    assert_eq!(clock.elapsed(), Duration::ZERO);

    clock.advance(Duration::from_millis(5));
    assert_eq!(clock.elapsed(), Duration::from_millis(5));
    assert!(clock.sleeps().is_empty());
}

#[test]
fn test_manual_clock_sleep_records_and_advances() {
    let clock = ManualClock::new();
    clock.sleep(Duration::from_millis(3));
    clock.sleep(Duration::from_millis(7));

    assert_eq!(clock.elapsed(), Duration::from_millis(10));
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(3), Duration::from_millis(7)]);
}

#[test]
fn test_system_clock_is_monotonic() {
    let clock = SystemClock::new();
    let first = clock.elapsed();
    clock.sleep(Duration::from_millis(1));
    assert!(clock.elapsed() > first);
}

#[test]
fn test_pacing_delay() {
    assert_eq!(pacing_delay(100, Duration::from_millis(4)), Some(Duration::from_millis(6)));
    assert_eq!(pacing_delay(100, Duration::from_millis(10)), None);
    assert_eq!(pacing_delay(100, Duration::from_millis(25)), None);
    assert_eq!(pacing_delay(90, Duration::ZERO), Some(Duration::from_micros(11_111)));
}

#[test]
fn test_pacing_delay_event_rate() {
    // 2000 pumps per second
    assert_eq!(pacing_delay(2000, Duration::from_micros(100)), Some(Duration::from_micros(400)));
    assert_eq!(pacing_delay(0, Duration::ZERO), Some(Duration::from_secs(1)));
}
