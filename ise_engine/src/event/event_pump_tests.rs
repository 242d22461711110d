/// Tests for EventQueue and EventPump

use super::*;
use std::time::Duration;

fn wait_for(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

// ============================================================================
// Queue Tests
// ============================================================================

#[test]
fn test_pop_all_returns_events_in_order() {
    let queue = EventQueue::new();
    queue.push(WindowEvent::Resized { width: 10, height: 20 });
    queue.push(WindowEvent::RecreateRequested);
    queue.push(WindowEvent::CloseRequested);

    assert_eq!(queue.len(), 3);
    assert_eq!(
        queue.pop_all(),
        vec![
            WindowEvent::Resized { width: 10, height: 20 },
            WindowEvent::RecreateRequested,
            WindowEvent::CloseRequested,
        ]
    );
    assert!(queue.is_empty());
    assert!(queue.pop_all().is_empty());
}

// ============================================================================
// Pump Tests
// ============================================================================

#[test]
fn test_resize_event_notifies_handle() {
    let resize = ResizeHandle::new();
    let pump = EventPump::spawn(EventPumpConfig::default(), resize.clone()).unwrap();

    pump.push(WindowEvent::Resized { width: 640, height: 480 });

    assert!(wait_for(|| resize.is_pending()));
    assert!(!pump.take_quit_request());
}

#[test]
fn test_quit_request_is_latched_once() {
    let pump = EventPump::spawn(EventPumpConfig::default(), ResizeHandle::new()).unwrap();

    pump.push(WindowEvent::CloseRequested);

    assert!(wait_for(|| pump.take_quit_request()));
    assert!(!pump.take_quit_request());
}

#[test]
fn test_recreate_requests_coalesce() {
    let pump = EventPump::spawn(EventPumpConfig::default(), ResizeHandle::new()).unwrap();
    let queue = pump.queue();

    queue.push(WindowEvent::RecreateRequested);
    queue.push(WindowEvent::RecreateRequested);
    assert!(wait_for(|| queue.is_empty()));

    assert!(pump.take_recreate_request());
    assert!(!pump.take_recreate_request());
}

#[test]
fn test_shutdown_stops_thread() {
    let mut pump = EventPump::spawn(EventPumpConfig { max_pumps_per_second: 100 }, ResizeHandle::new()).unwrap();
    assert!(pump.is_running());

    pump.shutdown();
    assert!(!pump.is_running());

    // Nothing drains the queue anymore
    pump.push(WindowEvent::CloseRequested);
    thread::sleep(Duration::from_millis(20));
    assert!(!pump.take_quit_request());

    // Second shutdown is a no-op
    pump.shutdown();
}

#[test]
fn test_zero_rate_is_rejected() {
    let result = EventPump::spawn(EventPumpConfig { max_pumps_per_second: 0 }, ResizeHandle::new());
    assert!(matches!(result, Err(Error::InvalidState(_))));
}
