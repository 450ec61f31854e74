mod common;

use std::thread;
use std::time::Duration;

use common::{config_with_cycle, dispatch_log, logged, wait_for, RecordingFb};
use fabrik_runtime::fb::EventEntry;
use fabrik_runtime::EventChainEngine;

#[test]
fn overfilled_queue_drops_the_excess() {
    let log = dispatch_log();
    let fb = RecordingFb::new("FB1", log.clone());

    let mut engine = EventChainEngine::with_queue_capacity(&config_with_cycle(20), 4);
    let handle = engine.handle();

    for _ in 0..6 {
        handle.add_event_entry(EventEntry::new(&fb, 0));
    }
    assert_eq!(handle.pending_events(), 4);
    assert_eq!(engine.metrics().dropped, 2);

    engine.start().expect("engine starts");
    assert!(wait_for(
        || logged(&log).len() == 4,
        Duration::from_secs(2)
    ));

    // no late deliveries
    thread::sleep(Duration::from_millis(100));
    assert_eq!(logged(&log).len(), 4);
    assert_eq!(engine.metrics().dispatched, 4);
    assert_eq!(engine.metrics().dropped, 2);

    engine.stop().expect("engine stops");
    engine.join();
}

#[test]
fn queue_accepts_again_after_draining() {
    let log = dispatch_log();
    let fb = RecordingFb::new("FB1", log.clone());

    let mut engine = EventChainEngine::with_queue_capacity(&config_with_cycle(20), 2);
    let handle = engine.handle();
    engine.start().expect("engine starts");

    for round in 1..=3u64 {
        handle.add_event_entry(EventEntry::new(&fb, 0));
        assert!(wait_for(
            || logged(&log).len() == round as usize,
            Duration::from_secs(2)
        ));
    }
    assert_eq!(engine.metrics().dropped, 0);

    engine.stop().expect("engine stops");
    engine.join();
}
