//! Concurrency tests for the shared countdown.

use std::sync::Arc;
use std::thread;
use sunxi_watchdog::prelude::*;

#[test]
fn test_concurrent_set_and_tick_keep_invariant() {
    let upper = 50;
    let state = Arc::new(TimeoutState::new(upper));
    let mut handles = vec![];

    for worker in 0..4_i64 {
        let state = Arc::clone(&state);
        handles.push(thread::spawn(move || {
            for i in 0..1_000_i64 {
                let stored = state.set((i * 7 + worker * 13) % 120 - 10);
                if let Counter::Remaining(value) = stored {
                    assert!(value <= upper);
                }
            }
        }));
    }

    for _ in 0..2 {
        let state = Arc::clone(&state);
        handles.push(thread::spawn(move || {
            for _ in 0..1_000 {
                if let TickOutcome::Remaining(value) = state.tick() {
                    assert!(value < upper);
                }
            }
        }));
    }

    for handle in handles {
        assert!(handle.join().is_ok(), "Thread should not panic");
    }

    match state.counter() {
        Counter::Remaining(value) => assert!(value <= upper),
        Counter::Disabled => {}
    }
}

#[test]
fn test_ticks_are_not_lost() {
    let state = Arc::new(TimeoutState::new(4_000));
    let mut handles = vec![];

    for _ in 0..4 {
        let state = Arc::clone(&state);
        handles.push(thread::spawn(move || {
            for _ in 0..1_000 {
                state.tick();
            }
        }));
    }

    for handle in handles {
        assert!(handle.join().is_ok(), "Thread should not panic");
    }

    assert_eq!(state.counter(), Counter::Remaining(0));
    assert_eq!(state.tick(), TickOutcome::Expired);
}

#[test]
fn test_disable_wins_when_last() {
    let state = Arc::new(TimeoutState::new(30));
    let ticker = {
        let state = Arc::clone(&state);
        thread::spawn(move || {
            for _ in 0..500 {
                state.tick();
            }
        })
    };

    let feeder = InputFeeder::new(Arc::clone(&state));
    for _ in 0..500 {
        feeder.apply("30");
    }
    assert!(ticker.join().is_ok(), "Thread should not panic");

    feeder.apply("-1");
    assert_eq!(state.tick(), TickOutcome::Disabled);
}
