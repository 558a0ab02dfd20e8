//! Tests for the event pool
//!
//! Covers the producer/analyzer contract: exact analysis quota, bounded
//! overshoot, single delivery, finalize ordering and failure reporting.

use flow_simulator_core_rs::config::{PollStrategy, PoolConfig};
use flow_simulator_core_rs::models::Event;
use flow_simulator_core_rs::pipeline::{EventAnalyzer, EventPool, PipelineError};
use proptest::prelude::*;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::thread;
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn empty_event() -> Event {
    Event::new(0.0, Vec::new())
}

/// Records what the pipeline handed over and when.
#[derive(Default)]
struct Recorder {
    ids: Vec<Uuid>,
    finalize_calls: usize,
    analyzed_after_finalize: usize,
}

impl EventAnalyzer for Recorder {
    type Error = Infallible;

    fn analyze(&mut self, event: &Event) {
        if self.finalize_calls > 0 {
            self.analyzed_after_finalize += 1;
        }
        self.ids.push(event.id());
    }

    fn finalize(&mut self) -> Result<(), Infallible> {
        self.finalize_calls += 1;
        Ok(())
    }
}

/// Producers that log every id they emit into a shared set.
fn tracked_producers(
    count: usize,
    made: &Arc<Mutex<HashSet<Uuid>>>,
) -> Vec<impl FnMut() -> Event + Send> {
    (0..count)
        .map(|_| {
            let made = Arc::clone(made);
            move || {
                let event = empty_event();
                made.lock().unwrap().insert(event.id());
                event
            }
        })
        .collect()
}

fn plain_producers(count: usize) -> Vec<fn() -> Event> {
    vec![empty_event as fn() -> Event; count]
}

#[test]
fn test_quota_met_with_bounded_overshoot() {
    init_tracing();
    let pool = EventPool::new(1000);
    let mut recorder = Recorder::default();

    let summary = pool.run(plain_producers(8), &mut recorder).unwrap();

    assert_eq!(summary.analyzed, 1000);
    assert_eq!(recorder.ids.len(), 1000);
    assert!(summary.generated >= 1000);
    assert!(summary.generated <= 1000 + 7, "overshoot {}", summary.generated);
    assert_eq!(summary.leftover, summary.generated - summary.analyzed);
    assert_eq!(pool.queued(), summary.leftover);
}

#[test]
fn test_every_analyzed_event_was_produced_once() {
    init_tracing();
    let made = Arc::new(Mutex::new(HashSet::new()));
    let pool = EventPool::new(500);
    let mut recorder = Recorder::default();

    let summary = pool
        .run(tracked_producers(4, &made), &mut recorder)
        .unwrap();

    let made = made.lock().unwrap();
    assert_eq!(made.len(), summary.generated);

    let seen: HashSet<Uuid> = recorder.ids.iter().copied().collect();
    assert_eq!(seen.len(), recorder.ids.len(), "an event was delivered twice");
    assert!(seen.is_subset(&made));
}

#[test]
fn test_finalize_called_once_after_last_analyze() {
    init_tracing();
    let pool = EventPool::new(200);
    let mut recorder = Recorder::default();

    pool.run(plain_producers(3), &mut recorder).unwrap();

    assert_eq!(recorder.finalize_calls, 1);
    assert_eq!(recorder.analyzed_after_finalize, 0);
}

#[test]
fn test_zero_quota_finalizes_immediately() {
    init_tracing();
    let pool = EventPool::new(0);
    let mut recorder = Recorder::default();

    let summary = pool.run(plain_producers(4), &mut recorder).unwrap();

    assert_eq!(summary.analyzed, 0);
    assert!(recorder.ids.is_empty());
    assert_eq!(recorder.finalize_calls, 1);
    assert_eq!(summary.per_producer.iter().sum::<usize>(), summary.generated);
}

#[test]
fn test_single_producer_has_no_overshoot() {
    init_tracing();
    let pool = EventPool::new(250);
    let mut recorder = Recorder::default();

    let summary = pool.run(plain_producers(1), &mut recorder).unwrap();

    assert_eq!(summary.generated, 250);
    assert_eq!(summary.analyzed, 250);
    assert_eq!(summary.leftover, 0);
    assert_eq!(summary.per_producer, vec![250]);
}

#[test]
fn test_per_producer_counts_sum_to_generated() {
    init_tracing();
    let pool = EventPool::new(1000);
    let mut recorder = Recorder::default();

    let summary = pool.run(plain_producers(6), &mut recorder).unwrap();

    assert_eq!(summary.per_producer.len(), 6);
    assert_eq!(summary.per_producer.iter().sum::<usize>(), summary.generated);
    assert_eq!(pool.generated_count(), summary.generated);
}

#[test]
fn test_repeated_runs_complete() {
    init_tracing();
    for _ in 0..20 {
        let pool = EventPool::new(100);
        let mut recorder = Recorder::default();
        let summary = pool.run(plain_producers(4), &mut recorder).unwrap();
        assert_eq!(summary.analyzed, 100);
        assert_eq!(recorder.finalize_calls, 1);

        let seen: HashSet<Uuid> = recorder.ids.iter().copied().collect();
        assert_eq!(seen.len(), 100);
    }
}

#[test]
fn test_all_poll_strategies_complete() {
    init_tracing();
    for poll in [
        PollStrategy::Spin,
        PollStrategy::Yield,
        PollStrategy::Sleep { micros: 10 },
    ] {
        let config = PoolConfig {
            poll,
            progress_interval: 50,
        };
        let pool = EventPool::with_config(300, config);
        let mut recorder = Recorder::default();
        let summary = pool.run(plain_producers(2), &mut recorder).unwrap();
        assert_eq!(summary.analyzed, 300, "poll strategy {:?}", poll);
    }
}

#[test]
fn test_no_producers_with_quota_is_rejected() {
    let pool = EventPool::new(10);
    let mut recorder = Recorder::default();

    let result = pool.run(plain_producers(0), &mut recorder);

    assert!(matches!(
        result,
        Err(PipelineError::NoProducers { required: 10 })
    ));
    assert_eq!(recorder.finalize_calls, 0);
}

#[test]
fn test_producer_panic_is_reported() {
    init_tracing();
    let producers: Vec<Box<dyn FnMut() -> Event + Send>> = vec![
        Box::new(empty_event),
        Box::new(|| panic!("detector on fire")),
    ];
    let pool = EventPool::new(100);
    let mut recorder = Recorder::default();

    let result = pool.run(producers, &mut recorder);

    match result {
        Err(PipelineError::ProducerPanicked { index, message }) => {
            assert_eq!(index, 1);
            assert!(message.contains("detector on fire"));
        }
        other => panic!("expected ProducerPanicked, got {:?}", other.map(|s| s.analyzed)),
    }
}

#[test]
fn test_all_producers_panicking_does_not_hang() {
    init_tracing();
    let producers: Vec<Box<dyn FnMut() -> Event + Send>> =
        vec![Box::new(|| panic!("boom")), Box::new(|| panic!("boom"))];
    let pool = EventPool::new(100);
    let mut recorder = Recorder::default();

    let result = pool.run(producers, &mut recorder);

    assert!(matches!(result, Err(PipelineError::ProducerPanicked { .. })));
    assert_eq!(recorder.finalize_calls, 0);
}

#[test]
fn test_producers_running_dry_stop_the_analyzer() {
    init_tracing();
    // Each producer dies after five events, well short of the quota
    let producers: Vec<Box<dyn FnMut() -> Event + Send>> = (0..2)
        .map(|_| {
            let mut left = 5;
            Box::new(move || {
                if left == 0 {
                    panic!("out of events");
                }
                left -= 1;
                empty_event()
            }) as Box<dyn FnMut() -> Event + Send>
        })
        .collect();
    let pool = EventPool::new(1000);
    let mut recorder = Recorder::default();

    let result = pool.run(producers, &mut recorder);

    assert!(result.is_err());
    assert_eq!(recorder.finalize_calls, 0);
    assert!(recorder.ids.len() <= 10);
}

struct FailingFinalize;

impl EventAnalyzer for FailingFinalize {
    type Error = std::io::Error;

    fn analyze(&mut self, _event: &Event) {}

    fn finalize(&mut self) -> Result<(), std::io::Error> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
    }
}

#[test]
fn test_finalize_error_is_propagated() {
    init_tracing();
    let pool = EventPool::new(20);

    let result = pool.run(plain_producers(2), &mut FailingFinalize);

    match result {
        Err(PipelineError::Finalize(source)) => assert!(source.to_string().contains("disk full")),
        other => panic!("expected Finalize, got {:?}", other.map(|s| s.analyzed)),
    }
}

struct PanickingAnalyzer;

impl EventAnalyzer for PanickingAnalyzer {
    type Error = Infallible;

    fn analyze(&mut self, _event: &Event) {
        panic!("bad event");
    }

    fn finalize(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

#[test]
fn test_analyzer_panic_is_reported() {
    init_tracing();
    let pool = EventPool::new(50);

    let result = pool.run(plain_producers(2), &mut PanickingAnalyzer);

    match result {
        Err(PipelineError::AnalyzerPanicked { message }) => assert!(message.contains("bad event")),
        other => panic!("expected AnalyzerPanicked, got {:?}", other.map(|s| s.analyzed)),
    }
}

#[test]
fn test_analyzer_panic_stops_producers() {
    init_tracing();
    let pool = EventPool::new(200_000);

    let result = pool.run(plain_producers(4), &mut PanickingAnalyzer);

    assert!(matches!(result, Err(PipelineError::AnalyzerPanicked { .. })));
    assert_eq!(pool.analyzed_count(), 1);
    assert!(
        pool.generated_count() < 100_000,
        "producers kept filling an undrained queue: {} events",
        pool.generated_count()
    );
}

#[test]
fn test_direct_add_and_get_from_threads() {
    let pool = EventPool::new(400);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    pool.add(empty_event());
                }
            });
        }
    });

    let mut seen = HashSet::new();
    while let Some(event) = pool.get() {
        assert!(seen.insert(event.id()));
    }

    assert_eq!(seen.len(), 400);
    assert_eq!(pool.generated_count(), 400);
    assert_eq!(pool.analyzed_count(), 400);
    assert!(pool.get().is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_counts_hold_for_any_quota(required in 0usize..300, producers in 1usize..6) {
        let pool = EventPool::new(required);
        let mut recorder = Recorder::default();

        let summary = pool.run(plain_producers(producers), &mut recorder).unwrap();

        prop_assert_eq!(summary.analyzed, required);
        prop_assert_eq!(recorder.ids.len(), required);
        prop_assert!(summary.generated >= required);
        prop_assert!(summary.generated <= required + producers - 1);
        prop_assert_eq!(summary.per_producer.iter().sum::<usize>(), summary.generated);
        prop_assert_eq!(summary.leftover, summary.generated - required);
        prop_assert_eq!(recorder.finalize_calls, 1);
    }
}
