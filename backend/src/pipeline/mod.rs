//! Event production / analysis pipeline
//!
//! This module decouples N parallel event producers from a single
//! sequential analyzer through the [`EventPool`].
//!
//! # Pipeline Interface
//!
//! Producers implement [`EventProducer`] and the analyzer implements
//! [`EventAnalyzer`]:
//!
//! ```rust
//! use flow_simulator_core_rs::models::Event;
//! use flow_simulator_core_rs::pipeline::{EventAnalyzer, EventPool};
//!
//! struct Counter {
//!     seen: usize,
//!     finalized: bool,
//! }
//!
//! impl EventAnalyzer for Counter {
//!     type Error = std::convert::Infallible;
//!
//!     fn analyze(&mut self, _event: &Event) {
//!         self.seen += 1;
//!     }
//!
//!     fn finalize(&mut self) -> Result<(), Self::Error> {
//!         self.finalized = true;
//!         Ok(())
//!     }
//! }
//!
//! let pool = EventPool::new(100);
//! let producers: Vec<_> = (0..4).map(|_| || Event::new(0.0, Vec::new())).collect();
//! let mut counter = Counter { seen: 0, finalized: false };
//!
//! let summary = pool.run(producers, &mut counter).unwrap();
//! assert_eq!(summary.analyzed, 100);
//! assert_eq!(counter.seen, 100);
//! assert!(counter.finalized);
//! ```
//!
//! # Guarantees
//!
//! - Every event handed to the analyzer was added exactly once and is
//!   delivered at most once.
//! - Exactly `required` events are analyzed; producers may overshoot the
//!   quota by at most `producers - 1` events, which stay in the queue.
//! - `finalize` runs once, after the last `analyze`.

mod pool;

pub use pool::{EventPool, PipelineError, RunSummary};

use crate::models::Event;

/// Source of events for one producer thread.
///
/// Each producer is moved onto its own thread, so implementations need no
/// internal locking for their own state.
pub trait EventProducer: Send {
    /// Produce one complete event.
    fn produce(&mut self) -> Event;
}

impl<F> EventProducer for F
where
    F: FnMut() -> Event + Send,
{
    fn produce(&mut self) -> Event {
        self()
    }
}

/// Consumer of events, driven from the single analyzer thread.
pub trait EventAnalyzer: Send {
    /// Error reported by [`finalize`](EventAnalyzer::finalize).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fold one event into the accumulated statistics.
    fn analyze(&mut self, event: &Event);

    /// Derive final observables once all events have been analyzed.
    fn finalize(&mut self) -> Result<(), Self::Error>;
}
