//! Event Pool
//!
//! A FIFO queue guarded by one mutex, plus generated/analyzed counters.
//! `add` and `get` mutate the queue and their counter under the lock; the
//! counters are additionally read without the lock for quota checks.
//!
//! # Critical Invariants
//!
//! - **Exactly-once delivery**: an event leaves the queue through one `get`
//! - **Exact analysis count**: `analyzed == required` when a run succeeds
//! - **Bounded overshoot**: `required <= generated <= required + producers - 1`
//!
//! The overshoot comes from each producer checking the quota, then
//! producing, then adding. The check and the add are not one atomic step,
//! so every producer may finish one in-flight event after the quota is
//! reached. Those events stay in the queue and are dropped with the pool.

use crate::config::{PollStrategy, PoolConfig};
use crate::models::Event;
use crate::pipeline::{EventAnalyzer, EventProducer};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that end a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No producers supplied for a quota of {required} events")]
    NoProducers { required: usize },

    #[error("Failed to spawn {thread} thread: {source}")]
    Spawn {
        thread: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Producer {index} panicked: {message}")]
    ProducerPanicked { index: usize, message: String },

    #[error("Analyzer panicked: {message}")]
    AnalyzerPanicked { message: String },

    #[error("All producers exited after {analyzed} of {required} events were analyzed")]
    ProducersExhausted { analyzed: usize, required: usize },

    #[error("Analyzer finalization failed: {0}")]
    Finalize(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Counts reported by a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Quota the run was started with
    pub required: usize,

    /// Events added to the pool by all producers
    pub generated: usize,

    /// Events handed to the analyzer
    pub analyzed: usize,

    /// Events added by each producer, indexed by producer
    pub per_producer: Vec<usize>,

    /// Events produced past the quota and never analyzed
    pub leftover: usize,

    pub elapsed: Duration,
}

/// Thread-safe event queue with quota tracking.
///
/// # Example
/// ```
/// use flow_simulator_core_rs::models::Event;
/// use flow_simulator_core_rs::pipeline::EventPool;
///
/// let pool = EventPool::new(2);
/// assert!(pool.get().is_none());
///
/// pool.add(Event::new(0.5, Vec::new()));
/// assert_eq!(pool.generated_count(), 1);
///
/// let event = pool.get().unwrap();
/// assert_eq!(event.reaction_plane(), 0.5);
/// assert_eq!(pool.analyzed_count(), 1);
/// ```
#[derive(Debug)]
pub struct EventPool {
    queue: Mutex<VecDeque<Event>>,
    required: usize,
    generated: AtomicUsize,
    analyzed: AtomicUsize,
    config: PoolConfig,
}

/// Per-run bookkeeping shared by the pipeline threads
struct RunState {
    live_producers: AtomicUsize,
    halted: AtomicBool,
    produced: Vec<AtomicUsize>,
}

/// Marks a producer as gone when its thread exits, unwinding included.
struct ProducerExit<'a>(&'a AtomicUsize);

impl Drop for ProducerExit<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Stops the producers once the analyzer thread exits, unwinding included.
///
/// After a successful run the producers have already met the quota, so
/// this only matters when the analyzer stops early.
struct AnalyzerExit<'a>(&'a AtomicBool);

impl Drop for AnalyzerExit<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl EventPool {
    /// Create a pool for a quota of `required` events.
    pub fn new(required: usize) -> Self {
        Self::with_config(required, PoolConfig::default())
    }

    pub fn with_config(required: usize, config: PoolConfig) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            required,
            generated: AtomicUsize::new(0),
            analyzed: AtomicUsize::new(0),
            config,
        }
    }

    /// Append an event and count it as generated.
    pub fn add(&self, event: Event) {
        let mut queue = self.lock_queue();
        queue.push_back(event);
        self.generated.fetch_add(1, Ordering::SeqCst);
    }

    /// Remove the front event and count it as analyzed.
    ///
    /// Returns `None` when the queue is momentarily empty; callers poll.
    pub fn get(&self) -> Option<Event> {
        let mut queue = self.lock_queue();
        let event = queue.pop_front()?;
        self.analyzed.fetch_add(1, Ordering::SeqCst);
        Some(event)
    }

    pub fn required_count(&self) -> usize {
        self.required
    }

    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }

    pub fn analyzed_count(&self) -> usize {
        self.analyzed.load(Ordering::SeqCst)
    }

    /// Number of events waiting in the queue
    pub fn queued(&self) -> usize {
        self.lock_queue().len()
    }

    /// Run the pipeline to completion.
    ///
    /// Spawns one thread per producer and a single analyzer thread, then
    /// joins them all. Producers add events until the generated count
    /// reaches the quota; the analyzer takes events until the analyzed count
    /// reaches it and then calls `finalize` once.
    ///
    /// # Errors
    ///
    /// Failures are reported after every spawned thread has been joined:
    ///
    /// * `NoProducers` - empty producer list with a non-zero quota
    /// * `Spawn` - the OS refused a thread
    /// * `ProducerPanicked` / `AnalyzerPanicked` - a thread terminated abnormally
    /// * `ProducersExhausted` - every producer exited before the quota was met
    /// * `Finalize` - the analyzer's `finalize` returned an error
    pub fn run<P, A>(&self, producers: Vec<P>, analyzer: &mut A) -> Result<RunSummary, PipelineError>
    where
        P: EventProducer,
        A: EventAnalyzer,
    {
        let producer_count = producers.len();
        if producer_count == 0 && self.required > 0 {
            return Err(PipelineError::NoProducers {
                required: self.required,
            });
        }

        info!(
            required = self.required,
            producers = producer_count,
            "Starting event pipeline"
        );
        let started = Instant::now();
        let state = RunState {
            live_producers: AtomicUsize::new(producer_count),
            halted: AtomicBool::new(false),
            produced: (0..producer_count).map(|_| AtomicUsize::new(0)).collect(),
        };

        let failure = thread::scope(|scope| {
            let state = &state;
            let mut failure: Option<PipelineError> = None;

            let mut producer_handles = Vec::with_capacity(producer_count);
            for (index, producer) in producers.into_iter().enumerate() {
                let spawned = thread::Builder::new()
                    .name(format!("producer-{}", index))
                    .spawn_scoped(scope, move || self.produce_loop(index, producer, state));
                match spawned {
                    Ok(handle) => producer_handles.push(handle),
                    Err(source) => {
                        // Producers never started are not live
                        state
                            .live_producers
                            .fetch_sub(producer_count - producer_handles.len(), Ordering::SeqCst);
                        state.halted.store(true, Ordering::SeqCst);
                        failure = Some(PipelineError::Spawn {
                            thread: format!("producer-{}", index),
                            source,
                        });
                        break;
                    }
                }
            }

            let analyzer_handle = if failure.is_none() {
                let spawned = thread::Builder::new()
                    .name("analyzer".to_string())
                    .spawn_scoped(scope, move || self.consume_loop(analyzer, state));
                match spawned {
                    Ok(handle) => Some(handle),
                    Err(source) => {
                        state.halted.store(true, Ordering::SeqCst);
                        failure = Some(PipelineError::Spawn {
                            thread: "analyzer".to_string(),
                            source,
                        });
                        None
                    }
                }
            } else {
                None
            };

            for (index, handle) in producer_handles.into_iter().enumerate() {
                if let Err(payload) = handle.join() {
                    let message = panic_message(&*payload);
                    warn!(producer = index, %message, "Producer terminated abnormally");
                    failure.get_or_insert(PipelineError::ProducerPanicked { index, message });
                }
            }

            if let Some(handle) = analyzer_handle {
                match handle.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        failure.get_or_insert(e);
                    }
                    Err(payload) => {
                        let message = panic_message(&*payload);
                        warn!(%message, "Analyzer terminated abnormally");
                        failure.get_or_insert(PipelineError::AnalyzerPanicked { message });
                    }
                }
            }

            failure
        });

        if let Some(error) = failure {
            return Err(error);
        }

        let summary = RunSummary {
            required: self.required,
            generated: self.generated_count(),
            analyzed: self.analyzed_count(),
            per_producer: state
                .produced
                .into_iter()
                .map(AtomicUsize::into_inner)
                .collect(),
            leftover: self.queued(),
            elapsed: started.elapsed(),
        };
        info!(
            generated = summary.generated,
            analyzed = summary.analyzed,
            leftover = summary.leftover,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Event pipeline finished"
        );
        Ok(summary)
    }

    fn produce_loop<P: EventProducer>(&self, index: usize, mut producer: P, state: &RunState) {
        let _exit = ProducerExit(&state.live_producers);
        debug!(producer = index, "Producer started");

        while !state.halted.load(Ordering::Relaxed) && self.generated_count() < self.required {
            self.add(producer.produce());
            state.produced[index].fetch_add(1, Ordering::Relaxed);
        }

        debug!(
            producer = index,
            produced = state.produced[index].load(Ordering::Relaxed),
            "Producer finished"
        );
    }

    fn consume_loop<A: EventAnalyzer>(
        &self,
        analyzer: &mut A,
        state: &RunState,
    ) -> Result<(), PipelineError> {
        let _exit = AnalyzerExit(&state.halted);
        debug!("Analyzer started");

        while self.analyzed_count() < self.required {
            // Read before polling: once this is zero every add is visible
            let producers_gone = state.live_producers.load(Ordering::SeqCst) == 0;

            match self.get() {
                Some(event) => {
                    analyzer.analyze(&event);
                    self.log_progress();
                }
                None if producers_gone => {
                    return Err(PipelineError::ProducersExhausted {
                        analyzed: self.analyzed_count(),
                        required: self.required,
                    });
                }
                None => self.wait_for_events(),
            }
        }

        analyzer
            .finalize()
            .map_err(|e| PipelineError::Finalize(Box::new(e)))?;
        debug!("Analyzer finalized");
        Ok(())
    }

    fn wait_for_events(&self) {
        match self.config.poll {
            PollStrategy::Spin => std::hint::spin_loop(),
            PollStrategy::Yield => thread::yield_now(),
            PollStrategy::Sleep { micros } => thread::sleep(Duration::from_micros(micros)),
        }
    }

    fn log_progress(&self) {
        let interval = self.config.progress_interval;
        if interval == 0 {
            return;
        }
        let analyzed = self.analyzed_count();
        if analyzed % interval == 0 {
            info!(
                analyzed,
                required = self.required,
                generated = self.generated_count(),
                "Analysis progress"
            );
        }
    }

    /// The queue holds plain events, so a poisoned lock leaves it usable.
    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
