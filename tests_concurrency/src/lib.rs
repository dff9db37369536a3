//! Concurrency Test Utilities
//!
//! Shared helpers for the multi-threaded integration tests.
//!
//! ## Test Philosophy
//!
//! - **Real threads**: Scenarios run on OS threads, not simulated schedules
//! - **Bounded waits**: Every blocked thread is released by a push or a
//!   cancel, so a hung test means a lost wake-up
//! - **Counted lifetimes**: Payloads count their own drops to prove nothing
//!   leaks through the queues

use message_queue::TypedMessageQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread::{self, JoinHandle};

/// Installs a test log subscriber once per test binary
///
/// Honors `RUST_LOG`; output is captured by the test harness.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Spins until `consumers` threads are parked in a blocking pop on `queue`
pub fn wait_until_parked<M: Send + Sync + 'static>(
    queue: &TypedMessageQueue<M>,
    consumers: usize,
) {
    while queue.waiting() < consumers {
        thread::yield_now();
    }
}

/// Spawns a worker that answers every message from `input` on `output`
///
/// The worker retries a full output queue until it has room and exits when
/// `input` is cancelled. Returns the number of messages it answered.
pub fn spawn_echo_worker(
    id: usize,
    input: TypedMessageQueue<String>,
    output: TypedMessageQueue<String>,
) -> JoinHandle<usize> {
    thread::spawn(move || {
        let mut answered = 0;
        while let Ok(popped) = input.pop_blocking() {
            let mut response = format!("Response to '{}' from '{}'", popped.value, id);
            loop {
                match output.push(response) {
                    Ok(_) => break,
                    Err(rejected) => {
                        response = rejected.into_inner();
                        thread::yield_now();
                    }
                }
            }
            answered += 1;
        }
        answered
    })
}

/// Live/total counters shared by [`Tracked`] payloads
#[derive(Debug, Default)]
pub struct LiveCounter {
    created: AtomicUsize,
    dropped: AtomicUsize,
}

impl LiveCounter {
    /// Creates a shared counter
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of payloads created so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of payloads still alive
    pub fn live(&self) -> usize {
        let dropped = self.dropped.load(Ordering::SeqCst);
        self.created().saturating_sub(dropped)
    }
}

/// Payload that registers its creation and drop with a [`LiveCounter`]
#[derive(Debug)]
pub struct Tracked {
    /// Caller-chosen sequence number
    pub seq: usize,
    counter: Arc<LiveCounter>,
}

impl Tracked {
    /// Creates a payload and counts it as live
    pub fn new(seq: usize, counter: &Arc<LiveCounter>) -> Self {
        counter.created.fetch_add(1, Ordering::SeqCst);
        Self {
            seq,
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counter.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_count_read_during_churn() {
        let counter = LiveCounter::new();
        let churn = {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for seq in 0..10_000 {
                    drop(Tracked::new(seq, &counter));
                }
            })
        };

        while !churn.is_finished() {
            assert!(counter.live() <= counter.created());
        }
        churn.join().unwrap();

        assert_eq!(counter.created(), 10_000);
        assert_eq!(counter.live(), 0);
    }
}
