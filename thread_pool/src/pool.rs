//! Worker pool built on two message queues
//!
//! Submitted tasks go into a bounded input queue. Each worker blocks on
//! that queue, executes what it receives, and pushes the executed task onto
//! an unbounded output queue where the submitter collects it. Cancelling the
//! input queue is the only stop signal the workers need.
//!
//! A task that panics does not take its worker down: the panic is caught,
//! counted, and the task still goes to the output queue so that every
//! submitted task is collected exactly once.

use crate::config::PoolConfig;
use crate::task::Task;
use core_types::PoolId;
use message_queue::{ConfigError, PopError, Popped, Rejected, TypedMessageQueue};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while starting a pool
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A worker thread could not be spawned
    #[error("failed to spawn worker thread")]
    Spawn(#[source] io::Error),
}

/// Fixed-size pool of worker threads executing tasks of type `T`
///
/// Use `Box<dyn Task>` as `T` to mix task types in one pool.
pub struct ThreadPool<T: Task> {
    id: PoolId,
    input: TypedMessageQueue<T>,
    output: TypedMessageQueue<T>,
    workers: Vec<JoinHandle<()>>,
    num_threads: usize,
    panicked: Arc<AtomicUsize>,
}

impl<T: Task> ThreadPool<T> {
    /// Starts a pool with the given configuration
    ///
    /// If a worker fails to spawn, the workers already running are stopped
    /// and joined before the error is returned.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let id = PoolId::new();
        let mut pool = Self {
            id,
            input: TypedMessageQueue::new(config.effective_task_capacity()),
            output: TypedMessageQueue::unbounded(),
            workers: Vec::with_capacity(config.num_threads),
            num_threads: config.num_threads,
            panicked: Arc::new(AtomicUsize::new(0)),
        };

        for index in 0..config.num_threads {
            let input = pool.input.clone();
            let output = pool.output.clone();
            let panicked = Arc::clone(&pool.panicked);

            let spawned = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, index))
                .spawn(move || run_worker(id, index, input, output, panicked));

            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(err) => {
                    pool.join();
                    return Err(PoolError::Spawn(err));
                }
            }
        }

        debug!(
            pool = %id,
            threads = config.num_threads,
            task_capacity = config.effective_task_capacity(),
            "thread pool started"
        );

        Ok(pool)
    }

    /// Returns the pool ID
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Returns the number of worker threads the pool was started with
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Submits a task for execution
    ///
    /// Returns the number of pending tasks after the insertion. A full or
    /// cancelled pool hands the task back.
    pub fn push(&self, task: T) -> Result<usize, Rejected<T>> {
        self.input.push(task)
    }

    /// Collects an executed task
    ///
    /// After [`join`](Self::join) this also yields the tasks that never ran;
    /// those have had [`Task::cancel`] called. A blocking pop waits for as
    /// long as it takes for a task to finish, so only block while tasks are
    /// known to be outstanding.
    pub fn pop(&self, blocking: bool) -> Result<Popped<T>, PopError> {
        self.output.pop(blocking)
    }

    /// Stops accepting tasks and releases every idle worker
    ///
    /// Workers finish the task they are running, then exit.
    pub fn cancel(&self) {
        self.input.cancel();
    }

    /// Checks if the pool has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.input.is_cancelled()
    }

    /// Returns the number of tasks waiting for a worker (snapshot)
    pub fn pending(&self) -> usize {
        self.input.size()
    }

    /// Returns the number of tasks waiting to be collected (snapshot)
    pub fn completed(&self) -> usize {
        self.output.size()
    }

    /// Returns how many task executions have panicked so far
    pub fn panicked_tasks(&self) -> usize {
        self.panicked.load(Ordering::SeqCst)
    }

    /// Cancels the pool and waits for every worker to exit
    ///
    /// Tasks still pending afterwards are cancelled and moved to the output
    /// queue so the caller can collect them. Returns how many were moved.
    /// Calling it again returns zero.
    pub fn join(&mut self) -> usize {
        self.cancel();

        let mut panicked = 0usize;
        for (index, handle) in self.workers.drain(..).enumerate() {
            if handle.join().is_err() {
                panicked += 1;
                warn!(pool = %self.id, worker = index, "worker thread panicked");
            }
        }

        let mut drained = 0usize;
        while let Ok(popped) = self.input.try_pop() {
            let mut task = popped.into_inner();
            task.cancel();
            match self.output.push(task) {
                Ok(_) => drained += 1,
                Err(rejected) => {
                    warn!(pool = %self.id, reason = %rejected.reason, "pending task dropped");
                }
            }
        }

        if drained > 0 || panicked > 0 {
            debug!(pool = %self.id, drained, panicked, "thread pool joined");
        }

        drained
    }
}

impl<T: Task> Drop for ThreadPool<T> {
    fn drop(&mut self) {
        self.join();
    }
}

fn run_worker<T: Task>(
    pool: PoolId,
    index: usize,
    input: TypedMessageQueue<T>,
    output: TypedMessageQueue<T>,
    panicked: Arc<AtomicUsize>,
) {
    debug!(pool = %pool, worker = index, "worker started");

    let mut executed = 0u64;
    while let Ok(popped) = input.pop_blocking() {
        let mut task = popped.into_inner();
        if panic::catch_unwind(AssertUnwindSafe(|| task.execute())).is_err() {
            panicked.fetch_add(1, Ordering::SeqCst);
            warn!(pool = %pool, worker = index, "task panicked during execute");
        }
        executed += 1;

        if let Err(rejected) = output.push(task) {
            warn!(pool = %pool, worker = index, reason = %rejected.reason, "executed task dropped");
        }
    }

    debug!(pool = %pool, worker = index, executed, "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskFn;
    use std::sync::Barrier;

    struct Counted {
        value: u32,
        executed: bool,
        cancelled: bool,
    }

    impl Counted {
        fn new(value: u32) -> Self {
            Self {
                value,
                executed: false,
                cancelled: false,
            }
        }
    }

    impl Task for Counted {
        fn execute(&mut self) {
            self.executed = true;
            self.value *= 2;
        }

        fn cancel(&mut self) {
            self.cancelled = true;
        }
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = ThreadPool::<Counted>::new(PoolConfig::new(0, 4));
        assert!(matches!(result, Err(PoolError::Config(_))));
    }

    #[test]
    fn test_executes_and_returns_tasks() {
        let pool = ThreadPool::new(PoolConfig::new(2, 8)).unwrap();
        assert_eq!(pool.num_threads(), 2);

        for value in 1..=5 {
            pool.push(Counted::new(value)).unwrap();
        }

        let mut values = Vec::new();
        for _ in 0..5 {
            let task = pool.pop(true).unwrap().into_inner();
            assert!(task.executed);
            assert!(!task.cancelled);
            values.push(task.value);
        }
        values.sort_unstable();
        assert_eq!(values, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_panicking_task_keeps_worker_alive() {
        let runs = Arc::new(AtomicUsize::new(0));
        let pool = ThreadPool::<Box<dyn Task>>::new(PoolConfig::new(1, 4)).unwrap();

        pool.push(Box::new(TaskFn::new(|| panic!("task failure"))))
            .unwrap();
        let counter = Arc::clone(&runs);
        pool.push(Box::new(TaskFn::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })))
        .unwrap();

        // Both tasks come back, including the one that panicked.
        pool.pop(true).unwrap();
        pool.pop(true).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(pool.panicked_tasks(), 1);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_spawn_error_display_leaves_source_to_chain() {
        use std::error::Error;

        let err = PoolError::Spawn(io::Error::new(io::ErrorKind::Other, "no threads left"));
        assert_eq!(err.to_string(), "failed to spawn worker thread");
        assert_eq!(err.source().unwrap().to_string(), "no threads left");
    }

    #[test]
    fn test_push_after_cancel_rejected() {
        let pool = ThreadPool::new(PoolConfig::new(1, 4)).unwrap();
        pool.cancel();
        assert!(pool.is_cancelled());

        let rejected = pool.push(Counted::new(1)).unwrap_err();
        assert!(rejected.is_cancelled());
        assert_eq!(rejected.into_inner().value, 1);
    }

    #[test]
    fn test_full_pool_hands_task_back() {
        let gate = Arc::new(Barrier::new(2));
        let mut pool = ThreadPool::<Box<dyn Task>>::new(PoolConfig::new(1, 1)).unwrap();

        // Occupy the only worker until the gate opens.
        let blocker = Arc::clone(&gate);
        pool.push(Box::new(TaskFn::new(move || {
            blocker.wait();
        })))
        .unwrap();
        while pool.pending() > 0 {
            thread::yield_now();
        }

        pool.push(Box::new(TaskFn::new(|| {}))).unwrap();
        let rejected = pool.push(Box::new(TaskFn::new(|| {}))).unwrap_err();
        assert!(rejected.is_full());

        gate.wait();
        pool.join();
        assert!(pool.pop(false).is_ok());
    }

    #[test]
    fn test_join_cancels_pending_tasks() {
        let gate = Arc::new(Barrier::new(2));
        let cancelled = Arc::new(AtomicUsize::new(0));

        struct Pending(Arc<AtomicUsize>);

        impl Task for Pending {
            fn execute(&mut self) {}

            fn cancel(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        struct Gate(Arc<Barrier>);

        impl Task for Gate {
            fn execute(&mut self) {
                self.0.wait();
            }
        }

        let mut pool = ThreadPool::<Box<dyn Task>>::new(PoolConfig::new(1, 16)).unwrap();
        pool.push(Box::new(Gate(Arc::clone(&gate)))).unwrap();
        while pool.pending() > 0 {
            thread::yield_now();
        }
        for _ in 0..3 {
            pool.push(Box::new(Pending(Arc::clone(&cancelled)))).unwrap();
        }

        // Release the worker only once join has cancelled the input queue.
        let opener = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                thread::sleep(std::time::Duration::from_millis(50));
                gate.wait();
            })
        };

        let drained = pool.join();
        opener.join().unwrap();

        assert_eq!(drained, 3);
        assert_eq!(cancelled.load(Ordering::SeqCst), 3);
        assert_eq!(pool.completed(), 4);
        assert_eq!(pool.join(), 0);
    }
}
