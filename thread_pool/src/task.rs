//! Units of work carried by the pool

use std::fmt;

/// A unit of work
///
/// Tasks travel through message queues, so they must be safe to share
/// between threads. Synchronizing a task's own internals once a worker
/// holds it is the task's responsibility.
pub trait Task: Send + Sync + 'static {
    /// Runs the task
    fn execute(&mut self);

    /// Notifies the task that it will never run
    ///
    /// Called on tasks still pending when their pool shuts down.
    fn cancel(&mut self) {}
}

impl<T: Task + ?Sized> Task for Box<T> {
    fn execute(&mut self) {
        (**self).execute();
    }

    fn cancel(&mut self) {
        (**self).cancel();
    }
}

/// Adapts a closure into a [`Task`]
pub struct TaskFn<F> {
    func: F,
    runs: u32,
}

impl<F> TaskFn<F>
where
    F: FnMut() + Send + Sync + 'static,
{
    /// Wraps a closure
    pub fn new(func: F) -> Self {
        Self { func, runs: 0 }
    }

    /// Returns how many times the closure has run
    pub fn runs(&self) -> u32 {
        self.runs
    }
}

impl<F> Task for TaskFn<F>
where
    F: FnMut() + Send + Sync + 'static,
{
    fn execute(&mut self) {
        (self.func)();
        self.runs += 1;
    }
}

impl<F> fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").field("runs", &self.runs).finish()
    }
}
