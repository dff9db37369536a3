//! Bounded blocking message queue
//!
//! The queue is a monitor: one mutex guards both the messages and the
//! cancellation flag, and one condition variable paired with that mutex
//! parks consumers in blocking [`MessageQueue::pop`]. Checking the queue and
//! going to sleep happen under the same lock, so a push or cancel can never
//! slip in between and be missed.
//!
//! Pushes never block. A full queue rejects the message and hands it back,
//! leaving the backpressure policy to the producer.

use crate::config::QueueConfig;
use crate::error::{PopError, PushError, Rejected};
use crate::message::Message;
use core_types::QueueId;
use std::any::{self, Any};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// A value removed from a queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popped<T> {
    /// The removed value
    pub value: T,
    /// Number of messages the queue held before the removal (at least one)
    pub len_before: usize,
}

impl<T> Popped<T> {
    /// Maps the popped value, keeping the observed length
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Popped<U> {
        Popped {
            value: f(self.value),
            len_before: self.len_before,
        }
    }

    /// Returns the popped value
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// State guarded by the queue mutex
#[derive(Default)]
struct QueueState {
    messages: VecDeque<Message>,
    cancelled: bool,
    // Consumers currently parked on the condition variable.
    waiting: usize,
}

/// Thread-safe bounded FIFO of [`Message`] handles
///
/// Share it between threads through an `Arc`. Any number of producers and
/// consumers may use it concurrently.
///
/// Cancel the queue before dropping the last reference while threads are
/// still blocked in [`pop`](Self::pop); otherwise they stay parked forever.
pub struct MessageQueue {
    id: QueueId,
    name: Option<String>,
    capacity: usize,
    state: Mutex<QueueState>,
    available: Condvar,
}

impl MessageQueue {
    /// Creates a queue holding at most `max_capacity` messages
    pub fn new(max_capacity: usize) -> Self {
        Self::build(None, max_capacity)
    }

    /// Creates a queue whose capacity is `usize::MAX`
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Creates a queue from its configuration
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::build(config.name.clone(), config.effective_capacity())
    }

    fn build(name: Option<String>, capacity: usize) -> Self {
        let queue = Self {
            id: QueueId::new(),
            name,
            capacity,
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
        };

        debug!(
            queue = %queue.id,
            name = queue.name.as_deref().unwrap_or(""),
            capacity,
            "message queue created"
        );

        queue
    }

    /// Returns the queue ID
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Returns the configured name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the maximum number of messages the queue accepts
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Every mutation leaves the state consistent, so a panic elsewhere
    // while the lock was held does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a message at the tail
    ///
    /// Returns the number of queued messages after the insertion. Wakes one
    /// blocked consumer when the queue goes from empty to non-empty.
    ///
    /// Fails without touching the queue when it is full or cancelled; the
    /// message comes back inside the [`Rejected`].
    pub fn push(&self, message: Message) -> Result<usize, Rejected<Message>> {
        let mut state = self.lock();

        if state.cancelled {
            trace!(queue = %self.id, message = %message.id(), "push rejected: cancelled");
            return Err(Rejected::new(PushError::Cancelled, message));
        }

        let len = state.messages.len();
        if len >= self.capacity {
            trace!(queue = %self.id, message = %message.id(), len, "push rejected: full");
            return Err(Rejected::new(PushError::Full, message));
        }

        state.messages.push_back(message);
        if len == 0 {
            self.available.notify_one();
        }

        Ok(len + 1)
    }

    /// Removes the message at the head
    ///
    /// Non-blocking: returns [`PopError::Empty`] right away when there is
    /// nothing to take. It keeps working after cancellation so the leftover
    /// contents can be drained.
    ///
    /// Blocking: parks the calling thread until a message arrives or the
    /// queue is cancelled. Once cancelled, it returns
    /// [`PopError::Cancelled`] immediately, even if messages remain.
    pub fn pop(&self, blocking: bool) -> Result<Popped<Message>, PopError> {
        let mut state = self.lock();

        if !blocking {
            let len_before = state.messages.len();
            return state
                .messages
                .pop_front()
                .map(|value| Popped { value, len_before })
                .ok_or(PopError::Empty);
        }

        loop {
            if state.cancelled {
                return Err(PopError::Cancelled);
            }

            let len_before = state.messages.len();
            if let Some(value) = state.messages.pop_front() {
                // Pushes only signal on empty -> non-empty, so pass the
                // wake-up on while messages remain.
                if len_before > 1 {
                    self.available.notify_one();
                }
                return Ok(Popped { value, len_before });
            }

            state.waiting += 1;
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.waiting -= 1;
        }
    }

    /// Non-blocking [`pop`](Self::pop)
    pub fn try_pop(&self) -> Result<Popped<Message>, PopError> {
        self.pop(false)
    }

    /// Blocking [`pop`](Self::pop)
    pub fn pop_blocking(&self) -> Result<Popped<Message>, PopError> {
        self.pop(true)
    }

    /// Pops a message and recovers its payload as `T`
    ///
    /// For queues that carry a single payload type but are used untyped.
    ///
    /// # Panics
    ///
    /// Panics if the popped payload is not a `T`.
    pub fn pop_as<T: Any + Send + Sync>(&self, blocking: bool) -> Result<Popped<Arc<T>>, PopError> {
        let popped = self.pop(blocking)?;

        Ok(popped.map(|message| match message.downcast::<T>() {
            Ok(payload) => payload,
            Err(message) => payload_type_mismatch(self.id, any::type_name::<T>(), &message),
        }))
    }

    /// Cancels the queue for good, releasing every blocked consumer
    ///
    /// Queued messages stay where they are. Does not wait for the woken
    /// threads to run. Calling it again has no further effect.
    pub fn cancel(&self) {
        let mut state = self.lock();

        if !state.cancelled {
            state.cancelled = true;
            debug!(queue = %self.id, pending = state.messages.len(), "message queue cancelled");
        }

        self.available.notify_all();
    }

    /// Checks if the queue has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Returns the number of queued messages
    ///
    /// A snapshot: concurrent pushes and pops may change it right away.
    pub fn size(&self) -> usize {
        self.lock().messages.len()
    }

    /// Checks if the queue is empty (snapshot)
    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }

    /// Returns the number of consumers parked in a blocking pop (snapshot)
    pub fn waiting(&self) -> usize {
        self.lock().waiting
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cold]
#[track_caller]
pub(crate) fn payload_type_mismatch(queue: QueueId, expected: &str, message: &Message) -> ! {
    panic!(
        "{} carried a {} payload in {} where {} was expected",
        queue,
        message.type_name(),
        message.id(),
        expected
    );
}
