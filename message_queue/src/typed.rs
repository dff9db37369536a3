//! Typed front-end over the untyped queue
//!
//! [`TypedMessageQueue<M>`] lets producers push plain `M` values and
//! consumers pop plain `M` values. Boxing into a [`Message`] and recovering
//! the concrete type happen at this boundary; the concurrent engine
//! underneath is the shared, non-generic [`MessageQueue`].

use crate::config::QueueConfig;
use crate::error::{PopError, Rejected};
use crate::message::Message;
use crate::queue::{payload_type_mismatch, MessageQueue, Popped};
use core_types::QueueId;
use std::any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A message queue that carries values of a single type `M`
///
/// Cloning the handle shares the same underlying queue.
pub struct TypedMessageQueue<M> {
    inner: Arc<MessageQueue>,
    _payload: PhantomData<fn(M) -> M>,
}

impl<M: Send + Sync + 'static> TypedMessageQueue<M> {
    /// Creates a queue holding at most `max_capacity` values
    pub fn new(max_capacity: usize) -> Self {
        Self::with_queue(Arc::new(MessageQueue::new(max_capacity)))
    }

    /// Creates a queue whose capacity is `usize::MAX`
    pub fn unbounded() -> Self {
        Self::with_queue(Arc::new(MessageQueue::unbounded()))
    }

    /// Creates a queue from its configuration
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::with_queue(Arc::new(MessageQueue::from_config(config)))
    }

    /// Attaches a typed front-end to an existing queue
    ///
    /// Every message popped through this handle must have been pushed as an
    /// `M`; anything else makes [`pop`](Self::pop) panic.
    pub fn with_queue(inner: Arc<MessageQueue>) -> Self {
        Self {
            inner,
            _payload: PhantomData,
        }
    }

    /// Returns the underlying untyped queue
    pub fn untyped(&self) -> &Arc<MessageQueue> {
        &self.inner
    }

    /// Pushes a value
    ///
    /// Same contract as [`MessageQueue::push`]; a rejected value is handed
    /// back as the original `M`.
    pub fn push(&self, value: M) -> Result<usize, Rejected<M>> {
        self.inner
            .push(Message::new(value))
            .map_err(|rejected| rejected.map(|message| self.recover(message)))
    }

    /// Pops a value
    ///
    /// Same contract as [`MessageQueue::pop`].
    ///
    /// # Panics
    ///
    /// Panics if the popped message does not hold an `M`, or if another
    /// handle to its payload is still alive. The two cases panic with
    /// different messages. Neither can happen when every producer goes
    /// through a `TypedMessageQueue<M>`.
    pub fn pop(&self, blocking: bool) -> Result<Popped<M>, PopError> {
        let popped = self.inner.pop(blocking)?;
        Ok(popped.map(|message| self.recover(message)))
    }

    /// Non-blocking [`pop`](Self::pop)
    pub fn try_pop(&self) -> Result<Popped<M>, PopError> {
        self.pop(false)
    }

    /// Blocking [`pop`](Self::pop)
    pub fn pop_blocking(&self) -> Result<Popped<M>, PopError> {
        self.pop(true)
    }

    /// See [`MessageQueue::cancel`]
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// See [`MessageQueue::is_cancelled`]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// See [`MessageQueue::size`]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// See [`MessageQueue::waiting`]
    pub fn waiting(&self) -> usize {
        self.inner.waiting()
    }

    /// See [`MessageQueue::is_empty`]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// See [`MessageQueue::capacity`]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn recover(&self, message: Message) -> M {
        if !message.is::<M>() {
            payload_type_mismatch(self.inner.id(), any::type_name::<M>(), &message);
        }

        match message.into_inner::<M>() {
            Ok(value) => value,
            Err(message) => payload_still_shared(self.inner.id(), &message),
        }
    }
}

#[cold]
#[track_caller]
fn payload_still_shared(queue: QueueId, message: &Message) -> ! {
    panic!(
        "{} in {} is still shared by {} other handle(s); a typed pop needs the only handle",
        message.id(),
        queue,
        message.handle_count() - 1
    );
}

impl<M> Clone for TypedMessageQueue<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _payload: PhantomData,
        }
    }
}

impl<M: Send + Sync + 'static> Default for TypedMessageQueue<M> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<M> fmt::Debug for TypedMessageQueue<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedMessageQueue")
            .field("payload", &any::type_name::<M>())
            .field("queue", &self.inner)
            .finish()
    }
}
