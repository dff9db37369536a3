//! Type-erased message handles
//!
//! A [`Message`] is the unit the queue stores. It owns its payload through
//! shared ownership, so a handle that was popped by a consumer stays valid
//! after the queue itself is gone. The payload's concrete type is erased at
//! construction and recovered later with [`Message::downcast`] or
//! [`Message::into_inner`].

use core_types::MessageId;
use std::any::{self, Any};
use std::fmt;
use std::sync::Arc;

/// Opaque, reference-counted handle to a payload of any type
///
/// Cloning a message clones the handle, not the payload. The payload is
/// dropped when the last handle goes away, wherever that handle lives.
#[derive(Clone)]
pub struct Message {
    id: MessageId,
    type_name: &'static str,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Message {
    /// Boxes a value into a new message
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared payload without copying it
    pub fn from_arc<T: Any + Send + Sync>(payload: Arc<T>) -> Self {
        Self {
            id: MessageId::new(),
            type_name: any::type_name::<T>(),
            payload,
        }
    }

    /// Returns the message ID (shared by all clones of this handle)
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the name of the payload's concrete type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Checks if the payload is of type `T`
    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        (*self.payload).is::<T>()
    }

    /// Borrows the payload as `T`, if that is its type
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        (*self.payload).downcast_ref::<T>()
    }

    /// Recovers the shared payload as `T`
    ///
    /// The returned `Arc` points at the same allocation the message held.
    /// On a type mismatch the message is handed back unchanged.
    pub fn downcast<T: Any + Send + Sync>(self) -> Result<Arc<T>, Self> {
        let Self {
            id,
            type_name,
            payload,
        } = self;

        payload.downcast::<T>().map_err(|payload| Self {
            id,
            type_name,
            payload,
        })
    }

    /// Recovers the owned payload as `T`
    ///
    /// Succeeds only when the type matches and this is the last handle to
    /// the payload. Otherwise the message is handed back unchanged.
    pub fn into_inner<T: Any + Send + Sync>(self) -> Result<T, Self> {
        let id = self.id;
        let payload = self.downcast::<T>()?;

        Arc::try_unwrap(payload).map_err(|shared| Self {
            id,
            type_name: any::type_name::<T>(),
            payload: shared,
        })
    }

    /// Returns the number of live handles to this payload
    ///
    /// A snapshot: other threads may clone or drop handles concurrently.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.payload)
    }

    /// Checks if two handles refer to the same payload
    pub fn ptr_eq(a: &Message, b: &Message) -> bool {
        Arc::as_ptr(&a.payload) as *const () == Arc::as_ptr(&b.payload) as *const ()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}
