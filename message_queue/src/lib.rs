//! # Message Queue
//!
//! This crate provides the in-process hand-off primitive used between
//! threads: a bounded, blocking FIFO of type-erased messages.
//!
//! ## Philosophy
//!
//! - **Bounded, not blocking on push**: A full queue rejects the message and
//!   hands it back; backpressure is the producer's decision
//! - **Blocking on pop**: Consumers park until a message arrives or the
//!   queue is cancelled
//! - **One-shot cancellation**: Cancelling releases every waiter and is
//!   never undone
//! - **Typed at the edges**: The engine stores opaque [`Message`] handles;
//!   [`TypedMessageQueue`] converts to and from concrete values
//!
//! ## Architecture
//!
//! - [`Message`]: shared-ownership handle to a payload of any type
//! - [`MessageQueue`]: the mutex + condition variable monitor
//! - [`TypedMessageQueue`]: generic wrapper over a shared `MessageQueue`
//! - [`QueueConfig`]: JSON-loadable construction parameters
//!
//! ## Example
//!
//! ```
//! use message_queue::{PopError, TypedMessageQueue};
//!
//! let queue = TypedMessageQueue::<String>::new(2);
//! assert_eq!(queue.push("a".to_string()).unwrap(), 1);
//! assert_eq!(queue.push("b".to_string()).unwrap(), 2);
//! assert!(queue.push("c".to_string()).unwrap_err().is_full());
//!
//! let popped = queue.pop(false).unwrap();
//! assert_eq!((popped.value.as_str(), popped.len_before), ("a", 2));
//!
//! queue.cancel();
//! assert_eq!(queue.pop(true).unwrap_err(), PopError::Cancelled);
//! ```

pub mod config;
pub mod error;
pub mod message;
pub mod queue;
pub mod typed;

pub use config::QueueConfig;
pub use error::{ConfigError, PopError, PushError, Rejected};
pub use message::Message;
pub use queue::{MessageQueue, Popped};
pub use typed::TypedMessageQueue;
