//! # Core Types
//!
//! Identifiers shared by the queue and pool crates.
//!
//! Every queue, message and pool carries a random UUID so that log lines
//! emitted from different threads can be correlated back to the instance
//! that produced them.
//!
//! ## Key Types
//!
//! - [`QueueId`]: Identifies one message queue instance
//! - [`MessageId`]: Identifies one boxed message
//! - [`PoolId`]: Identifies one worker pool

pub mod ids;

pub use ids::{MessageId, PoolId, QueueId};
