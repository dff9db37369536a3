//! Unique identifiers for queue entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from a UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a message queue
    ///
    /// Assigned once at construction and shared by every handle that
    /// points at the same queue.
    QueueId,
    "Queue"
);

uuid_id!(
    /// Unique identifier for a message
    ///
    /// Clones of a message handle keep the same identifier.
    MessageId,
    "Msg"
);

uuid_id!(
    /// Unique identifier for a worker pool
    PoolId,
    "Pool"
);
