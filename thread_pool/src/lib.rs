//! # Thread Pool
//!
//! A fixed set of worker threads fed through a [`message_queue`] queue.
//!
//! ## Philosophy
//!
//! - **Queues, not shared state**: Workers and submitters only meet at the
//!   input and output queues
//! - **Explicit backpressure**: A full pool hands the task back instead of
//!   blocking the submitter
//! - **One stop signal**: Cancelling the input queue releases every worker
//! - **Nothing is lost on shutdown**: Tasks that never ran are cancelled and
//!   returned to the caller
//!
//! ## Example
//!
//! ```
//! use thread_pool::{PoolConfig, TaskFn, ThreadPool};
//!
//! let mut pool = ThreadPool::new(PoolConfig::new(2, 16)).unwrap();
//! pool.push(TaskFn::new(|| {})).unwrap();
//!
//! let task = pool.pop(true).unwrap().into_inner();
//! assert_eq!(task.runs(), 1);
//! pool.join();
//! ```

pub mod config;
pub mod pool;
pub mod task;

pub use config::PoolConfig;
pub use pool::{PoolError, ThreadPool};
pub use task::{Task, TaskFn};
