//! Pool configuration

use message_queue::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Construction parameters for a [`ThreadPool`](crate::ThreadPool)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Number of worker threads (at least one)
    pub num_threads: usize,
    /// Maximum number of pending tasks; `None` means unbounded
    pub task_capacity: Option<usize>,
    /// Worker threads are named `<prefix>-<index>`
    pub thread_name_prefix: String,
}

impl PoolConfig {
    /// Default number of worker threads
    pub const DEFAULT_THREADS: usize = 4;

    /// Default worker thread name prefix
    pub const DEFAULT_PREFIX: &'static str = "pool-worker";

    /// Creates a config with `num_threads` workers and a bounded task queue
    pub fn new(num_threads: usize, task_capacity: usize) -> Self {
        Self {
            num_threads,
            task_capacity: Some(task_capacity),
            ..Self::default()
        }
    }

    /// Sets the worker thread name prefix
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Returns the capacity the task queue will enforce
    pub fn effective_task_capacity(&self) -> usize {
        self.task_capacity.unwrap_or(usize::MAX)
    }

    /// Checks that a pool can be built from this config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_threads == 0 {
            return Err(ConfigError::Invalid(
                "num_threads must be at least 1".to_string(),
            ));
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(ConfigError::Invalid(
                "thread_name_prefix must not contain NUL".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: Self::DEFAULT_THREADS,
            task_capacity: None,
            thread_name_prefix: Self::DEFAULT_PREFIX.to_string(),
        }
    }
}
