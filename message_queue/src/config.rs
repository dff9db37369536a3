//! Queue configuration
//!
//! Queues are configured from JSON. Every field is optional; an empty
//! object yields an unbounded, unnamed queue.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Construction parameters for a [`MessageQueue`](crate::MessageQueue)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Human-readable name, only used in log fields
    pub name: Option<String>,
    /// Maximum number of queued messages; `None` means unbounded
    pub max_capacity: Option<usize>,
}

impl QueueConfig {
    /// Creates a config for a queue bounded at `max_capacity`
    pub fn bounded(max_capacity: usize) -> Self {
        Self {
            name: None,
            max_capacity: Some(max_capacity),
        }
    }

    /// Sets the queue name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the capacity the queue will enforce
    pub fn effective_capacity(&self) -> usize {
        self.max_capacity.unwrap_or(usize::MAX)
    }

    /// Parses a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_is_unbounded() {
        let config = QueueConfig::from_json("{}").unwrap();
        assert_eq!(config, QueueConfig::default());
        assert_eq!(config.effective_capacity(), usize::MAX);
    }

    #[test]
    fn test_bounded_config() {
        let config = QueueConfig::from_json(r#"{"name": "jobs", "max_capacity": 16}"#).unwrap();
        assert_eq!(config, QueueConfig::bounded(16).with_name("jobs"));
        assert_eq!(config.effective_capacity(), 16);
    }

    #[test]
    fn test_zero_capacity_is_allowed() {
        let config = QueueConfig::from_json(r#"{"max_capacity": 0}"#).unwrap();
        assert_eq!(config.effective_capacity(), 0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = QueueConfig::from_json(r#"{"capacity": 4}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_capacity": 3}}"#).unwrap();

        let config = QueueConfig::load(file.path()).unwrap();
        assert_eq!(config.effective_capacity(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = QueueConfig::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
