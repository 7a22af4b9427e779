//! Immutable outcome of one execute or undo attempt

use std::{
    collections::BTreeMap,
    fmt::{self, Display}
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    error::{CommandError, ErrorSource},
    value::{FromValue, Value}
};

/// Extra facts reported alongside a result payload
pub type Metadata = BTreeMap<String, Value>;

/// Snapshot of a single execution or undo outcome
///
/// Never mutated after construction. `error` is only populated when `success` is false.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    success:           bool,
    message:           String,
    data:              Option<Value>,
    executed_at:       DateTime<Utc>,
    execution_time_ms: u64,
    metadata:          Option<Metadata>,
    #[serde(skip)]
    error:             Option<ErrorSource>
}

impl CommandResult {
    pub fn success(message: impl Into<String>, data: impl Into<Option<Value>>, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: data.into(),
            executed_at: Utc::now(),
            execution_time_ms,
            metadata: None,
            error: None
        }
    }

    pub fn success_with_metadata(
        message: impl Into<String>,
        data: impl Into<Option<Value>>,
        execution_time_ms: u64,
        metadata: Metadata
    ) -> Self {
        Self { metadata: Some(metadata), ..Self::success(message, data, execution_time_ms) }
    }

    pub fn failure(message: impl Into<String>, error: ErrorSource, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            executed_at: Utc::now(),
            execution_time_ms,
            metadata: None,
            error: Some(error)
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_error(&self) -> bool {
        !self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn executed_at(&self) -> DateTime<Utc> {
        self.executed_at
    }

    pub fn execution_time_ms(&self) -> u64 {
        self.execution_time_ms
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorSource> {
        self.error.as_ref()
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    /// Typed view of the payload; `Ok(None)` when there is none
    pub fn data_as<T: FromValue>(&self) -> Result<Option<T>, CommandError> {
        decode_entry("data", self.data.as_ref())
    }

    /// Typed view of one metadata entry; `Ok(None)` when absent
    pub fn metadata_as<T: FromValue>(&self, key: &str) -> Result<Option<T>, CommandError> {
        decode_entry(&format!("metadata '{}'", key), self.metadata_value(key))
    }
}

fn decode_entry<T: FromValue>(what: &str, value: Option<&Value>) -> Result<Option<T>, CommandError> {
    match value {
        None => Ok(None),
        Some(value) => T::from_value(value)
            .map(Some)
            .ok_or_else(|| CommandError::TypeMismatch { key: what.to_string(), expected: T::TYPE_NAME })
    }
}

impl Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommandResult{{success={}, message='{}', executedAt={}, executionTimeMs={}}}",
            self.success,
            self.message,
            self.executed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.execution_time_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_success_result_exposes_typed_views() {
        let mut metadata = Metadata::new();
        metadata.insert("generatedCount".to_string(), Value::Int(300));
        metadata.insert("amountRange".to_string(), Value::from("1000.00 - 50000.00"));

        let result = CommandResult::success_with_metadata("generated", Value::Int(300), 12, metadata);

        assert!(result.is_success());
        assert!(!result.is_error());
        assert!(result.error().is_none());
        assert_eq!(result.data_as::<i64>().unwrap(), Some(300));
        assert_eq!(result.metadata_as::<i64>("generatedCount").unwrap(), Some(300));
        assert_eq!(result.metadata_as::<i64>("absent").unwrap(), None);
    }

    #[test]
    fn test_typed_view_fails_fast_on_mismatch() {
        let result = CommandResult::success("ok", Value::from("three hundred"), 0);

        let error = result.data_as::<i64>().unwrap_err();
        assert!(matches!(error, CommandError::TypeMismatch { expected: "int", .. }));
        assert_eq!(result.data_as::<String>().unwrap(), Some("three hundred".to_string()));
    }

    #[test]
    fn test_failure_result_carries_error() {
        let cause: ErrorSource = Arc::new(std::io::Error::other("store offline"));
        let result = CommandResult::failure("could not generate", cause, 5);

        assert!(result.is_error());
        assert!(result.data().is_none());
        assert_eq!(result.error().map(|e| e.to_string()), Some("store offline".to_string()));
        assert!(result.to_string().starts_with("CommandResult{success=false"));
    }
}
