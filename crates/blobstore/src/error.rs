// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for blob store access

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The key does not exist. Callers treat this as an empty record set.
    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Object store error on {key}: {source}")]
    ObjectStore {
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("{op} of {key} timed out after {limit:?}")]
    Timeout {
        op: &'static str,
        key: String,
        limit: Duration,
    },

    #[error("Staging I/O error for {key}: {source}")]
    Staging {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid storage key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The queued task running a write went away before reporting a result
    #[error("Queued write for {key} was aborted")]
    WriteAborted { key: String },
}

impl StoreError {
    pub(crate) fn from_object_store(key: &str, source: object_store::Error) -> Self {
        match source {
            object_store::Error::NotFound { .. } => StoreError::NotFound {
                key: key.to_string(),
            },
            source => StoreError::ObjectStore {
                key: key.to_string(),
                source,
            },
        }
    }

    pub(crate) fn staging(key: &str, source: std::io::Error) -> Self {
        StoreError::Staging {
            key: key.to_string(),
            source,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Whether another attempt at the same operation might succeed.
    ///
    /// NotFound is an answer, not a failure, and is never retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::NotFound { .. }
            | StoreError::InvalidKey { .. }
            | StoreError::Configuration(_)
            | StoreError::WriteAborted { .. } => false,
            StoreError::Timeout { .. } | StoreError::Staging { .. } => true,
            StoreError::ObjectStore { source, .. } => !matches!(
                source,
                object_store::Error::NotFound { .. }
                    | object_store::Error::InvalidPath { .. }
                    | object_store::Error::NotSupported { .. }
                    | object_store::Error::NotImplemented
                    | object_store::Error::AlreadyExists { .. }
                    | object_store::Error::Precondition { .. }
                    | object_store::Error::NotModified { .. }
                    | object_store::Error::UnknownConfigurationKey { .. }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct_from_transport_errors() {
        let not_found = StoreError::from_object_store(
            "Assets/VpcInventory.parquet",
            object_store::Error::NotFound {
                path: "Assets/VpcInventory.parquet".to_string(),
                source: "missing".into(),
            },
        );
        assert!(not_found.is_not_found());
        assert!(!not_found.is_retryable());

        let transport = StoreError::from_object_store(
            "Assets/VpcInventory.parquet",
            object_store::Error::Generic {
                store: "test",
                source: "connection reset".into(),
            },
        );
        assert!(!transport.is_not_found());
        assert!(transport.is_retryable());
    }

    #[test]
    fn test_timeouts_retry_and_bad_keys_do_not() {
        let timeout = StoreError::Timeout {
            op: "get",
            key: "k".to_string(),
            limit: Duration::from_secs(1),
        };
        assert!(timeout.is_retryable());

        let bad = StoreError::InvalidKey {
            key: "/abs".to_string(),
            reason: "leading slash".to_string(),
        };
        assert!(!bad.is_retryable());
    }
}
