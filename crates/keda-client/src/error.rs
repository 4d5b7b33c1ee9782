//! KEDA client errors

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the ScaledObject store
#[derive(Debug, Error)]
pub enum KedaError {
    /// Kubernetes API request/response error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Store rejected the request
    #[error("ScaledObject API error: {0}")]
    Api(String),

    /// Object is missing a metadata field needed to address it
    #[error("ScaledObject is missing metadata.{0}")]
    MissingMetadata(&'static str),

    /// Caller cancelled the reconciliation
    #[error("Request cancelled")]
    Cancelled,

    /// Reconciliation deadline passed before the store answered
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}
