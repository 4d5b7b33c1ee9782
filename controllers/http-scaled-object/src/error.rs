//! Controller-specific error types.
//!
//! Store errors come from `keda-client`; everything else the controller can
//! fail on at runtime lives here.

use keda_client::KedaError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the HTTPScaledObject controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// ScaledObject store error
    #[error("KEDA error: {0}")]
    Keda(KedaError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Probe server I/O error
    #[error("Probe server error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

impl From<KedaError> for ControllerError {
    fn from(e: KedaError) -> Self {
        match e {
            KedaError::Kube(e) => ControllerError::Kube(e),
            other => ControllerError::Keda(other),
        }
    }
}
