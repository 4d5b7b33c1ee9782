//! HTTP Scaled Object CRD Definitions
//!
//! Kubernetes Custom Resource types shared by the HTTP scaled object
//! controller: the user-facing `HTTPScaledObject` and the KEDA
//! `ScaledObject` it is translated into.

pub mod http_scaled_object;
pub mod scaled_object;

pub use http_scaled_object::*;
pub use scaled_object::*;
