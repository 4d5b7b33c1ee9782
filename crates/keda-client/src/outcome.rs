//! Tagged result of a single store call
//!
//! Store calls distinguish the two "expected" answers (the object already
//! exists, the object does not exist) from real failures, so callers can
//! `match` on them exhaustively instead of inspecting status codes.

use crate::error::KedaError;

/// HTTP status returned by the API server when an object already exists
const STATUS_CONFLICT: u16 = 409;
/// HTTP status returned by the API server when an object does not exist
const STATUS_NOT_FOUND: u16 = 404;
/// Status reason distinguishing "already exists" from optimistic-lock conflicts
const REASON_ALREADY_EXISTS: &str = "AlreadyExists";

/// Outcome of a create/get/patch/delete call
#[derive(Debug)]
pub enum StoreOutcome<T> {
    /// The call succeeded
    Success(T),
    /// Create found an object with the same name
    Conflict,
    /// Get/delete found no object with that name
    NotFound,
    /// Anything else, including cancellation and deadline expiry
    Failure(KedaError),
}

/// A 409 is only "already exists" when the reason says so; a 409 with reason
/// `Conflict` is a stale resourceVersion.
fn is_already_exists(code: u16, reason: &str) -> bool {
    code == STATUS_CONFLICT && reason == REASON_ALREADY_EXISTS
}

fn is_not_found(code: u16) -> bool {
    code == STATUS_NOT_FOUND
}

impl<T> StoreOutcome<T> {
    /// Classifies a kube API result.
    pub fn from_kube(result: Result<T, kube::Error>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(kube::Error::Api(ae)) if is_already_exists(ae.code, &ae.reason) => Self::Conflict,
            Err(kube::Error::Api(ae)) if is_not_found(ae.code) => Self::NotFound,
            Err(e) => Self::Failure(KedaError::Kube(e)),
        }
    }

    /// Maps the success value, keeping every other tag.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> StoreOutcome<U> {
        match self {
            Self::Success(value) => StoreOutcome::Success(f(value)),
            Self::Conflict => StoreOutcome::Conflict,
            Self::NotFound => StoreOutcome::NotFound,
            Self::Failure(e) => StoreOutcome::Failure(e),
        }
    }

    /// Collapses the outcome into a `Result`, treating only `Success` as `Ok`.
    ///
    /// `Conflict` and `NotFound` become `KedaError::Api` so that a caller that
    /// did not expect them still gets a descriptive error.
    pub fn into_result(self) -> Result<T, KedaError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Conflict => Err(KedaError::Api("object already exists".to_string())),
            Self::NotFound => Err(KedaError::Api("object not found".to_string())),
            Self::Failure(e) => Err(e),
        }
    }
}
