//! KEDA ScaledObject store client
//!
//! The reconciler never talks to the API server directly; it goes through
//! `KedaClientTrait`, whose calls return a tagged `StoreOutcome` and honour
//! a per-reconciliation `CallContext`.
//!
//! # Example
//!
//! ```no_run
//! use keda_client::{CallContext, KedaClient, KedaClientTrait, StoreOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KedaClient::new(kube::Client::try_default().await?);
//! let ctx = CallContext::background();
//!
//! match client.get(&ctx, "default", "my-app").await {
//!     StoreOutcome::Success(so) => println!("found {:?}", so.metadata.name),
//!     StoreOutcome::NotFound => println!("no ScaledObject"),
//!     StoreOutcome::Conflict => unreachable!(),
//!     StoreOutcome::Failure(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod outcome;
#[path = "trait.rs"]
pub mod keda_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KedaClient;
pub use context::CallContext;
pub use error::KedaError;
pub use keda_trait::KedaClientTrait;
pub use outcome::StoreOutcome;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockKedaClient, Operation, RecordedCall};
