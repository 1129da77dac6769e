//! GenForge Backend: uniform, deadline-bounded access to generative services.
//!
//! Every remote service implements [`GenerativeBackend`]. [`invoke`] runs one
//! attempt under a deadline and folds the result into a [`BackendOutcome`];
//! it never returns an error and never retries. Wire formats stay inside the
//! adapters in [`providers`].

pub mod client;
pub mod extract;
pub mod providers;
pub mod registry;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod types;

pub use client::{invoke, invoke_all, GenerativeBackend};
pub use registry::{BackendHealth, BackendRegistry, HealthStatus};
pub use types::{BackendOutcome, CallError, Expected, RawPayload};
