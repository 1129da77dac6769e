//! GenForge Core: configuration, error types, request and provenance model.

pub mod config;
pub mod error;
pub mod provenance;
pub mod request;

pub use config::{BackendDescriptor, BackendKind, BackendProtocol, DataPaths, ForgeConfig};
pub use error::{Error, Result};
pub use provenance::{ProducedBy, StageSource};
pub use request::{ArtifactKind, GenerationRequest};
