//! GenForge front door: JSON parsing and response formatting over the runtime.

pub mod routes;
pub mod state;
