//! GenForge Store: durable, collision-free artifact persistence on SQLite.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::ArtifactStore;
pub use types::*;
