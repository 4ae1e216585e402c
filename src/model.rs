//! Core data model.
//!
//! The run context that comes in, the repository identities that flow
//! through resolution, and the resolved edit that goes out.

mod context;
mod edit;
mod repo;

pub use context::RunContext;
pub use edit::ResolvedEdit;
pub use repo::RepoId;
