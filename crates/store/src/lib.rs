//! `anchorcrm-store` — persistence gateway contracts and the in-memory store.
//!
//! The repository is dumb storage: lookup, listing, ordering, default
//! selection, soft delete, and usage counting per entity family. Lifecycle
//! policy (not-found signaling, default selection, audit refreshes) lives in
//! the handlers, not here.

pub mod memory;
pub mod repository;

pub use memory::InMemoryStore;
pub use repository::{Repository, ReferenceRepository, UsageCount, UsageCounter};
