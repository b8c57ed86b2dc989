//! `anchorcrm-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod audit;
pub mod error;
pub mod id;
pub mod record;

pub use audit::AuditStamp;
pub use error::{DomainError, DomainResult, FieldError, ValidationErrors};
pub use id::{EntityId, UserId};
pub use record::{Record, RecordMeta, Reference, default_of, sort_by_ordinal};
