//! Request contract (query/command abstraction).
//!
//! A request is **plain data**: an identifier, filter fields, pagination
//! parameters, or mutation fields. It declares the result type it produces
//! and carries no behavior. Queries and commands differ by intent, not by
//! mechanism.
//!
//! ## Design Constraints
//!
//! Requests must be:
//! - **Send + Sync**: requests cross thread boundaries (async handlers)
//! - **'static**: requests don't contain borrowed data (must own all data)

/// A read or write intention, routed to exactly one handler.
pub trait Request: core::fmt::Debug + Send + Sync + 'static {
    /// The result this request produces: a DTO, a collection of DTOs, or an
    /// acknowledgement.
    type Output: Send + 'static;
}

/// Read-only request: never mutates state, idempotent, side-effect-free
/// aside from logging.
pub trait Query: Request {}

/// Mutating request: creates, updates, or soft-deletes exactly one record
/// (or a parent plus its owned lines). Not idempotent in general.
pub trait Command: Request {}
