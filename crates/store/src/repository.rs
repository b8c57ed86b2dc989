//! Repository contracts consumed by handlers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use anchorcrm_core::{DomainResult, EntityId, Record, Reference, UserId};

/// Persistence gateway for one entity family.
///
/// All operations are async; handlers suspend only at these boundaries.
/// Cancellation is drop-based: each mutation is a single atomic step, so a
/// dropped future never leaves a partial write.
#[async_trait]
pub trait Repository<E: Record>: Send + Sync {
    /// Direct lookup. Returns soft-deleted records too; callers inspect
    /// `is_active` when the distinction matters.
    async fn get_by_id(&self, id: EntityId) -> DomainResult<Option<E>>;

    /// Active records only, ordered by id (stable across calls).
    async fn get_all(&self) -> DomainResult<Vec<E>>;

    /// Whether an active record with this id exists.
    async fn exists(&self, id: EntityId) -> DomainResult<bool>;

    /// Insert a new record. Fails with `Conflict` on a duplicate id.
    async fn add(&self, record: E) -> DomainResult<E>;

    /// Replace an existing record. The caller supplies the version it last
    /// read; a stale version fails with `Conflict` and writes nothing.
    async fn update(&self, record: E, expected_version: u64) -> DomainResult<E>;

    /// Soft delete: mark inactive and refresh the audit stamp. An absent or
    /// already-deleted id is a no-op returning `Ok(false)`.
    async fn delete(&self, id: EntityId, actor: UserId, at: DateTime<Utc>) -> DomainResult<bool>;

    /// How many active records point at the given reference id (via
    /// `Record::reference_ids`).
    async fn count_usages_of(&self, reference_id: EntityId) -> DomainResult<u64>;
}

/// Extra operations for reference (lookup) families.
#[async_trait]
pub trait ReferenceRepository<E: Reference>: Repository<E> {
    /// Active records ascending by `(ordinal, id)`.
    async fn get_by_ordinal(&self) -> DomainResult<Vec<E>>;

    /// The active record minimal under `(ordinal, id)`, if any.
    async fn get_default(&self) -> DomainResult<Option<E>>;
}

/// Derived-count capability handed to reference handlers: how many business
/// records use a given lookup value. Kept as its own seam so a family whose
/// usages live in another store can still resolve counts.
#[async_trait]
pub trait UsageCount: Send + Sync {
    async fn count(&self, reference_id: EntityId) -> DomainResult<u64>;
}

/// Adapts any repository into a `UsageCount` source.
pub struct UsageCounter<E: Record>(pub Arc<dyn Repository<E>>);

#[async_trait]
impl<E: Record> UsageCount for UsageCounter<E> {
    async fn count(&self, reference_id: EntityId) -> DomainResult<u64> {
        self.0.count_usages_of(reference_id).await
    }
}
