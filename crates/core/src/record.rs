//! Record traits: identity, soft deletion, versioning, ordinal ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AuditStamp;
use crate::id::{EntityId, UserId};

/// Shared bookkeeping embedded in every domain record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub id: EntityId,
    /// `false` means soft-deleted: excluded from list/default/count queries
    /// but still addressable by direct id lookup.
    pub active: bool,
    /// Optimistic concurrency token; bumped by the store on every mutation.
    pub version: u64,
    pub audit: AuditStamp,
}

impl RecordMeta {
    pub fn new(id: EntityId, actor: UserId, at: DateTime<Utc>) -> Self {
        Self {
            id,
            active: true,
            version: 1,
            audit: AuditStamp::new(actor, at),
        }
    }

    /// Soft delete. There is no transition back to active.
    pub fn deactivate(&mut self, actor: UserId, at: DateTime<Utc>) {
        self.active = false;
        self.audit.touch(actor, at);
    }
}

/// Minimal interface every domain record exposes to the generic store and
/// pipeline code.
pub trait Record: Clone + Send + Sync + 'static {
    /// Human-readable kind used in errors and logs ("person", "invoice", ...).
    const KIND: &'static str;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn id(&self) -> EntityId {
        self.meta().id
    }

    fn is_active(&self) -> bool {
        self.meta().active
    }

    fn version(&self) -> u64 {
        self.meta().version
    }

    /// Reference-entity ids this record points at. Drives usage counting;
    /// lookup records themselves point at nothing.
    fn reference_ids(&self) -> Vec<EntityId> {
        Vec::new()
    }
}

/// Lookup records: a label plus an ordinal display position.
pub trait Reference: Record {
    fn ordinal(&self) -> i32;
    fn label(&self) -> &str;
}

/// Sort ascending by `(ordinal, id)`. Ids are UUIDv7 (time-ordered), so ties
/// resolve by creation order and repeated calls see the same sequence.
pub fn sort_by_ordinal<R: Reference>(items: &mut [R]) {
    items.sort_by_key(|r| (r.ordinal(), r.id()));
}

/// The active item minimal under `(ordinal, id)`, if any.
pub fn default_of<R: Reference>(items: &[R]) -> Option<&R> {
    items
        .iter()
        .filter(|r| r.is_active())
        .min_by_key(|r| (r.ordinal(), r.id()))
}
