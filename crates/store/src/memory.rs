//! In-memory store for tests and dev wiring.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use anchorcrm_core::{
    DomainError, DomainResult, EntityId, Record, Reference, UserId, sort_by_ordinal,
};

use crate::repository::{ReferenceRepository, Repository};

/// Generic in-memory repository backed by `RwLock<HashMap>`.
///
/// Critical sections never span an await point, so the std lock is safe
/// under an async runtime.
#[derive(Debug)]
pub struct InMemoryStore<E> {
    inner: RwLock<HashMap<EntityId, E>>,
}

impl<E> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<E> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> DomainError {
    tracing::error!("store lock poisoned");
    DomainError::unexpected("store lock poisoned")
}

#[async_trait]
impl<E: Record> Repository<E> for InMemoryStore<E> {
    async fn get_by_id(&self, id: EntityId) -> DomainResult<Option<E>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn get_all(&self) -> DomainResult<Vec<E>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut records: Vec<E> = map.values().filter(|r| r.is_active()).cloned().collect();
        records.sort_by_key(Record::id);
        Ok(records)
    }

    async fn exists(&self, id: EntityId) -> DomainResult<bool> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).is_some_and(Record::is_active))
    }

    async fn add(&self, mut record: E) -> DomainResult<E> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let id = record.id();
        if map.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "{} already exists: {id}",
                E::KIND
            )));
        }

        // Every record starts its lifecycle active, at version 1.
        record.meta_mut().active = true;
        record.meta_mut().version = 1;
        map.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, mut record: E, expected_version: u64) -> DomainResult<E> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let id = record.id();
        let existing = map
            .get(&id)
            .ok_or_else(|| DomainError::not_found(E::KIND, id))?;

        if !existing.is_active() {
            return Err(DomainError::conflict(format!(
                "{} is deleted and cannot be updated: {id}",
                E::KIND
            )));
        }
        if existing.version() != expected_version {
            return Err(DomainError::conflict(format!(
                "stale write for {} {id}: expected version {expected_version}, found {}",
                E::KIND,
                existing.version()
            )));
        }

        record.meta_mut().active = true;
        record.meta_mut().version = expected_version + 1;
        map.insert(id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: EntityId, actor: UserId, at: DateTime<Utc>) -> DomainResult<bool> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let Some(record) = map.get_mut(&id) else {
            return Ok(false);
        };
        if !record.is_active() {
            return Ok(false);
        }

        record.meta_mut().deactivate(actor, at);
        record.meta_mut().version += 1;
        Ok(true)
    }

    async fn count_usages_of(&self, reference_id: EntityId) -> DomainResult<u64> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let count = map
            .values()
            .filter(|r| r.is_active() && r.reference_ids().contains(&reference_id))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl<E: Reference> ReferenceRepository<E> for InMemoryStore<E> {
    async fn get_by_ordinal(&self) -> DomainResult<Vec<E>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut records: Vec<E> = map.values().filter(|r| r.is_active()).cloned().collect();
        sort_by_ordinal(&mut records);
        Ok(records)
    }

    async fn get_default(&self) -> DomainResult<Option<E>> {
        let records = self.get_by_ordinal().await?;
        Ok(records.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorcrm_core::RecordMeta;

    #[derive(Debug, Clone)]
    struct Tag {
        meta: RecordMeta,
        name: String,
        ordinal: i32,
        group_id: Option<EntityId>,
    }

    impl Record for Tag {
        const KIND: &'static str = "tag";

        fn meta(&self) -> &RecordMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RecordMeta {
            &mut self.meta
        }

        fn reference_ids(&self) -> Vec<EntityId> {
            self.group_id.into_iter().collect()
        }
    }

    impl Reference for Tag {
        fn ordinal(&self) -> i32 {
            self.ordinal
        }

        fn label(&self) -> &str {
            &self.name
        }
    }

    fn tag(name: &str, ordinal: i32) -> Tag {
        Tag {
            meta: RecordMeta::new(EntityId::new(), UserId::new(), Utc::now()),
            name: name.to_string(),
            ordinal,
            group_id: None,
        }
    }

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let store = InMemoryStore::new();
        let added = store.add(tag("urgent", 1)).await.unwrap();

        let fetched = store.get_by_id(added.id()).await.unwrap().unwrap();
        assert_eq!(fetched.name, "urgent");
        assert_eq!(fetched.version(), 1);
        assert!(fetched.is_active());
    }

    #[tokio::test]
    async fn add_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        let added = store.add(tag("urgent", 1)).await.unwrap();

        let mut dup = tag("copy", 2);
        dup.meta.id = added.id();
        let err = store.add(dup).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_bumps_version_and_rejects_stale_writes() {
        let store = InMemoryStore::new();
        let mut current = store.add(tag("draft", 1)).await.unwrap();

        current.name = "published".to_string();
        let updated = store.update(current.clone(), 1).await.unwrap();
        assert_eq!(updated.version(), 2);

        // A writer still holding version 1 must be rejected.
        current.name = "stale".to_string();
        let err = store.update(current, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let fetched = store.get_by_id(updated.id()).await.unwrap().unwrap();
        assert_eq!(fetched.name, "published");
    }

    #[tokio::test]
    async fn update_of_absent_record_is_not_found() {
        let store: InMemoryStore<Tag> = InMemoryStore::new();
        let err = store.update(tag("ghost", 1), 1).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_soft_deletes_and_keeps_direct_lookup() {
        let store = InMemoryStore::new();
        let added = store.add(tag("old", 1)).await.unwrap();
        let deleter = UserId::new();
        let at = Utc::now();

        assert!(store.delete(added.id(), deleter, at).await.unwrap());

        // Gone from listings, exists, and ordinal queries.
        assert!(store.get_all().await.unwrap().is_empty());
        assert!(store.get_by_ordinal().await.unwrap().is_empty());
        assert!(!store.exists(added.id()).await.unwrap());

        // Still addressable directly, with refreshed audit.
        let fetched = store.get_by_id(added.id()).await.unwrap().unwrap();
        assert!(!fetched.is_active());
        assert_eq!(fetched.meta.audit.modified_by, deleter);
        assert_eq!(fetched.meta.audit.modified_at, at);
        assert_eq!(fetched.version(), 2);
    }

    #[tokio::test]
    async fn delete_is_a_no_op_on_absent_or_deleted_ids() {
        let store = InMemoryStore::new();
        let actor = UserId::new();
        assert!(!store.delete(EntityId::new(), actor, Utc::now()).await.unwrap());

        let added = store.add(tag("once", 1)).await.unwrap();
        assert!(store.delete(added.id(), actor, Utc::now()).await.unwrap());
        assert!(!store.delete(added.id(), actor, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn deleted_records_cannot_be_updated() {
        let store = InMemoryStore::new();
        let added = store.add(tag("done", 1)).await.unwrap();
        store.delete(added.id(), UserId::new(), Utc::now()).await.unwrap();

        let err = store.update(added, 2).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn ordinal_listing_sorts_ascending_and_skips_deleted() {
        let store = InMemoryStore::new();
        let c = store.add(tag("c", 3)).await.unwrap();
        store.add(tag("a", 1)).await.unwrap();
        store.add(tag("b", 2)).await.unwrap();
        store.delete(c.id(), UserId::new(), Utc::now()).await.unwrap();

        let names: Vec<String> = store
            .get_by_ordinal()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[tokio::test]
    async fn default_is_the_lowest_active_ordinal() {
        let store = InMemoryStore::new();
        store.add(tag("third", 3)).await.unwrap();
        let first = store.add(tag("first", 1)).await.unwrap();
        store.add(tag("second", 2)).await.unwrap();

        let default = store.get_default().await.unwrap().unwrap();
        assert_eq!(default.id(), first.id());

        store.delete(first.id(), UserId::new(), Utc::now()).await.unwrap();
        let default = store.get_default().await.unwrap().unwrap();
        assert_eq!(default.name, "second");
    }

    #[tokio::test]
    async fn usage_count_sees_active_referencing_records_only() {
        let store = InMemoryStore::new();
        let group = EntityId::new();

        let mut a = tag("a", 1);
        a.group_id = Some(group);
        let mut b = tag("b", 2);
        b.group_id = Some(group);
        let c = tag("c", 3);

        let a = store.add(a).await.unwrap();
        store.add(b).await.unwrap();
        store.add(c).await.unwrap();
        assert_eq!(store.count_usages_of(group).await.unwrap(), 2);

        store.delete(a.id(), UserId::new(), Utc::now()).await.unwrap();
        assert_eq!(store.count_usages_of(group).await.unwrap(), 1);
    }
}
