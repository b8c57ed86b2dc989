//! One handler set per family, generic over the family marker.
//!
//! The same executor serves every lookup family; per-family behavior is
//! configuration (the marker, the store, an optional usage-count source).

use std::sync::Arc;

use async_trait::async_trait;

use anchorcrm_core::{DomainError, DomainResult, EntityId};
use anchorcrm_pipeline::{Dispatcher, Handle, ProjectFrom, project_all};
use anchorcrm_store::{ReferenceRepository, UsageCount};

use crate::dto::{ReferenceDetails, ReferenceListItem, ReferenceSummary};
use crate::family::Family;
use crate::item::ReferenceItem;
use crate::requests::{
    CreateReference, DeleteReference, GetDefaultReference, GetReferenceById, ListReferences,
    UpdateReference,
};

/// Handlers for every request in one reference family.
pub struct ReferenceHandlers<F: Family> {
    store: Arc<dyn ReferenceRepository<ReferenceItem<F>>>,
    usages: Option<Arc<dyn UsageCount>>,
}

impl<F: Family> ReferenceHandlers<F> {
    pub fn new(store: Arc<dyn ReferenceRepository<ReferenceItem<F>>>) -> Self {
        Self { store, usages: None }
    }

    /// Wire a usage-count source. Families without one report
    /// `usage_count: None` in details (explicitly deferred, never zero).
    pub fn with_usage_source(mut self, usages: Arc<dyn UsageCount>) -> Self {
        self.usages = Some(usages);
        self
    }

    /// Register all six request types with the dispatcher.
    pub fn register(self: &Arc<Self>, dispatcher: &mut Dispatcher) {
        dispatcher.register::<GetReferenceById<F>>(GetReferenceById::<F>::rules(), self.clone());
        dispatcher.register::<ListReferences<F>>(ListReferences::<F>::rules(), self.clone());
        dispatcher
            .register::<GetDefaultReference<F>>(GetDefaultReference::<F>::rules(), self.clone());
        dispatcher.register::<CreateReference<F>>(CreateReference::<F>::rules(), self.clone());
        dispatcher.register::<UpdateReference<F>>(UpdateReference::<F>::rules(), self.clone());
        dispatcher.register::<DeleteReference<F>>(DeleteReference::<F>::rules(), self.clone());
    }

    async fn usage_of(&self, id: EntityId) -> DomainResult<Option<u64>> {
        match &self.usages {
            Some(counter) => Ok(Some(counter.count(id).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<F: Family> Handle<GetReferenceById<F>> for ReferenceHandlers<F> {
    async fn handle(&self, request: GetReferenceById<F>) -> DomainResult<ReferenceDetails> {
        let item = self
            .store
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(F::KIND, request.id))?;

        let usage = self.usage_of(request.id).await?;
        Ok(ReferenceDetails::project(&item).with_usage(usage))
    }
}

#[async_trait]
impl<F: Family> Handle<ListReferences<F>> for ReferenceHandlers<F> {
    async fn handle(&self, _request: ListReferences<F>) -> DomainResult<Vec<ReferenceListItem>> {
        let items = self.store.get_by_ordinal().await?;
        Ok(project_all(&items))
    }
}

#[async_trait]
impl<F: Family> Handle<GetDefaultReference<F>> for ReferenceHandlers<F> {
    async fn handle(&self, _request: GetDefaultReference<F>) -> DomainResult<ReferenceSummary> {
        let item = self
            .store
            .get_default()
            .await?
            .ok_or_else(|| DomainError::no_default(F::KIND))?;
        Ok(ReferenceSummary::project(&item))
    }
}

#[async_trait]
impl<F: Family> Handle<CreateReference<F>> for ReferenceHandlers<F> {
    async fn handle(&self, request: CreateReference<F>) -> DomainResult<ReferenceDetails> {
        let item = ReferenceItem::<F>::new(
            EntityId::new(),
            request.name,
            request.description,
            request.ordinal,
            request.actor,
            request.occurred_at,
        );

        let stored = self.store.add(item).await?;
        tracing::info!(kind = F::KIND, id = %stored.meta.id, "reference item created");
        Ok(ReferenceDetails::project(&stored))
    }
}

#[async_trait]
impl<F: Family> Handle<UpdateReference<F>> for ReferenceHandlers<F> {
    async fn handle(&self, request: UpdateReference<F>) -> DomainResult<ReferenceDetails> {
        let mut item = self
            .store
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(F::KIND, request.id))?;

        item.name = request.name;
        item.description = request.description;
        item.ordinal = request.ordinal;
        item.meta.audit.touch(request.actor, request.occurred_at);

        let stored = self.store.update(item, request.expected_version).await?;
        tracing::info!(kind = F::KIND, id = %stored.meta.id, version = stored.meta.version, "reference item updated");
        Ok(ReferenceDetails::project(&stored))
    }
}

#[async_trait]
impl<F: Family> Handle<DeleteReference<F>> for ReferenceHandlers<F> {
    async fn handle(&self, request: DeleteReference<F>) -> DomainResult<bool> {
        let deleted = self
            .store
            .delete(request.id, request.actor, request.occurred_at)
            .await?;
        if deleted {
            tracing::info!(kind = F::KIND, id = %request.id, "reference item soft-deleted");
        } else {
            tracing::debug!(kind = F::KIND, id = %request.id, "delete was a no-op");
        }
        Ok(deleted)
    }
}
