//! The reference record itself: label, description, ordinal position.

use core::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use anchorcrm_core::{EntityId, Record, RecordMeta, Reference, UserId};

use crate::family::Family;

/// One member of a lookup family. Carries no business data beyond a label,
/// an optional description, and its ordinal display position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem<F: Family> {
    pub meta: RecordMeta,
    pub name: String,
    pub description: Option<String>,
    pub ordinal: i32,
    #[serde(skip)]
    _family: PhantomData<F>,
}

impl<F: Family> ReferenceItem<F> {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        description: Option<String>,
        ordinal: i32,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            meta: RecordMeta::new(id, actor, at),
            name: name.into(),
            description,
            ordinal,
            _family: PhantomData,
        }
    }
}

impl<F: Family> Record for ReferenceItem<F> {
    const KIND: &'static str = F::KIND;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl<F: Family> Reference for ReferenceItem<F> {
    fn ordinal(&self) -> i32 {
        self.ordinal
    }

    fn label(&self) -> &str {
        &self.name
    }
}
