//! Requests for the reference-entity lifecycle, with their rule sets.
//!
//! Shared rules (payload shape) are written once and merged into the
//! command-specific sets, so the update validator applies every create rule
//! without duplicating it.

use core::marker::PhantomData;

use chrono::{DateTime, Utc};

use anchorcrm_core::{EntityId, UserId, ValidationErrors};
use anchorcrm_pipeline::{Command, Query, Request, RuleSet};
use anchorcrm_pipeline::validate::{optional_text, required_id, required_text};

use crate::dto::{ReferenceDetails, ReferenceListItem, ReferenceSummary};
use crate::family::Family;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Mutation payload common to create and update.
trait Payload {
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn ordinal(&self) -> i32;
    fn actor(&self) -> UserId;
}

/// Rules every mutation payload obeys; merged into both command rule sets.
fn payload_rules<R: Payload + Send + Sync + 'static>() -> RuleSet<R> {
    RuleSet::new()
        .rule(required_text("name", MAX_NAME_LEN, |r: &R| r.name()))
        .rule(optional_text("description", MAX_DESCRIPTION_LEN, |r: &R| {
            r.description()
        }))
        .rule(|r: &R, errors: &mut ValidationErrors| {
            if r.ordinal() < 0 {
                errors.push("ordinal", "range", "ordinal must not be negative");
            }
        })
        .rule(|r: &R, errors: &mut ValidationErrors| {
            if r.actor().is_nil() {
                errors.push("actor", "required", "actor must be a non-nil identifier");
            }
        })
}

/// Fetch one item by id, including soft-deleted ones.
#[derive(Debug, Clone)]
pub struct GetReferenceById<F: Family> {
    pub id: EntityId,
    _family: PhantomData<F>,
}

impl<F: Family> GetReferenceById<F> {
    pub fn new(id: EntityId) -> Self {
        Self { id, _family: PhantomData }
    }

    pub fn rules() -> RuleSet<Self> {
        RuleSet::new().rule(required_id("id", |r: &Self| r.id))
    }
}

impl<F: Family> Request for GetReferenceById<F> {
    type Output = ReferenceDetails;
}

impl<F: Family> Query for GetReferenceById<F> {}

/// Enumerate active items in ordinal order.
#[derive(Debug, Clone)]
pub struct ListReferences<F: Family> {
    _family: PhantomData<F>,
}

impl<F: Family> ListReferences<F> {
    pub fn new() -> Self {
        Self { _family: PhantomData }
    }

    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
    }
}

impl<F: Family> Default for ListReferences<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> Request for ListReferences<F> {
    type Output = Vec<ReferenceListItem>;
}

impl<F: Family> Query for ListReferences<F> {}

/// The family's default: the active item with the lowest ordinal position.
#[derive(Debug, Clone)]
pub struct GetDefaultReference<F: Family> {
    _family: PhantomData<F>,
}

impl<F: Family> GetDefaultReference<F> {
    pub fn new() -> Self {
        Self { _family: PhantomData }
    }

    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
    }
}

impl<F: Family> Default for GetDefaultReference<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> Request for GetDefaultReference<F> {
    type Output = ReferenceSummary;
}

impl<F: Family> Query for GetDefaultReference<F> {}

/// Create a new item in the family.
#[derive(Debug, Clone)]
pub struct CreateReference<F: Family> {
    pub name: String,
    pub description: Option<String>,
    pub ordinal: i32,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
    _family: PhantomData<F>,
}

impl<F: Family> CreateReference<F> {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        ordinal: i32,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            ordinal,
            actor,
            occurred_at,
            _family: PhantomData,
        }
    }

    pub fn rules() -> RuleSet<Self> {
        payload_rules()
    }
}

impl<F: Family> Payload for CreateReference<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn ordinal(&self) -> i32 {
        self.ordinal
    }

    fn actor(&self) -> UserId {
        self.actor
    }
}

impl<F: Family> Request for CreateReference<F> {
    type Output = ReferenceDetails;
}

impl<F: Family> Command for CreateReference<F> {}

/// Replace an item's label, description, and ordinal. Carries the version
/// the caller last read; stale writes are rejected.
#[derive(Debug, Clone)]
pub struct UpdateReference<F: Family> {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub ordinal: i32,
    pub expected_version: u64,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
    _family: PhantomData<F>,
}

impl<F: Family> UpdateReference<F> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        description: Option<String>,
        ordinal: i32,
        expected_version: u64,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description,
            ordinal,
            expected_version,
            actor,
            occurred_at,
            _family: PhantomData,
        }
    }

    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(required_id("id", |r: &Self| r.id))
            .rule(|r: &Self, errors: &mut ValidationErrors| {
                if r.expected_version < 1 {
                    errors.push("expected_version", "range", "expected version must be at least 1");
                }
            })
            .merge(payload_rules())
    }
}

impl<F: Family> Payload for UpdateReference<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn ordinal(&self) -> i32 {
        self.ordinal
    }

    fn actor(&self) -> UserId {
        self.actor
    }
}

impl<F: Family> Request for UpdateReference<F> {
    type Output = ReferenceDetails;
}

impl<F: Family> Command for UpdateReference<F> {}

/// Soft-delete an item. Absent ids are a no-op (`false`).
#[derive(Debug, Clone)]
pub struct DeleteReference<F: Family> {
    pub id: EntityId,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
    _family: PhantomData<F>,
}

impl<F: Family> DeleteReference<F> {
    pub fn new(id: EntityId, actor: UserId, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id,
            actor,
            occurred_at,
            _family: PhantomData,
        }
    }

    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(required_id("id", |r: &Self| r.id))
            .rule(|r: &Self, errors: &mut ValidationErrors| {
                if r.actor.is_nil() {
                    errors.push("actor", "required", "actor must be a non-nil identifier");
                }
            })
    }
}

impl<F: Family> Request for DeleteReference<F> {
    type Output = bool;
}

impl<F: Family> Command for DeleteReference<F> {}
