//! Person: an individual contact, optionally attached to a company.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use anchorcrm_core::{
    DomainError, DomainResult, EntityId, Record, RecordMeta, UserId, ValidationErrors,
};
use anchorcrm_pipeline::validate::{optional_id, optional_text, page_bounds, required_id, required_text};
use anchorcrm_pipeline::{
    Command, Dispatcher, Handle, Page, PageOf, ProjectFrom, Query, Request, RuleSet,
};
use anchorcrm_reference::{ContactMethod, ReferenceItem, ReferenceSummary};
use anchorcrm_store::{ReferenceRepository, Repository};

use crate::company::{Company, CompanySummary};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 50;
pub const MAX_FILTER_LEN: usize = 50;

/// A person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub meta: RecordMeta,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<EntityId>,
    pub contact_method_id: Option<EntityId>,
}

impl Record for Person {
    const KIND: &'static str = "person";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn reference_ids(&self) -> Vec<EntityId> {
        self.company_id
            .into_iter()
            .chain(self.contact_method_id)
            .collect()
    }
}

#[cfg(test)]
impl Person {
    /// Bare active person for tests in this crate.
    pub fn sample(first: &str, last: &str) -> Self {
        Self {
            meta: RecordMeta::new(EntityId::new(), UserId::new(), Utc::now()),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: None,
            phone: None,
            company_id: None,
            contact_method_id: None,
        }
    }
}

// -------------------------
// Projections
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonSummary {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonListItem {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

/// Full field set with the company and preferred contact method resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonDetails {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<CompanySummary>,
    pub contact_method: Option<ReferenceSummary>,
    pub active: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ProjectFrom<Person> for PersonSummary {
    fn project(person: &Person) -> Self {
        Self {
            id: person.id(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
        }
    }
}

impl ProjectFrom<Person> for PersonListItem {
    fn project(person: &Person) -> Self {
        Self {
            id: person.id(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            email: person.email.clone(),
        }
    }
}

impl PersonDetails {
    fn assemble(
        person: &Person,
        company: Option<CompanySummary>,
        contact_method: Option<ReferenceSummary>,
    ) -> Self {
        Self {
            id: person.id(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            email: person.email.clone(),
            phone: person.phone.clone(),
            company,
            contact_method,
            active: person.is_active(),
            version: person.version(),
            created_at: person.meta.audit.created_at,
            modified_at: person.meta.audit.modified_at,
        }
    }
}

// -------------------------
// Requests
// -------------------------

#[derive(Debug, Clone)]
pub struct GetPersonById {
    pub id: EntityId,
}

impl GetPersonById {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new().rule(required_id("id", |r: &Self| r.id))
    }
}

impl Request for GetPersonById {
    type Output = PersonDetails;
}

impl Query for GetPersonById {}

#[derive(Debug, Clone)]
pub struct ListPeople {
    pub page: Page,
    /// Case-insensitive substring match on first or last name.
    pub name_contains: Option<String>,
}

impl ListPeople {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(page_bounds(|r: &Self| r.page))
            .rule(optional_text("name_contains", MAX_FILTER_LEN, |r: &Self| {
                r.name_contains.as_deref()
            }))
    }
}

impl Request for ListPeople {
    type Output = PageOf<PersonListItem>;
}

impl Query for ListPeople {}

#[derive(Debug, Clone)]
pub struct CreatePerson {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<EntityId>,
    pub contact_method_id: Option<EntityId>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

fn person_payload_rules<R>(
    first: impl for<'a> Fn(&'a R) -> &'a str + Send + Sync + 'static,
    last: impl for<'a> Fn(&'a R) -> &'a str + Send + Sync + 'static,
    email: impl for<'a> Fn(&'a R) -> Option<&'a str> + Send + Sync + 'static,
    phone: impl for<'a> Fn(&'a R) -> Option<&'a str> + Send + Sync + 'static,
    company_id: impl Fn(&R) -> Option<EntityId> + Send + Sync + 'static,
    contact_method_id: impl Fn(&R) -> Option<EntityId> + Send + Sync + 'static,
    actor: impl Fn(&R) -> UserId + Send + Sync + 'static,
) -> RuleSet<R> {
    RuleSet::new()
        .rule(required_text("first_name", MAX_NAME_LEN, first))
        .rule(required_text("last_name", MAX_NAME_LEN, last))
        .rule(optional_text("email", MAX_EMAIL_LEN, email))
        .rule(optional_text("phone", MAX_PHONE_LEN, phone))
        .rule(optional_id("company_id", company_id))
        .rule(optional_id("contact_method_id", contact_method_id))
        .rule(move |r: &R, errors: &mut ValidationErrors| {
            if actor(r).is_nil() {
                errors.push("actor", "required", "actor must be a non-nil identifier");
            }
        })
}

impl CreatePerson {
    pub fn rules() -> RuleSet<Self> {
        person_payload_rules(
            |r: &Self| &r.first_name,
            |r: &Self| &r.last_name,
            |r: &Self| r.email.as_deref(),
            |r: &Self| r.phone.as_deref(),
            |r: &Self| r.company_id,
            |r: &Self| r.contact_method_id,
            |r: &Self| r.actor,
        )
    }
}

impl Request for CreatePerson {
    type Output = PersonDetails;
}

impl Command for CreatePerson {}

#[derive(Debug, Clone)]
pub struct UpdatePerson {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<EntityId>,
    pub contact_method_id: Option<EntityId>,
    pub expected_version: u64,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl UpdatePerson {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(required_id("id", |r: &Self| r.id))
            .rule(|r: &Self, errors: &mut ValidationErrors| {
                if r.expected_version < 1 {
                    errors.push("expected_version", "range", "expected version must be at least 1");
                }
            })
            .merge(person_payload_rules(
                |r: &Self| &r.first_name,
                |r: &Self| &r.last_name,
                |r: &Self| r.email.as_deref(),
                |r: &Self| r.phone.as_deref(),
                |r: &Self| r.company_id,
                |r: &Self| r.contact_method_id,
                |r: &Self| r.actor,
            ))
    }
}

impl Request for UpdatePerson {
    type Output = PersonDetails;
}

impl Command for UpdatePerson {}

#[derive(Debug, Clone)]
pub struct DeletePerson {
    pub id: EntityId,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl DeletePerson {
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

impl Request for DeletePerson {
    type Output = bool;
}

impl Command for DeletePerson {}

// -------------------------
// Handlers
// -------------------------

/// Handlers for every person request.
pub struct PersonHandlers {
    people: Arc<dyn Repository<Person>>,
    companies: Arc<dyn Repository<Company>>,
    contact_methods: Arc<dyn ReferenceRepository<ReferenceItem<ContactMethod>>>,
}

impl PersonHandlers {
    pub fn new(
        people: Arc<dyn Repository<Person>>,
        companies: Arc<dyn Repository<Company>>,
        contact_methods: Arc<dyn ReferenceRepository<ReferenceItem<ContactMethod>>>,
    ) -> Self {
        Self {
            people,
            companies,
            contact_methods,
        }
    }

    pub fn register(self: &Arc<Self>, dispatcher: &mut Dispatcher) {
        dispatcher.register::<GetPersonById>(GetPersonById::rules(), self.clone());
        dispatcher.register::<ListPeople>(ListPeople::rules(), self.clone());
        dispatcher.register::<CreatePerson>(CreatePerson::rules(), self.clone());
        dispatcher.register::<UpdatePerson>(UpdatePerson::rules(), self.clone());
        dispatcher.register::<DeletePerson>(DeletePerson::rules(), self.clone());
    }

    async fn details(&self, person: &Person) -> DomainResult<PersonDetails> {
        let company = match person.company_id {
            Some(id) => self
                .companies
                .get_by_id(id)
                .await?
                .as_ref()
                .map(CompanySummary::project),
            None => None,
        };
        let contact_method = match person.contact_method_id {
            Some(id) => self
                .contact_methods
                .get_by_id(id)
                .await?
                .as_ref()
                .map(ReferenceSummary::project),
            None => None,
        };
        Ok(PersonDetails::assemble(person, company, contact_method))
    }
}

#[async_trait]
impl Handle<GetPersonById> for PersonHandlers {
    async fn handle(&self, request: GetPersonById) -> DomainResult<PersonDetails> {
        let person = self
            .people
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(Person::KIND, request.id))?;
        self.details(&person).await
    }
}

#[async_trait]
impl Handle<ListPeople> for PersonHandlers {
    async fn handle(&self, request: ListPeople) -> DomainResult<PageOf<PersonListItem>> {
        let people = self.people.get_all().await?;
        let filter = request.name_contains.map(|f| f.to_lowercase());
        let items: Vec<PersonListItem> = people
            .iter()
            .filter(|p| match &filter {
                Some(term) => {
                    p.first_name.to_lowercase().contains(term)
                        || p.last_name.to_lowercase().contains(term)
                }
                None => true,
            })
            .map(PersonListItem::project)
            .collect();
        Ok(PageOf::slice(request.page, items))
    }
}

#[async_trait]
impl Handle<CreatePerson> for PersonHandlers {
    async fn handle(&self, request: CreatePerson) -> DomainResult<PersonDetails> {
        let person = Person {
            meta: RecordMeta::new(EntityId::new(), request.actor, request.occurred_at),
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            phone: request.phone,
            company_id: request.company_id,
            contact_method_id: request.contact_method_id,
        };
        let stored = self.people.add(person).await?;
        tracing::info!(id = %stored.id(), "person created");
        self.details(&stored).await
    }
}

#[async_trait]
impl Handle<UpdatePerson> for PersonHandlers {
    async fn handle(&self, request: UpdatePerson) -> DomainResult<PersonDetails> {
        let mut person = self
            .people
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(Person::KIND, request.id))?;

        person.first_name = request.first_name;
        person.last_name = request.last_name;
        person.email = request.email;
        person.phone = request.phone;
        person.company_id = request.company_id;
        person.contact_method_id = request.contact_method_id;
        person.meta.audit.touch(request.actor, request.occurred_at);

        let stored = self.people.update(person, request.expected_version).await?;
        tracing::info!(id = %stored.id(), version = stored.version(), "person updated");
        self.details(&stored).await
    }
}

#[async_trait]
impl Handle<DeletePerson> for PersonHandlers {
    async fn handle(&self, request: DeletePerson) -> DomainResult<bool> {
        let deleted = self
            .people
            .delete(request.id, request.actor, request.occurred_at)
            .await?;
        if deleted {
            tracing::info!(id = %request.id, "person soft-deleted");
        }
        Ok(deleted)
    }
}
