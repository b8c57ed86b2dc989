//! Company: a business account, classified by an account type.

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
use anchorcrm_reference::{AccountType, ReferenceItem, ReferenceSummary};
use anchorcrm_store::{ReferenceRepository, Repository};

use crate::person::Person;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_WEBSITE_LEN: usize = 100;
pub const MAX_FILTER_LEN: usize = 50;

/// A company record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub meta: RecordMeta,
    pub name: String,
    pub website: Option<String>,
    pub account_type_id: Option<EntityId>,
}

impl Record for Company {
    const KIND: &'static str = "company";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn reference_ids(&self) -> Vec<EntityId> {
        self.account_type_id.into_iter().collect()
    }
}

// -------------------------
// Projections
// -------------------------

/// Nested inside other entities' details shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanySummary {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyListItem {
    pub id: EntityId,
    pub name: String,
    pub website: Option<String>,
}

/// Full field set plus resolved account type and the person count, both
/// computed at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyDetails {
    pub id: EntityId,
    pub name: String,
    pub website: Option<String>,
    pub account_type: Option<ReferenceSummary>,
    pub person_count: u64,
    pub active: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ProjectFrom<Company> for CompanySummary {
    fn project(company: &Company) -> Self {
        Self {
            id: company.id(),
            name: company.name.clone(),
        }
    }
}

impl ProjectFrom<Company> for CompanyListItem {
    fn project(company: &Company) -> Self {
        Self {
            id: company.id(),
            name: company.name.clone(),
            website: company.website.clone(),
        }
    }
}

impl CompanyDetails {
    fn assemble(company: &Company, account_type: Option<ReferenceSummary>, person_count: u64) -> Self {
        Self {
            id: company.id(),
            name: company.name.clone(),
            website: company.website.clone(),
            account_type,
            person_count,
            active: company.is_active(),
            version: company.version(),
            created_at: company.meta.audit.created_at,
            modified_at: company.meta.audit.modified_at,
        }
    }
}

// -------------------------
// Requests
// -------------------------

#[derive(Debug, Clone)]
pub struct GetCompanyById {
    pub id: EntityId,
}

impl GetCompanyById {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new().rule(required_id("id", |r: &Self| r.id))
    }
}

impl Request for GetCompanyById {
    type Output = CompanyDetails;
}

impl Query for GetCompanyById {}

#[derive(Debug, Clone)]
pub struct ListCompanies {
    pub page: Page,
    /// Case-insensitive substring match on the company name.
    pub name_contains: Option<String>,
}

impl ListCompanies {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(page_bounds(|r: &Self| r.page))
            .rule(optional_text("name_contains", MAX_FILTER_LEN, |r: &Self| {
                r.name_contains.as_deref()
            }))
    }
}

impl Request for ListCompanies {
    type Output = PageOf<CompanyListItem>;
}

impl Query for ListCompanies {}

#[derive(Debug, Clone)]
pub struct CreateCompany {
    pub name: String,
    pub website: Option<String>,
    pub account_type_id: Option<EntityId>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

fn company_payload_rules<R>(
    name: impl for<'a> Fn(&'a R) -> &'a str + Send + Sync + 'static,
    website: impl for<'a> Fn(&'a R) -> Option<&'a str> + Send + Sync + 'static,
    account_type_id: impl Fn(&R) -> Option<EntityId> + Send + Sync + 'static,
    actor: impl Fn(&R) -> UserId + Send + Sync + 'static,
) -> RuleSet<R> {
    RuleSet::new()
        .rule(required_text("name", MAX_NAME_LEN, name))
        .rule(optional_text("website", MAX_WEBSITE_LEN, website))
        .rule(optional_id("account_type_id", account_type_id))
        .rule(move |r: &R, errors: &mut ValidationErrors| {
            if actor(r).is_nil() {
                errors.push("actor", "required", "actor must be a non-nil identifier");
            }
        })
}

impl CreateCompany {
    pub fn rules() -> RuleSet<Self> {
        company_payload_rules(
            |r: &Self| &r.name,
            |r: &Self| r.website.as_deref(),
            |r: &Self| r.account_type_id,
            |r: &Self| r.actor,
        )
    }
}

impl Request for CreateCompany {
    type Output = CompanyDetails;
}

impl Command for CreateCompany {}

#[derive(Debug, Clone)]
pub struct UpdateCompany {
    pub id: EntityId,
    pub name: String,
    pub website: Option<String>,
    pub account_type_id: Option<EntityId>,
    pub expected_version: u64,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl UpdateCompany {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(required_id("id", |r: &Self| r.id))
            .rule(|r: &Self, errors: &mut ValidationErrors| {
                if r.expected_version < 1 {
                    errors.push("expected_version", "range", "expected version must be at least 1");
                }
            })
            .merge(company_payload_rules(
                |r: &Self| &r.name,
                |r: &Self| r.website.as_deref(),
                |r: &Self| r.account_type_id,
                |r: &Self| r.actor,
            ))
    }
}

impl Request for UpdateCompany {
    type Output = CompanyDetails;
}

impl Command for UpdateCompany {}

#[derive(Debug, Clone)]
pub struct DeleteCompany {
    pub id: EntityId,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl DeleteCompany {
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

impl Request for DeleteCompany {
    type Output = bool;
}

impl Command for DeleteCompany {}

// -------------------------
// Handlers
// -------------------------

/// Handlers for every company request.
pub struct CompanyHandlers {
    companies: Arc<dyn Repository<Company>>,
    people: Arc<dyn Repository<Person>>,
    account_types: Arc<dyn ReferenceRepository<ReferenceItem<AccountType>>>,
}

impl CompanyHandlers {
    pub fn new(
        companies: Arc<dyn Repository<Company>>,
        people: Arc<dyn Repository<Person>>,
        account_types: Arc<dyn ReferenceRepository<ReferenceItem<AccountType>>>,
    ) -> Self {
        Self {
            companies,
            people,
            account_types,
        }
    }

    pub fn register(self: &Arc<Self>, dispatcher: &mut Dispatcher) {
        dispatcher.register::<GetCompanyById>(GetCompanyById::rules(), self.clone());
        dispatcher.register::<ListCompanies>(ListCompanies::rules(), self.clone());
        dispatcher.register::<CreateCompany>(CreateCompany::rules(), self.clone());
        dispatcher.register::<UpdateCompany>(UpdateCompany::rules(), self.clone());
        dispatcher.register::<DeleteCompany>(DeleteCompany::rules(), self.clone());
    }

    async fn resolve_account_type(
        &self,
        account_type_id: Option<EntityId>,
    ) -> DomainResult<Option<ReferenceSummary>> {
        let Some(id) = account_type_id else {
            return Ok(None);
        };
        let item = self.account_types.get_by_id(id).await?;
        Ok(item.as_ref().map(ReferenceSummary::project))
    }

    /// The referenced account type must exist and be active.
    async fn ensure_account_type(&self, account_type_id: Option<EntityId>) -> DomainResult<()> {
        if let Some(id) = account_type_id {
            if !self.account_types.exists(id).await? {
                return Err(DomainError::field(
                    "account_type_id",
                    "exists",
                    format!("account type does not exist: {id}"),
                ));
            }
        }
        Ok(())
    }

    async fn details(&self, company: &Company) -> DomainResult<CompanyDetails> {
        let account_type = self.resolve_account_type(company.account_type_id).await?;
        let person_count = self.people.count_usages_of(company.id()).await?;
        Ok(CompanyDetails::assemble(company, account_type, person_count))
    }
}

#[async_trait]
impl Handle<GetCompanyById> for CompanyHandlers {
    async fn handle(&self, request: GetCompanyById) -> DomainResult<CompanyDetails> {
        let company = self
            .companies
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(Company::KIND, request.id))?;
        self.details(&company).await
    }
}

#[async_trait]
impl Handle<ListCompanies> for CompanyHandlers {
    async fn handle(&self, request: ListCompanies) -> DomainResult<PageOf<CompanyListItem>> {
        let companies = self.companies.get_all().await?;
        let filter = request.name_contains.map(|f| f.to_lowercase());
        let matching: Vec<&Company> = companies
            .iter()
            .filter(|c| match &filter {
                Some(term) => c.name.to_lowercase().contains(term),
                None => true,
            })
            .collect();

        let items: Vec<CompanyListItem> = matching.iter().map(|c| CompanyListItem::project(c)).collect();
        Ok(PageOf::slice(request.page, items))
    }
}

#[async_trait]
impl Handle<CreateCompany> for CompanyHandlers {
    async fn handle(&self, request: CreateCompany) -> DomainResult<CompanyDetails> {
        self.ensure_account_type(request.account_type_id).await?;

        let company = Company {
            meta: RecordMeta::new(EntityId::new(), request.actor, request.occurred_at),
            name: request.name,
            website: request.website,
            account_type_id: request.account_type_id,
        };
        let stored = self.companies.add(company).await?;
        tracing::info!(id = %stored.id(), "company created");
        self.details(&stored).await
    }
}

#[async_trait]
impl Handle<UpdateCompany> for CompanyHandlers {
    async fn handle(&self, request: UpdateCompany) -> DomainResult<CompanyDetails> {
        self.ensure_account_type(request.account_type_id).await?;

        let mut company = self
            .companies
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(Company::KIND, request.id))?;

        company.name = request.name;
        company.website = request.website;
        company.account_type_id = request.account_type_id;
        company.meta.audit.touch(request.actor, request.occurred_at);

        let stored = self.companies.update(company, request.expected_version).await?;
        tracing::info!(id = %stored.id(), version = stored.version(), "company updated");
        self.details(&stored).await
    }
}

#[async_trait]
impl Handle<DeleteCompany> for CompanyHandlers {
    async fn handle(&self, request: DeleteCompany) -> DomainResult<bool> {
        let deleted = self
            .companies
            .delete(request.id, request.actor, request.occurred_at)
            .await?;
        if deleted {
            tracing::info!(id = %request.id, "company soft-deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorcrm_store::InMemoryStore;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    struct Fixture {
        handlers: Arc<CompanyHandlers>,
        people: Arc<InMemoryStore<Person>>,
        account_types: Arc<InMemoryStore<ReferenceItem<AccountType>>>,
    }

    fn fixture() -> Fixture {
        let companies = Arc::new(InMemoryStore::<Company>::new());
        let people = Arc::new(InMemoryStore::<Person>::new());
        let account_types = Arc::new(InMemoryStore::<ReferenceItem<AccountType>>::new());
        let handlers = Arc::new(CompanyHandlers::new(
            companies,
            people.clone(),
            account_types.clone(),
        ));
        Fixture {
            handlers,
            people,
            account_types,
        }
    }

    async fn seed_account_type(fx: &Fixture, name: &str) -> EntityId {
        let item = ReferenceItem::<AccountType>::new(
            EntityId::new(),
            name,
            None,
            1,
            UserId::new(),
            now(),
        );
        fx.account_types.add(item).await.unwrap().id()
    }

    fn create_request(name: &str, account_type_id: Option<EntityId>) -> CreateCompany {
        CreateCompany {
            name: name.to_string(),
            website: None,
            account_type_id,
            actor: UserId::new(),
            occurred_at: now(),
        }
    }

    #[tokio::test]
    async fn create_then_get_resolves_the_account_type_label() {
        let fx = fixture();
        let type_id = seed_account_type(&fx, "Customer").await;

        let created = fx
            .handlers
            .handle(create_request("Acme", Some(type_id)))
            .await
            .unwrap();

        let details = fx
            .handlers
            .handle(GetCompanyById { id: created.id })
            .await
            .unwrap();
        assert_eq!(details.name, "Acme");
        assert_eq!(details.account_type.as_ref().unwrap().name, "Customer");
        assert_eq!(details.person_count, 0);
    }

    #[tokio::test]
    async fn create_rejects_an_unknown_account_type() {
        let fx = fixture();
        let err = fx
            .handlers
            .handle(create_request("Acme", Some(EntityId::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn person_count_reflects_active_people_only() {
        let fx = fixture();
        let created = fx.handlers.handle(create_request("Acme", None)).await.unwrap();

        let mut person = Person::sample("Ada", "Lovelace");
        person.company_id = Some(created.id);
        let person = fx.people.add(person).await.unwrap();

        let mut former = Person::sample("Grace", "Hopper");
        former.company_id = Some(created.id);
        let former = fx.people.add(former).await.unwrap();
        fx.people
            .delete(former.id(), UserId::new(), now())
            .await
            .unwrap();

        let details = fx
            .handlers
            .handle(GetCompanyById { id: created.id })
            .await
            .unwrap();
        assert_eq!(details.person_count, 1);
        assert_eq!(person.company_id, Some(created.id));
    }

    #[tokio::test]
    async fn list_filters_by_name_and_pages() {
        let fx = fixture();
        for i in 0..25 {
            fx.handlers
                .handle(create_request(&format!("Acme {i:02}"), None))
                .await
                .unwrap();
        }
        fx.handlers
            .handle(create_request("Other Corp", None))
            .await
            .unwrap();

        let page = fx
            .handlers
            .handle(ListCompanies {
                page: Page::new(1, 10),
                name_contains: Some("acme".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total, 25);

        let last = fx
            .handlers
            .handle(ListCompanies {
                page: Page::new(3, 10),
                name_contains: Some("acme".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(last.items.len(), 5);
    }

    #[tokio::test]
    async fn update_bumps_version_and_delete_hides_from_lists() {
        let fx = fixture();
        let created = fx.handlers.handle(create_request("Acme", None)).await.unwrap();

        let updated = fx
            .handlers
            .handle(UpdateCompany {
                id: created.id,
                name: "Acme Ltd".to_string(),
                website: Some("https://acme.example".to_string()),
                account_type_id: None,
                expected_version: created.version,
                actor: UserId::new(),
                occurred_at: now(),
            })
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.name, "Acme Ltd");

        assert!(
            fx.handlers
                .handle(DeleteCompany {
                    id: created.id,
                    actor: UserId::new(),
                    occurred_at: now(),
                })
                .await
                .unwrap()
        );

        let listed = fx
            .handlers
            .handle(ListCompanies {
                page: Page::default(),
                name_contains: None,
            })
            .await
            .unwrap();
        assert_eq!(listed.total, 0);

        // Still reachable directly, marked inactive.
        let details = fx
            .handlers
            .handle(GetCompanyById { id: created.id })
            .await
            .unwrap();
        assert!(!details.active);
    }

    #[tokio::test]
    async fn get_of_absent_company_is_not_found() {
        let fx = fixture();
        let err = fx
            .handlers
            .handle(GetCompanyById { id: EntityId::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_with_nil_actor_fails_validation() {
        let request = DeleteCompany {
            id: EntityId::new(),
            actor: UserId::nil(),
            occurred_at: now(),
        };
        let err = DeleteCompany::rules().check(&request).unwrap_err();
        match err {
            DomainError::Validation(v) => assert_eq!(v.errors()[0].field, "actor"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_with_zero_expected_version_fails_validation() {
        let request = UpdateCompany {
            id: EntityId::new(),
            name: "Acme".to_string(),
            website: None,
            account_type_id: None,
            expected_version: 0,
            actor: UserId::new(),
            occurred_at: now(),
        };
        let err = UpdateCompany::rules().check(&request).unwrap_err();
        match err {
            DomainError::Validation(v) => assert_eq!(v.errors()[0].field, "expected_version"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_page_is_rejected_by_the_rule_set() {
        let request = ListCompanies {
            page: Page::new(1, 101),
            name_contains: None,
        };
        assert!(ListCompanies::rules().check(&request).is_err());
    }
}
