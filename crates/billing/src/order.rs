//! Sales order: an order document owned by a company, with line items.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use anchorcrm_core::{
    DomainError, DomainResult, EntityId, Record, RecordMeta, UserId, ValidationErrors,
};
use anchorcrm_pipeline::validate::{optional_id, page_bounds, required_id, required_text};
use anchorcrm_pipeline::{
    Command, Dispatcher, Handle, Page, PageOf, ProjectFrom, Query, Request, RuleSet,
};
use anchorcrm_directory::{Company, CompanySummary};
use anchorcrm_reference::{ReferenceItem, ReferenceSummary, SalesOrderStatus};
use anchorcrm_store::{ReferenceRepository, Repository};

use crate::line::{LineInput, line_rules};

pub const MAX_NUMBER_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub description: String,
    pub quantity: u32,
    pub unit_price_minor: i64,
}

/// A sales order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub meta: RecordMeta,
    pub number: String,
    pub company_id: EntityId,
    pub status_id: EntityId,
    pub ordered_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Record for SalesOrder {
    const KIND: &'static str = "sales order";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn reference_ids(&self) -> Vec<EntityId> {
        vec![self.company_id, self.status_id]
    }
}

fn number_lines(inputs: Vec<LineInput>) -> Vec<OrderLine> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, l)| OrderLine {
            line_no: (i + 1) as u32,
            description: l.description,
            quantity: l.quantity,
            unit_price_minor: l.unit_price_minor,
        })
        .collect()
}

fn total_minor(lines: &[OrderLine]) -> i64 {
    lines
        .iter()
        .map(|l| i64::from(l.quantity) * l.unit_price_minor)
        .sum()
}

// -------------------------
// Projections
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesOrderListItem {
    pub id: EntityId,
    pub number: String,
    pub company_id: EntityId,
    pub status_id: EntityId,
    pub ordered_at: DateTime<Utc>,
    pub total_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesOrderDetails {
    pub id: EntityId,
    pub number: String,
    pub company: Option<CompanySummary>,
    pub status: Option<ReferenceSummary>,
    pub ordered_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    pub total_minor: i64,
    pub active: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ProjectFrom<SalesOrder> for SalesOrderListItem {
    fn project(order: &SalesOrder) -> Self {
        Self {
            id: order.id(),
            number: order.number.clone(),
            company_id: order.company_id,
            status_id: order.status_id,
            ordered_at: order.ordered_at,
            total_minor: total_minor(&order.lines),
        }
    }
}

impl SalesOrderDetails {
    fn assemble(
        order: &SalesOrder,
        company: Option<CompanySummary>,
        status: Option<ReferenceSummary>,
    ) -> Self {
        Self {
            id: order.id(),
            number: order.number.clone(),
            company,
            status,
            ordered_at: order.ordered_at,
            lines: order.lines.clone(),
            total_minor: total_minor(&order.lines),
            active: order.is_active(),
            version: order.version(),
            created_at: order.meta.audit.created_at,
            modified_at: order.meta.audit.modified_at,
        }
    }
}

// -------------------------
// Requests
// -------------------------

#[derive(Debug, Clone)]
pub struct GetSalesOrderById {
    pub id: EntityId,
}

impl GetSalesOrderById {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new().rule(required_id("id", |r: &Self| r.id))
    }
}

impl Request for GetSalesOrderById {
    type Output = SalesOrderDetails;
}

impl Query for GetSalesOrderById {}

#[derive(Debug, Clone)]
pub struct ListSalesOrders {
    pub page: Page,
    pub status_id: Option<EntityId>,
}

impl ListSalesOrders {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(page_bounds(|r: &Self| r.page))
            .rule(optional_id("status_id", |r: &Self| r.status_id))
    }
}

impl Request for ListSalesOrders {
    type Output = PageOf<SalesOrderListItem>;
}

impl Query for ListSalesOrders {}

#[derive(Debug, Clone)]
pub struct CreateSalesOrder {
    pub number: String,
    pub company_id: EntityId,
    pub status_id: EntityId,
    pub ordered_at: DateTime<Utc>,
    pub lines: Vec<LineInput>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

fn order_payload_rules<R>(
    number: impl for<'a> Fn(&'a R) -> &'a str + Send + Sync + 'static,
    company_id: impl Fn(&R) -> EntityId + Send + Sync + 'static,
    status_id: impl Fn(&R) -> EntityId + Send + Sync + 'static,
    lines: impl for<'a> Fn(&'a R) -> &'a [LineInput] + Send + Sync + 'static,
    actor: impl Fn(&R) -> UserId + Send + Sync + 'static,
) -> RuleSet<R> {
    RuleSet::new()
        .rule(required_text("number", MAX_NUMBER_LEN, number))
        .rule(required_id("company_id", company_id))
        .rule(required_id("status_id", status_id))
        .rule(move |r: &R, errors: &mut ValidationErrors| {
            if actor(r).is_nil() {
                errors.push("actor", "required", "actor must be a non-nil identifier");
            }
        })
        .merge(line_rules(lines))
}

impl CreateSalesOrder {
    pub fn rules() -> RuleSet<Self> {
        order_payload_rules(
            |r: &Self| &r.number,
            |r: &Self| r.company_id,
            |r: &Self| r.status_id,
            |r: &Self| &r.lines,
            |r: &Self| r.actor,
        )
    }
}

impl Request for CreateSalesOrder {
    type Output = SalesOrderDetails;
}

impl Command for CreateSalesOrder {}

#[derive(Debug, Clone)]
pub struct UpdateSalesOrder {
    pub id: EntityId,
    pub number: String,
    pub company_id: EntityId,
    pub status_id: EntityId,
    pub ordered_at: DateTime<Utc>,
    pub lines: Vec<LineInput>,
    pub expected_version: u64,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl UpdateSalesOrder {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(required_id("id", |r: &Self| r.id))
            .rule(|r: &Self, errors: &mut ValidationErrors| {
                if r.expected_version < 1 {
                    errors.push("expected_version", "range", "expected version must be at least 1");
                }
            })
            .merge(order_payload_rules(
                |r: &Self| &r.number,
                |r: &Self| r.company_id,
                |r: &Self| r.status_id,
                |r: &Self| &r.lines,
                |r: &Self| r.actor,
            ))
    }
}

impl Request for UpdateSalesOrder {
    type Output = SalesOrderDetails;
}

impl Command for UpdateSalesOrder {}

#[derive(Debug, Clone)]
pub struct DeleteSalesOrder {
    pub id: EntityId,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl DeleteSalesOrder {
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

impl Request for DeleteSalesOrder {
    type Output = bool;
}

impl Command for DeleteSalesOrder {}

// -------------------------
// Handlers
// -------------------------

/// Handlers for every sales-order request.
pub struct SalesOrderHandlers {
    orders: Arc<dyn Repository<SalesOrder>>,
    companies: Arc<dyn Repository<Company>>,
    statuses: Arc<dyn ReferenceRepository<ReferenceItem<SalesOrderStatus>>>,
}

impl SalesOrderHandlers {
    pub fn new(
        orders: Arc<dyn Repository<SalesOrder>>,
        companies: Arc<dyn Repository<Company>>,
        statuses: Arc<dyn ReferenceRepository<ReferenceItem<SalesOrderStatus>>>,
    ) -> Self {
        Self {
            orders,
            companies,
            statuses,
        }
    }

    pub fn register(self: &Arc<Self>, dispatcher: &mut Dispatcher) {
        dispatcher.register::<GetSalesOrderById>(GetSalesOrderById::rules(), self.clone());
        dispatcher.register::<ListSalesOrders>(ListSalesOrders::rules(), self.clone());
        dispatcher.register::<CreateSalesOrder>(CreateSalesOrder::rules(), self.clone());
        dispatcher.register::<UpdateSalesOrder>(UpdateSalesOrder::rules(), self.clone());
        dispatcher.register::<DeleteSalesOrder>(DeleteSalesOrder::rules(), self.clone());
    }

    async fn ensure_status(&self, status_id: EntityId) -> DomainResult<()> {
        if !self.statuses.exists(status_id).await? {
            return Err(DomainError::field(
                "status_id",
                "exists",
                format!("sales order status does not exist: {status_id}"),
            ));
        }
        Ok(())
    }

    async fn details(&self, order: &SalesOrder) -> DomainResult<SalesOrderDetails> {
        let company = self
            .companies
            .get_by_id(order.company_id)
            .await?
            .as_ref()
            .map(CompanySummary::project);
        let status = self
            .statuses
            .get_by_id(order.status_id)
            .await?
            .as_ref()
            .map(ReferenceSummary::project);
        Ok(SalesOrderDetails::assemble(order, company, status))
    }
}

#[async_trait]
impl Handle<GetSalesOrderById> for SalesOrderHandlers {
    async fn handle(&self, request: GetSalesOrderById) -> DomainResult<SalesOrderDetails> {
        let order = self
            .orders
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(SalesOrder::KIND, request.id))?;
        self.details(&order).await
    }
}

#[async_trait]
impl Handle<ListSalesOrders> for SalesOrderHandlers {
    async fn handle(&self, request: ListSalesOrders) -> DomainResult<PageOf<SalesOrderListItem>> {
        let orders = self.orders.get_all().await?;
        let items: Vec<SalesOrderListItem> = orders
            .iter()
            .filter(|o| match request.status_id {
                Some(status_id) => o.status_id == status_id,
                None => true,
            })
            .map(SalesOrderListItem::project)
            .collect();
        Ok(PageOf::slice(request.page, items))
    }
}

#[async_trait]
impl Handle<CreateSalesOrder> for SalesOrderHandlers {
    async fn handle(&self, request: CreateSalesOrder) -> DomainResult<SalesOrderDetails> {
        self.ensure_status(request.status_id).await?;

        let order = SalesOrder {
            meta: RecordMeta::new(EntityId::new(), request.actor, request.occurred_at),
            number: request.number,
            company_id: request.company_id,
            status_id: request.status_id,
            ordered_at: request.ordered_at,
            lines: number_lines(request.lines),
        };
        let stored = self.orders.add(order).await?;
        tracing::info!(id = %stored.id(), number = %stored.number, "sales order created");
        self.details(&stored).await
    }
}

#[async_trait]
impl Handle<UpdateSalesOrder> for SalesOrderHandlers {
    async fn handle(&self, request: UpdateSalesOrder) -> DomainResult<SalesOrderDetails> {
        self.ensure_status(request.status_id).await?;

        let mut order = self
            .orders
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(SalesOrder::KIND, request.id))?;

        order.number = request.number;
        order.company_id = request.company_id;
        order.status_id = request.status_id;
        order.ordered_at = request.ordered_at;
        order.lines = number_lines(request.lines);
        order.meta.audit.touch(request.actor, request.occurred_at);

        let stored = self.orders.update(order, request.expected_version).await?;
        tracing::info!(id = %stored.id(), version = stored.version(), "sales order updated");
        self.details(&stored).await
    }
}

#[async_trait]
impl Handle<DeleteSalesOrder> for SalesOrderHandlers {
    async fn handle(&self, request: DeleteSalesOrder) -> DomainResult<bool> {
        let deleted = self
            .orders
            .delete(request.id, request.actor, request.occurred_at)
            .await?;
        if deleted {
            tracing::info!(id = %request.id, "sales order soft-deleted");
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
        handlers: Arc<SalesOrderHandlers>,
        companies: Arc<InMemoryStore<Company>>,
        statuses: Arc<InMemoryStore<ReferenceItem<SalesOrderStatus>>>,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryStore::<SalesOrder>::new());
        let companies = Arc::new(InMemoryStore::<Company>::new());
        let statuses = Arc::new(InMemoryStore::<ReferenceItem<SalesOrderStatus>>::new());
        let handlers = Arc::new(SalesOrderHandlers::new(
            orders,
            companies.clone(),
            statuses.clone(),
        ));
        Fixture {
            handlers,
            companies,
            statuses,
        }
    }

    #[tokio::test]
    async fn create_get_delete_lifecycle() {
        let fx = fixture();
        let status = fx
            .statuses
            .add(ReferenceItem::new(
                EntityId::new(),
                "Open",
                None,
                1,
                UserId::new(),
                now(),
            ))
            .await
            .unwrap()
            .id();
        let company = fx
            .companies
            .add(Company {
                meta: RecordMeta::new(EntityId::new(), UserId::new(), now()),
                name: "Acme".to_string(),
                website: None,
                account_type_id: None,
            })
            .await
            .unwrap()
            .id();

        let created = fx
            .handlers
            .handle(CreateSalesOrder {
                number: "SO-001".to_string(),
                company_id: company,
                status_id: status,
                ordered_at: now(),
                lines: vec![LineInput {
                    description: "widgets".to_string(),
                    quantity: 4,
                    unit_price_minor: 1_250,
                }],
                actor: UserId::new(),
                occurred_at: now(),
            })
            .await
            .unwrap();
        assert_eq!(created.total_minor, 5_000);
        assert_eq!(created.status.as_ref().unwrap().name, "Open");
        assert_eq!(created.company.as_ref().unwrap().name, "Acme");

        let fetched = fx
            .handlers
            .handle(GetSalesOrderById { id: created.id })
            .await
            .unwrap();
        assert_eq!(fetched.number, "SO-001");

        assert!(
            fx.handlers
                .handle(DeleteSalesOrder {
                    id: created.id,
                    actor: UserId::new(),
                    occurred_at: now(),
                })
                .await
                .unwrap()
        );
        let page = fx
            .handlers
            .handle(ListSalesOrders {
                page: Page::default(),
                status_id: None,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn delete_with_nil_actor_fails_validation() {
        let request = DeleteSalesOrder {
            id: EntityId::new(),
            actor: UserId::nil(),
            occurred_at: now(),
        };
        let err = DeleteSalesOrder::rules().check(&request).unwrap_err();
        match err {
            DomainError::Validation(v) => assert_eq!(v.errors()[0].field, "actor"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_with_zero_expected_version_fails_validation() {
        let request = UpdateSalesOrder {
            id: EntityId::new(),
            number: "SO-001".to_string(),
            company_id: EntityId::new(),
            status_id: EntityId::new(),
            ordered_at: now(),
            lines: vec![LineInput {
                description: "widgets".to_string(),
                quantity: 1,
                unit_price_minor: 100,
            }],
            expected_version: 0,
            actor: UserId::new(),
            occurred_at: now(),
        };
        let err = UpdateSalesOrder::rules().check(&request).unwrap_err();
        match err {
            DomainError::Validation(v) => assert_eq!(v.errors()[0].field, "expected_version"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let fx = fixture();
        let err = fx
            .handlers
            .handle(GetSalesOrderById { id: EntityId::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
