//! Invoice: a billing document owned by a company, with line items.

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
use anchorcrm_reference::{InvoiceStatus, ReferenceItem, ReferenceSummary};
use anchorcrm_store::{ReferenceRepository, Repository};

use crate::line::{LineInput, line_rules};

pub const MAX_NUMBER_LEN: usize = 50;

/// One line on a stored invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_no: u32,
    pub description: String,
    pub quantity: u32,
    pub unit_price_minor: i64,
}

/// An invoice record. Lines are owned by the parent; one command replaces
/// the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub meta: RecordMeta,
    pub number: String,
    pub company_id: EntityId,
    pub status_id: EntityId,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub lines: Vec<InvoiceLine>,
}

impl Record for Invoice {
    const KIND: &'static str = "invoice";

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

fn number_lines(inputs: Vec<LineInput>) -> Vec<InvoiceLine> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, l)| InvoiceLine {
            line_no: (i + 1) as u32,
            description: l.description,
            quantity: l.quantity,
            unit_price_minor: l.unit_price_minor,
        })
        .collect()
}

// -------------------------
// Projections
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceListItem {
    pub id: EntityId,
    pub number: String,
    pub company_id: EntityId,
    pub status_id: EntityId,
    pub due_at: DateTime<Utc>,
    pub total_minor: i64,
}

/// Full field set with the company and status resolved; the total is
/// derived at query time, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceDetails {
    pub id: EntityId,
    pub number: String,
    pub company: Option<CompanySummary>,
    pub status: Option<ReferenceSummary>,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub lines: Vec<InvoiceLine>,
    pub total_minor: i64,
    pub active: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

fn total_minor(lines: &[InvoiceLine]) -> i64 {
    lines
        .iter()
        .map(|l| i64::from(l.quantity) * l.unit_price_minor)
        .sum()
}

impl ProjectFrom<Invoice> for InvoiceListItem {
    fn project(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id(),
            number: invoice.number.clone(),
            company_id: invoice.company_id,
            status_id: invoice.status_id,
            due_at: invoice.due_at,
            total_minor: total_minor(&invoice.lines),
        }
    }
}

impl InvoiceDetails {
    fn assemble(
        invoice: &Invoice,
        company: Option<CompanySummary>,
        status: Option<ReferenceSummary>,
    ) -> Self {
        Self {
            id: invoice.id(),
            number: invoice.number.clone(),
            company,
            status,
            issued_at: invoice.issued_at,
            due_at: invoice.due_at,
            lines: invoice.lines.clone(),
            total_minor: total_minor(&invoice.lines),
            active: invoice.is_active(),
            version: invoice.version(),
            created_at: invoice.meta.audit.created_at,
            modified_at: invoice.meta.audit.modified_at,
        }
    }
}

// -------------------------
// Requests
// -------------------------

#[derive(Debug, Clone)]
pub struct GetInvoiceById {
    pub id: EntityId,
}

impl GetInvoiceById {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new().rule(required_id("id", |r: &Self| r.id))
    }
}

impl Request for GetInvoiceById {
    type Output = InvoiceDetails;
}

impl Query for GetInvoiceById {}

#[derive(Debug, Clone)]
pub struct ListInvoices {
    pub page: Page,
    /// Restrict to one workflow status.
    pub status_id: Option<EntityId>,
}

impl ListInvoices {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(page_bounds(|r: &Self| r.page))
            .rule(optional_id("status_id", |r: &Self| r.status_id))
    }
}

impl Request for ListInvoices {
    type Output = PageOf<InvoiceListItem>;
}

impl Query for ListInvoices {}

#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub number: String,
    pub company_id: EntityId,
    pub status_id: EntityId,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub lines: Vec<LineInput>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

fn invoice_payload_rules<R>(
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

impl CreateInvoice {
    pub fn rules() -> RuleSet<Self> {
        invoice_payload_rules(
            |r: &Self| &r.number,
            |r: &Self| r.company_id,
            |r: &Self| r.status_id,
            |r: &Self| &r.lines,
            |r: &Self| r.actor,
        )
    }
}

impl Request for CreateInvoice {
    type Output = InvoiceDetails;
}

impl Command for CreateInvoice {}

#[derive(Debug, Clone)]
pub struct UpdateInvoice {
    pub id: EntityId,
    pub number: String,
    pub company_id: EntityId,
    pub status_id: EntityId,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub lines: Vec<LineInput>,
    pub expected_version: u64,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl UpdateInvoice {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new()
            .rule(required_id("id", |r: &Self| r.id))
            .rule(|r: &Self, errors: &mut ValidationErrors| {
                if r.expected_version < 1 {
                    errors.push("expected_version", "range", "expected version must be at least 1");
                }
            })
            .merge(invoice_payload_rules(
                |r: &Self| &r.number,
                |r: &Self| r.company_id,
                |r: &Self| r.status_id,
                |r: &Self| &r.lines,
                |r: &Self| r.actor,
            ))
    }
}

impl Request for UpdateInvoice {
    type Output = InvoiceDetails;
}

impl Command for UpdateInvoice {}

#[derive(Debug, Clone)]
pub struct DeleteInvoice {
    pub id: EntityId,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl DeleteInvoice {
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

impl Request for DeleteInvoice {
    type Output = bool;
}

impl Command for DeleteInvoice {}

// -------------------------
// Handlers
// -------------------------

/// Handlers for every invoice request.
pub struct InvoiceHandlers {
    invoices: Arc<dyn Repository<Invoice>>,
    companies: Arc<dyn Repository<Company>>,
    statuses: Arc<dyn ReferenceRepository<ReferenceItem<InvoiceStatus>>>,
}

impl InvoiceHandlers {
    pub fn new(
        invoices: Arc<dyn Repository<Invoice>>,
        companies: Arc<dyn Repository<Company>>,
        statuses: Arc<dyn ReferenceRepository<ReferenceItem<InvoiceStatus>>>,
    ) -> Self {
        Self {
            invoices,
            companies,
            statuses,
        }
    }

    pub fn register(self: &Arc<Self>, dispatcher: &mut Dispatcher) {
        dispatcher.register::<GetInvoiceById>(GetInvoiceById::rules(), self.clone());
        dispatcher.register::<ListInvoices>(ListInvoices::rules(), self.clone());
        dispatcher.register::<CreateInvoice>(CreateInvoice::rules(), self.clone());
        dispatcher.register::<UpdateInvoice>(UpdateInvoice::rules(), self.clone());
        dispatcher.register::<DeleteInvoice>(DeleteInvoice::rules(), self.clone());
    }

    /// The referenced status must exist and be active.
    async fn ensure_status(&self, status_id: EntityId) -> DomainResult<()> {
        if !self.statuses.exists(status_id).await? {
            return Err(DomainError::field(
                "status_id",
                "exists",
                format!("invoice status does not exist: {status_id}"),
            ));
        }
        Ok(())
    }

    async fn details(&self, invoice: &Invoice) -> DomainResult<InvoiceDetails> {
        let company = self
            .companies
            .get_by_id(invoice.company_id)
            .await?
            .as_ref()
            .map(CompanySummary::project);
        let status = self
            .statuses
            .get_by_id(invoice.status_id)
            .await?
            .as_ref()
            .map(ReferenceSummary::project);
        Ok(InvoiceDetails::assemble(invoice, company, status))
    }
}

#[async_trait]
impl Handle<GetInvoiceById> for InvoiceHandlers {
    async fn handle(&self, request: GetInvoiceById) -> DomainResult<InvoiceDetails> {
        let invoice = self
            .invoices
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(Invoice::KIND, request.id))?;
        self.details(&invoice).await
    }
}

#[async_trait]
impl Handle<ListInvoices> for InvoiceHandlers {
    async fn handle(&self, request: ListInvoices) -> DomainResult<PageOf<InvoiceListItem>> {
        let invoices = self.invoices.get_all().await?;
        let items: Vec<InvoiceListItem> = invoices
            .iter()
            .filter(|i| match request.status_id {
                Some(status_id) => i.status_id == status_id,
                None => true,
            })
            .map(InvoiceListItem::project)
            .collect();
        Ok(PageOf::slice(request.page, items))
    }
}

#[async_trait]
impl Handle<CreateInvoice> for InvoiceHandlers {
    async fn handle(&self, request: CreateInvoice) -> DomainResult<InvoiceDetails> {
        self.ensure_status(request.status_id).await?;

        let invoice = Invoice {
            meta: RecordMeta::new(EntityId::new(), request.actor, request.occurred_at),
            number: request.number,
            company_id: request.company_id,
            status_id: request.status_id,
            issued_at: request.issued_at,
            due_at: request.due_at,
            lines: number_lines(request.lines),
        };
        let stored = self.invoices.add(invoice).await?;
        tracing::info!(id = %stored.id(), number = %stored.number, "invoice created");
        self.details(&stored).await
    }
}

#[async_trait]
impl Handle<UpdateInvoice> for InvoiceHandlers {
    async fn handle(&self, request: UpdateInvoice) -> DomainResult<InvoiceDetails> {
        self.ensure_status(request.status_id).await?;

        let mut invoice = self
            .invoices
            .get_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(Invoice::KIND, request.id))?;

        invoice.number = request.number;
        invoice.company_id = request.company_id;
        invoice.status_id = request.status_id;
        invoice.issued_at = request.issued_at;
        invoice.due_at = request.due_at;
        invoice.lines = number_lines(request.lines);
        invoice.meta.audit.touch(request.actor, request.occurred_at);

        let stored = self.invoices.update(invoice, request.expected_version).await?;
        tracing::info!(id = %stored.id(), version = stored.version(), "invoice updated");
        self.details(&stored).await
    }
}

#[async_trait]
impl Handle<DeleteInvoice> for InvoiceHandlers {
    async fn handle(&self, request: DeleteInvoice) -> DomainResult<bool> {
        let deleted = self
            .invoices
            .delete(request.id, request.actor, request.occurred_at)
            .await?;
        if deleted {
            tracing::info!(id = %request.id, "invoice soft-deleted");
        }
        Ok(deleted)
    }
}
