//! `anchorcrm-reference` — shared lifecycle for reference (lookup) entities.
//!
//! Every lookup family (types, statuses, directions, methods) obeys the same
//! rules: ordinal-position ordering, default selection, soft deletion, and
//! tiered projections with a derived usage count. This crate implements that
//! lifecycle once, generically over a family marker, and instantiates it for
//! each family the system carries.

pub mod dto;
pub mod family;
pub mod handlers;
pub mod item;
pub mod requests;

pub use dto::{ReferenceDetails, ReferenceListItem, ReferenceSummary};
pub use family::{
    AccountType, ActivityDirection, ActivityStatus, ActivityType, ContactMethod, Family,
    InvoiceStatus, QuoteStatus, SalesOrderStatus,
};
pub use handlers::ReferenceHandlers;
pub use item::ReferenceItem;
pub use requests::{
    CreateReference, DeleteReference, GetDefaultReference, GetReferenceById, ListReferences,
    UpdateReference,
};
