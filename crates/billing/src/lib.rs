//! `anchorcrm-billing` — invoices and sales orders.
//!
//! Documents are a parent record plus a small owned set of lines; one
//! command mutates the parent and its lines together. Amounts are integer
//! minor units; totals are derived at query time and never stored.

pub mod invoice;
pub mod line;
pub mod order;

pub use invoice::{
    CreateInvoice, DeleteInvoice, GetInvoiceById, Invoice, InvoiceDetails, InvoiceHandlers,
    InvoiceLine, InvoiceListItem, ListInvoices, UpdateInvoice,
};
pub use line::LineInput;
pub use order::{
    CreateSalesOrder, DeleteSalesOrder, GetSalesOrderById, ListSalesOrders, OrderLine, SalesOrder,
    SalesOrderDetails, SalesOrderHandlers, SalesOrderListItem, UpdateSalesOrder,
};
