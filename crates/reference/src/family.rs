//! Family markers: one zero-sized type per lookup family.
//!
//! A family is configuration, not architecture: adding one is a single
//! `family!` line plus store wiring.

/// Marker for one reference family (a "type", "status", "direction" or
/// "method" set).
pub trait Family: Copy + Eq + core::fmt::Debug + Send + Sync + 'static {
    /// Kind name used in errors and logs ("account type", "invoice status").
    const KIND: &'static str;
}

macro_rules! family {
    ($(#[$doc:meta])* $name:ident, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl Family for $name {
            const KIND: &'static str = $kind;
        }
    };
}

family!(
    /// Classification of a company account (prospect, customer, partner, ...).
    AccountType,
    "account type"
);
family!(
    /// Kind of a logged activity (call, meeting, email, ...).
    ActivityType,
    "activity type"
);
family!(
    /// Workflow state of an activity (open, completed, cancelled, ...).
    ActivityStatus,
    "activity status"
);
family!(
    /// Whether an activity was inbound or outbound.
    ActivityDirection,
    "activity direction"
);
family!(
    /// Preferred way to reach a person (email, phone, post, ...).
    ContactMethod,
    "contact method"
);
family!(
    /// Workflow state of an invoice (draft, sent, paid, void, ...).
    InvoiceStatus,
    "invoice status"
);
family!(
    /// Workflow state of a quote.
    QuoteStatus,
    "quote status"
);
family!(
    /// Workflow state of a sales order.
    SalesOrderStatus,
    "sales order status"
);
