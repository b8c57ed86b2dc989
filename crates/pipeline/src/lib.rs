//! `anchorcrm-pipeline` — the uniform request/response pipeline.
//!
//! Every entity family conforms to the same contract: a plain-data request,
//! a composable validation rule set, one handler per request type, and a
//! projection seam for the tiered DTO shapes. The dispatcher routes a request
//! to its registered handler after the validation gate.

pub mod dispatch;
pub mod handler;
pub mod page;
pub mod project;
pub mod request;
pub mod validate;

pub use dispatch::Dispatcher;
pub use handler::{Handle, execute};
pub use page::{MAX_PAGE_SIZE, Page, PageOf};
pub use project::{ProjectFrom, project_all};
pub use request::{Command, Query, Request};
pub use validate::RuleSet;
