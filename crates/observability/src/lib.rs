//! `anchorcrm-observability` — process-wide tracing setup.

pub mod tracing;

pub use tracing::{LogFormat, init, init_with};
