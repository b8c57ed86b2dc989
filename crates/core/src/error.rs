//! Domain error model.

use serde::Serialize;
use thiserror::Error;

use crate::id::EntityId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// One field-level validation diagnostic: which field, which rule, why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub rule: &'static str,
    pub message: String,
}

/// All diagnostics collected from a single validation pass.
///
/// Validation never short-circuits; callers get every failing field at once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: &'static str, rule: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            rule,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Convert into a result: `Ok(())` when no diagnostics were collected.
    pub fn into_result(self) -> DomainResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing records, stale writes). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A request failed validation; never reaches a handler.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// A get-by-id or get-default found no matching record.
    #[error("{entity} not found: {detail}")]
    NotFound {
        entity: &'static str,
        detail: String,
    },

    /// A stale write or duplicate creation (optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// No handler is registered for the request type.
    #[error("unsupported request: {0}")]
    Unsupported(String),

    /// Any collaborator failure not anticipated by the above; logged with
    /// context and propagated unchanged.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: EntityId) -> Self {
        Self::NotFound {
            entity,
            detail: id.to_string(),
        }
    }

    /// The family has no active member to act as the default.
    pub fn no_default(entity: &'static str) -> Self {
        Self::NotFound {
            entity,
            detail: "no active default".to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Single-field validation failure without going through a rule set.
    pub fn field(field: &'static str, rule: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.push(field, rule, message);
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diagnostics_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn diagnostics_collect_every_field() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "required", "name must not be empty");
        errors.push("page_size", "range", "page size must be between 1 and 100");

        let err = errors.into_result().unwrap_err();
        match err {
            DomainError::Validation(v) => {
                assert_eq!(v.errors().len(), 2);
                assert_eq!(v.errors()[0].field, "name");
                assert_eq!(v.errors()[1].rule, "range");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn not_found_display_names_the_entity() {
        let id = EntityId::nil();
        let err = DomainError::not_found("person", id);
        assert!(err.to_string().contains("person not found"));
    }
}
