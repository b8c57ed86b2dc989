//! Composable validation rule sets.
//!
//! A rule is a named predicate over one request field; a rule set is an
//! ordered collection of rules that collects **every** failing field before
//! reporting. Rule sets compose by merging, so shared rules (id presence,
//! pagination bounds, text length) are written once and combined freely —
//! composition over inheritance.

use anchorcrm_core::{DomainResult, EntityId, ValidationErrors};

use crate::page::{MAX_PAGE_SIZE, Page};

type RuleFn<R> = Box<dyn Fn(&R, &mut ValidationErrors) + Send + Sync>;

/// All validation rules for one request type.
pub struct RuleSet<R> {
    rules: Vec<RuleFn<R>>,
}

impl<R> RuleSet<R> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append one rule.
    pub fn rule(mut self, rule: impl Fn(&R, &mut ValidationErrors) + Send + Sync + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Append every rule of another set. The base set's rules run first.
    pub fn merge(mut self, other: RuleSet<R>) -> Self {
        self.rules.extend(other.rules);
        self
    }

    /// Run every rule; `Ok(())` only when no rule pushed a diagnostic.
    pub fn check(&self, request: &R) -> DomainResult<()> {
        let mut errors = ValidationErrors::new();
        for rule in &self.rules {
            rule(request, &mut errors);
        }
        errors.into_result()
    }
}

impl<R> Default for RuleSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// The identifier must not be the nil UUID.
pub fn required_id<R>(
    field: &'static str,
    get: impl Fn(&R) -> EntityId + Send + Sync + 'static,
) -> impl Fn(&R, &mut ValidationErrors) + Send + Sync + 'static {
    move |request, errors| {
        if get(request).is_nil() {
            errors.push(field, "required", format!("{field} must be a non-nil identifier"));
        }
    }
}

/// An optional identifier, when present, must not be the nil UUID.
pub fn optional_id<R>(
    field: &'static str,
    get: impl Fn(&R) -> Option<EntityId> + Send + Sync + 'static,
) -> impl Fn(&R, &mut ValidationErrors) + Send + Sync + 'static {
    move |request, errors| {
        if get(request).is_some_and(|id| id.is_nil()) {
            errors.push(field, "required", format!("{field} must be a non-nil identifier"));
        }
    }
}

/// Non-empty text, at most `max` characters.
pub fn required_text<R>(
    field: &'static str,
    max: usize,
    get: impl for<'a> Fn(&'a R) -> &'a str + Send + Sync + 'static,
) -> impl Fn(&R, &mut ValidationErrors) + Send + Sync + 'static {
    move |request, errors| {
        let text = get(request);
        if text.trim().is_empty() {
            errors.push(field, "required", format!("{field} must not be empty"));
        } else if text.chars().count() > max {
            errors.push(field, "max_length", format!("{field} must be at most {max} characters"));
        }
    }
}

/// Optional text, at most `max` characters when present.
pub fn optional_text<R>(
    field: &'static str,
    max: usize,
    get: impl for<'a> Fn(&'a R) -> Option<&'a str> + Send + Sync + 'static,
) -> impl Fn(&R, &mut ValidationErrors) + Send + Sync + 'static {
    move |request, errors| {
        if let Some(text) = get(request) {
            if text.chars().count() > max {
                errors.push(field, "max_length", format!("{field} must be at most {max} characters"));
            }
        }
    }
}

/// Pagination bounds: `number >= 1`, `1 <= size <= 100`.
pub fn page_bounds<R>(
    get: impl Fn(&R) -> Page + Send + Sync + 'static,
) -> impl Fn(&R, &mut ValidationErrors) + Send + Sync + 'static {
    move |request, errors| {
        let page = get(request);
        if page.number < 1 {
            errors.push("page_number", "range", "page number must be at least 1");
        }
        if page.size < 1 || page.size > MAX_PAGE_SIZE {
            errors.push(
                "page_size",
                "range",
                format!("page size must be between 1 and {MAX_PAGE_SIZE}"),
            );
        }
    }
}
