//! Line-item input shape and validation, shared by invoices and orders.

use serde::{Deserialize, Serialize};

use anchorcrm_core::ValidationErrors;
use anchorcrm_pipeline::RuleSet;

pub const MAX_LINE_DESCRIPTION_LEN: usize = 200;

/// One requested line on a document command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub description: String,
    pub quantity: u32,
    /// Price per unit in minor currency units.
    pub unit_price_minor: i64,
}

/// A document must carry at least one well-formed line.
pub fn line_rules<R>(
    get: impl for<'a> Fn(&'a R) -> &'a [LineInput] + Send + Sync + 'static,
) -> RuleSet<R> {
    RuleSet::new().rule(move |request: &R, errors: &mut ValidationErrors| {
        let lines = get(request);
        if lines.is_empty() {
            errors.push("lines", "required", "at least one line is required");
            return;
        }
        for (index, line) in lines.iter().enumerate() {
            let line_no = index + 1;
            if line.description.trim().is_empty() {
                errors.push(
                    "lines",
                    "line_description",
                    format!("line {line_no}: description must not be empty"),
                );
            } else if line.description.chars().count() > MAX_LINE_DESCRIPTION_LEN {
                errors.push(
                    "lines",
                    "line_description",
                    format!(
                        "line {line_no}: description must be at most {MAX_LINE_DESCRIPTION_LEN} characters"
                    ),
                );
            }
            if line.quantity < 1 {
                errors.push(
                    "lines",
                    "line_quantity",
                    format!("line {line_no}: quantity must be at least 1"),
                );
            }
            if line.unit_price_minor < 0 {
                errors.push(
                    "lines",
                    "line_unit_price",
                    format!("line {line_no}: unit price must not be negative"),
                );
            }
        }
    })
}
