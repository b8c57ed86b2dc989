//! Tiered projections for reference items.

use chrono::{DateTime, Utc};
use serde::Serialize;

use anchorcrm_core::{EntityId, Record};
use anchorcrm_pipeline::ProjectFrom;

use crate::family::Family;
use crate::item::ReferenceItem;

/// Core fields only; nested inside other entities' details shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSummary {
    pub id: EntityId,
    pub name: String,
}

/// Minimal display fields, in ordinal order, for enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceListItem {
    pub id: EntityId,
    pub name: String,
    pub ordinal: i32,
}

/// Full field set plus the derived usage count.
///
/// `usage_count` is `Some` only when a counting source is wired for the
/// family; `None` means "not computed", never an implicit zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceDetails {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub ordinal: i32,
    pub active: bool,
    pub version: u64,
    pub usage_count: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ReferenceDetails {
    pub fn with_usage(mut self, usage_count: Option<u64>) -> Self {
        self.usage_count = usage_count;
        self
    }
}

impl<F: Family> ProjectFrom<ReferenceItem<F>> for ReferenceSummary {
    fn project(item: &ReferenceItem<F>) -> Self {
        Self {
            id: item.id(),
            name: item.name.clone(),
        }
    }
}

impl<F: Family> ProjectFrom<ReferenceItem<F>> for ReferenceListItem {
    fn project(item: &ReferenceItem<F>) -> Self {
        Self {
            id: item.id(),
            name: item.name.clone(),
            ordinal: item.ordinal,
        }
    }
}

impl<F: Family> ProjectFrom<ReferenceItem<F>> for ReferenceDetails {
    fn project(item: &ReferenceItem<F>) -> Self {
        Self {
            id: item.id(),
            name: item.name.clone(),
            description: item.description.clone(),
            ordinal: item.ordinal,
            active: item.is_active(),
            version: item.version(),
            usage_count: None,
            created_at: item.meta.audit.created_at,
            modified_at: item.meta.audit.modified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    use anchorcrm_core::{EntityId, UserId};

    use crate::family::AccountType;

    fn item() -> ReferenceItem<AccountType> {
        ReferenceItem::new(
            EntityId::new(),
            "Customer",
            Some("paying account".to_string()),
            2,
            UserId::new(),
            Utc::now(),
        )
    }

    #[test]
    fn details_serialize_with_the_projected_fields() {
        let item = item();
        let details = ReferenceDetails::project(&item).with_usage(Some(3));

        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["id"], json!(item.id().to_string()));
        assert_eq!(value["name"], json!("Customer"));
        assert_eq!(value["ordinal"], json!(2));
        assert_eq!(value["version"], json!(1));
        assert_eq!(value["usage_count"], json!(3));
    }

    #[test]
    fn deferred_usage_serializes_as_null_not_zero() {
        let details = ReferenceDetails::project(&item());

        let value = serde_json::to_value(&details).unwrap();
        assert!(value["usage_count"].is_null());
    }

    #[test]
    fn summary_carries_only_id_and_name() {
        let summary = ReferenceSummary::project(&item());

        let value = serde_json::to_value(&summary).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["id", "name"]);
    }
}
