//! Item request and response schemas.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Storage-generated item identifier (`SERIAL`).
pub type ItemId = i32;

/// Identifier as accepted from clients. Wider than [`ItemId`]; a value
/// outside the column's range simply matches no row.
pub type ItemKey = i64;

/// Default page size for listing.
pub const DEFAULT_LIMIT: i64 = 100;

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct NewItem {
    /// Task name.
    #[schema(example = "Buy groceries")]
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A stored item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema, sqlx::FromRow)]
pub struct Item {
    /// Identifier assigned on insert.
    pub id: ItemId,
    /// Task name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
}

/// Offset/limit query for listing.
///
/// Values are handed to the database untouched, so a negative limit is a
/// statement fault rather than a client error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Rows to skip.
    #[serde(default)]
    pub skip: i64,
    /// Maximum rows to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_description_is_optional() {
        let item: NewItem = serde_json::from_str(r#"{"name": "A"}"#).unwrap();
        assert_eq!(item.name, "A");
        assert_eq!(item.description, None);
    }

    #[test]
    fn new_item_requires_name() {
        let result = serde_json::from_str::<NewItem>(r#"{"description": "B"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn item_serializes_missing_description_as_null() {
        let item = Item {
            id: 1,
            name: "A".to_string(),
            description: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["description"], serde_json::Value::Null);
    }
}
