//! Entity identity and the generic JSON-backed record.
//!
//! Every row the navigation core pages through exposes a stable [`EntityId`].
//! The id is validated at construction time - raw constructors are never exported.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable unique identifier of a navigable entity (payment, order, customer...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Smart constructor: validates non-empty id.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidEntityId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            Err(InvalidEntityId::Empty)
        } else {
            Ok(Self(raw))
        }
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityId {
    type Error = InvalidEntityId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Anything that can be paged through and selected by id.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The entity's stable identifier.
    fn id(&self) -> &EntityId;
}

/// A schemaless record: an `id` plus the remaining JSON fields.
///
/// The hosting viewer renders records generically, so no per-domain struct is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: EntityId,
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a JSON object.
    ///
    /// The `id` field may be a string or a number; numbers are stringified.
    pub fn from_value(value: Value) -> Result<Self, InvalidRecord> {
        let Value::Object(mut fields) = value else {
            return Err(InvalidRecord::NotAnObject);
        };

        let id = match fields.shift_remove("id") {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err(InvalidRecord::UnsupportedId),
            None => return Err(InvalidRecord::MissingId),
        };
        let id = EntityId::new(id).map_err(|_| InvalidRecord::MissingId)?;

        Ok(Self { id, fields })
    }

    /// All non-id fields in document order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Look up a single field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field rendered as display text (strings unquoted, null as empty).
    pub fn field_text(&self, name: &str) -> String {
        match self.fields.get(name) {
            Some(value) => display_value(value),
            None => String::new(),
        }
    }

    /// The record's `status` field, when it is a string.
    pub fn status(&self) -> Option<&str> {
        self.fields.get("status").and_then(Value::as_str)
    }

    /// Case-insensitive substring match over the id and every scalar field.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        if self.id.as_str().to_lowercase().contains(&needle) {
            return true;
        }
        self.fields.values().any(|value| match value {
            Value::String(s) => s.to_lowercase().contains(&needle),
            Value::Number(n) => n.to_string().contains(&needle),
            _ => false,
        })
    }
}

impl Entity for Record {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Render a JSON value as plain text for table cells and detail rows.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ===== Error Types =====

/// Entity id validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEntityId {
    /// Ids must contain at least one non-whitespace character.
    #[error("Entity ID cannot be empty")]
    Empty,
}

/// Record construction failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRecord {
    /// The JSON value was not an object.
    #[error("record must be a JSON object")]
    NotAnObject,
    /// The object had no usable `id`.
    #[error("record is missing a non-empty 'id' field")]
    MissingId,
    /// The `id` was neither a string nor a number.
    #[error("record 'id' must be a string or a number")]
    UnsupportedId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_id_rejects_empty_string() {
        assert_eq!(EntityId::new(""), Err(InvalidEntityId::Empty));
        assert_eq!(EntityId::new("   "), Err(InvalidEntityId::Empty));
    }

    #[test]
    fn entity_id_display_returns_inner_string() {
        let id = EntityId::new("pay_123").expect("valid id");
        assert_eq!(id.to_string(), "pay_123");
        assert_eq!(id.as_str(), "pay_123");
    }

    #[test]
    fn entity_id_deserialize_rejects_empty() {
        let result: Result<EntityId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn record_accepts_numeric_id() {
        let record = Record::from_value(json!({"id": 42, "status": "paid"})).expect("valid");
        assert_eq!(record.id().as_str(), "42");
        assert_eq!(record.status(), Some("paid"));
        assert!(record.field("id").is_none(), "id is lifted out of the field map");
    }

    #[test]
    fn record_keeps_document_order_after_lifting_id() {
        let record = Record::from_value(json!({
            "id": "pay_001",
            "status": "paid",
            "amount": 1200,
            "currency": "EUR",
            "customer": "Ada",
        }))
        .expect("valid");

        let names: Vec<&str> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(names, ["status", "amount", "currency", "customer"]);
    }

    #[test]
    fn record_rejects_non_objects_and_missing_ids() {
        assert_eq!(
            Record::from_value(json!([1, 2])),
            Err(InvalidRecord::NotAnObject)
        );
        assert_eq!(
            Record::from_value(json!({"status": "paid"})),
            Err(InvalidRecord::MissingId)
        );
        assert_eq!(
            Record::from_value(json!({"id": {"nested": true}})),
            Err(InvalidRecord::UnsupportedId)
        );
    }

    #[test]
    fn matches_query_is_case_insensitive_over_scalars() {
        let record = Record::from_value(json!({
            "id": "pay_1",
            "customer": "Ada Lovelace",
            "amount": 1250,
        }))
        .expect("valid");

        assert!(record.matches_query("lovelace"));
        assert!(record.matches_query("PAY_"));
        assert!(record.matches_query("125"));
        assert!(record.matches_query("  "));
        assert!(!record.matches_query("babbage"));
    }

    #[test]
    fn field_text_renders_strings_without_quotes() {
        let record =
            Record::from_value(json!({"id": "x", "name": "Ada", "vip": true, "note": null}))
                .expect("valid");
        assert_eq!(record.field_text("name"), "Ada");
        assert_eq!(record.field_text("vip"), "true");
        assert_eq!(record.field_text("note"), "");
        assert_eq!(record.field_text("missing"), "");
    }
}
