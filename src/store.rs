use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use self::{memory::MemoryStore, pg::PgStore};

pub mod memory;
pub mod pg;

/// A single stored row, attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// Equality conditions keyed by attribute name. All of them must hold for an item to match.
pub type Conditions = HashMap<String, Condition>;

/// Scalar attribute value. Numbers are kept in their decimal string form.
///
/// Serializes as `{"S": "..."}` / `{"N": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
}

impl AttributeValue {
    pub fn s(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    pub fn n(value: impl ToString) -> Self {
        Self::N(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::S(s) | Self::N(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Eq(AttributeValue),
}

impl Condition {
    pub fn matches(&self, value: Option<&AttributeValue>) -> bool {
        match self {
            Condition::Eq(expected) => value.is_some_and(|value| value == expected),
        }
    }
}

/// Primary key lookup, the hash key attribute and its value.
#[derive(Debug, Clone)]
pub struct PrimaryKey {
    pub name: String,
    pub value: AttributeValue,
}

impl PrimaryKey {
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    #[error("item is missing hash key attribute '{0}'")]
    MissingKey(String),

    #[error("expected hash key '{expected}', got '{actual}'")]
    KeyMismatch { expected: String, actual: String },
}

/// Client interface of a key-value item store.
///
/// Every method is a single round trip. The boolean results of the write operations
/// report whether the store accepted the call.
#[async_trait]
pub trait ItemStore: Send + Sync + std::fmt::Debug {
    async fn table_exists(&self, table: &str) -> Result<bool, StoreError>;

    async fn create_table(&self, table: &str) -> Result<bool, StoreError>;

    /// Returns `false` if the table did not exist.
    async fn delete_table(&self, table: &str) -> Result<bool, StoreError>;

    /// Insert `item`, replacing any item with the same hash key.
    async fn put_item(&self, table: &str, item: Item) -> Result<bool, StoreError>;

    async fn get_item(&self, table: &str, key: &PrimaryKey) -> Result<Option<Item>, StoreError>;

    /// All items matching every condition, ordered by hash key.
    async fn scan(&self, table: &str, conditions: &Conditions) -> Result<Vec<Item>, StoreError>;

    /// Put `updates` onto the existing item. Returns `false` if there is no item with the key.
    async fn update_item(
        &self,
        table: &str,
        key: &PrimaryKey,
        updates: Item,
    ) -> Result<bool, StoreError>;

    /// Deleting an absent key is accepted.
    async fn delete_item(&self, table: &str, key: &PrimaryKey) -> Result<bool, StoreError>;
}

/// Table names are 3 to 255 characters of `[A-Za-z0-9_.-]`.
pub fn validate_table_name(table: &str) -> Result<(), StoreError> {
    let valid = (3..=255).contains(&table.len())
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if !valid {
        return Err(StoreError::InvalidTableName(table.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_value_uses_type_tags() {
        let json = serde_json::to_string(&AttributeValue::s("foo")).unwrap();
        assert_eq!(r#"{"S":"foo"}"#, json);

        let json = serde_json::to_string(&AttributeValue::n(1)).unwrap();
        assert_eq!(r#"{"N":"1"}"#, json);
    }

    #[test]
    fn eq_condition_requires_attribute() {
        let condition = Condition::Eq(AttributeValue::s("foo"));

        assert!(condition.matches(Some(&AttributeValue::s("foo"))));
        assert!(!condition.matches(Some(&AttributeValue::s("bar"))));
        assert!(!condition.matches(Some(&AttributeValue::N("foo".to_string()))));
        assert!(!condition.matches(None));
    }

    #[test]
    fn table_names() {
        assert!(validate_table_name("entities").is_ok());
        assert!(validate_table_name("webdav.entities-v1_2").is_ok());
        assert!(validate_table_name("ab").is_err());
        assert!(validate_table_name("drop\"table").is_err());
        assert!(validate_table_name(&"a".repeat(256)).is_err());
    }
}
