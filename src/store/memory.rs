use super::{Conditions, Item, ItemStore, PrimaryKey, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

type Table = BTreeMap<String, Item>;

/// In-process item store. Tables live as long as the store does.
#[derive(Debug)]
pub struct MemoryStore {
    hash_key: String,
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new(hash_key: impl Into<String>) -> Self {
        Self {
            hash_key: hash_key.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    fn check_key<'a>(&self, key: &'a PrimaryKey) -> Result<&'a str, StoreError> {
        if key.name != self.hash_key {
            return Err(StoreError::KeyMismatch {
                expected: self.hash_key.clone(),
                actual: key.name.clone(),
            });
        }
        Ok(key.value.as_str())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.contains_key(table))
    }

    async fn create_table(&self, table: &str) -> Result<bool, StoreError> {
        super::validate_table_name(table)?;
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default();
        Ok(true)
    }

    async fn delete_table(&self, table: &str) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.remove(table).is_some())
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<bool, StoreError> {
        let key = item
            .get(&self.hash_key)
            .ok_or_else(|| StoreError::MissingKey(self.hash_key.clone()))?
            .as_str()
            .to_string();

        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        rows.insert(key, item);
        Ok(true)
    }

    async fn get_item(&self, table: &str, key: &PrimaryKey) -> Result<Option<Item>, StoreError> {
        let key = self.check_key(key)?;
        let tables = self.tables.read().await;
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        Ok(rows.get(key).cloned())
    }

    async fn scan(&self, table: &str, conditions: &Conditions) -> Result<Vec<Item>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let items = rows
            .values()
            .filter(|item| {
                conditions
                    .iter()
                    .all(|(attribute, condition)| condition.matches(item.get(attribute)))
            })
            .cloned()
            .collect::<Vec<_>>();

        debug!("Scanned {} items from {table}", items.len());

        Ok(items)
    }

    async fn update_item(
        &self,
        table: &str,
        key: &PrimaryKey,
        updates: Item,
    ) -> Result<bool, StoreError> {
        let key = self.check_key(key)?;
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let Some(item) = rows.get_mut(key) else {
            return Ok(false);
        };

        item.extend(updates);
        Ok(true)
    }

    async fn delete_item(&self, table: &str, key: &PrimaryKey) -> Result<bool, StoreError> {
        let key = self.check_key(key)?;
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        rows.remove(key);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AttributeValue, Condition};

    fn item(id: &str, color: &str) -> Item {
        Item::from([
            ("id".to_string(), AttributeValue::s(id)),
            ("color".to_string(), AttributeValue::s(color)),
        ])
    }

    fn key(id: &str) -> PrimaryKey {
        PrimaryKey::new("id", AttributeValue::s(id))
    }

    #[tokio::test]
    async fn table_lifecycle() {
        let store = MemoryStore::new("id");

        assert!(!store.table_exists("things").await.unwrap());
        assert!(store.create_table("things").await.unwrap());
        assert!(store.table_exists("things").await.unwrap());
        assert!(store.delete_table("things").await.unwrap());
        assert!(!store.delete_table("things").await.unwrap());
    }

    #[tokio::test]
    async fn missing_table_is_an_error() {
        let store = MemoryStore::new("id");

        let result = store.put_item("things", item("a", "red")).await;
        assert!(matches!(result, Err(StoreError::TableNotFound(_))));

        let result = store.get_item("things", &key("a")).await;
        assert!(matches!(result, Err(StoreError::TableNotFound(_))));
    }

    #[tokio::test]
    async fn put_replaces_and_requires_key() {
        let store = MemoryStore::new("id");
        store.create_table("things").await.unwrap();

        store.put_item("things", item("a", "red")).await.unwrap();
        store.put_item("things", item("a", "blue")).await.unwrap();

        let found = store.get_item("things", &key("a")).await.unwrap().unwrap();
        assert_eq!(Some(&AttributeValue::s("blue")), found.get("color"));

        let mut keyless = item("b", "red");
        keyless.remove("id");
        let result = store.put_item("things", keyless).await;
        assert!(matches!(result, Err(StoreError::MissingKey(_))));
    }

    #[tokio::test]
    async fn scan_filters_and_orders_by_key() {
        let store = MemoryStore::new("id");
        store.create_table("things").await.unwrap();

        store.put_item("things", item("c", "red")).await.unwrap();
        store.put_item("things", item("a", "red")).await.unwrap();
        store.put_item("things", item("b", "blue")).await.unwrap();

        let conditions =
            Conditions::from([("color".to_string(), Condition::Eq(AttributeValue::s("red")))]);
        let items = store.scan("things", &conditions).await.unwrap();

        let ids = items
            .iter()
            .map(|item| item["id"].as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["a", "c"], ids);
    }

    #[tokio::test]
    async fn update_only_touches_existing_items() {
        let store = MemoryStore::new("id");
        store.create_table("things").await.unwrap();
        store.put_item("things", item("a", "red")).await.unwrap();

        let updates = Item::from([("color".to_string(), AttributeValue::s("green"))]);
        assert!(store
            .update_item("things", &key("a"), updates.clone())
            .await
            .unwrap());
        assert!(!store.update_item("things", &key("z"), updates).await.unwrap());

        let found = store.get_item("things", &key("a")).await.unwrap().unwrap();
        assert_eq!(Some(&AttributeValue::s("green")), found.get("color"));
        assert!(store.get_item("things", &key("z")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_accepted_for_absent_keys() {
        let store = MemoryStore::new("id");
        store.create_table("things").await.unwrap();
        store.put_item("things", item("a", "red")).await.unwrap();

        assert!(store.delete_item("things", &key("a")).await.unwrap());
        assert!(store.delete_item("things", &key("a")).await.unwrap());
        assert!(store.get_item("things", &key("a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_key_attribute() {
        let store = MemoryStore::new("id");
        store.create_table("things").await.unwrap();

        let result = store
            .get_item("things", &PrimaryKey::new("name", AttributeValue::s("a")))
            .await;
        assert!(matches!(result, Err(StoreError::KeyMismatch { .. })));
    }
}
