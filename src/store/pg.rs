use super::{validate_table_name, Condition, Conditions, Item, ItemStore, PrimaryKey, StoreError};
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use tracing::{debug, info};

/// Postgres error code for a missing relation.
const UNDEFINED_TABLE: &str = "42P01";

/// Item store on top of Postgres. Every item table is a SQL table of
/// `(key TEXT PRIMARY KEY, item JSONB)` rows.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    hash_key: String,
}

impl PgStore {
    pub fn new(pool: PgPool, hash_key: impl Into<String>) -> Self {
        Self {
            pool,
            hash_key: hash_key.into(),
        }
    }

    pub async fn connect(url: &str, hash_key: impl Into<String>) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPool::connect(url).await?;
        Ok(Self::new(pool, hash_key))
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

/// Validated and quoted table identifier, safe to interpolate.
fn ident(table: &str) -> Result<String, StoreError> {
    validate_table_name(table)?;
    Ok(format!("\"{table}\""))
}

fn map_err(table: &str, error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Database(e) if e.code().as_deref() == Some(UNDEFINED_TABLE) => {
            StoreError::TableNotFound(table.to_string())
        }
        _ => StoreError::Database(error),
    }
}

/// Build a JSONB containment filter out of equality conditions.
fn containment_filter(conditions: &Conditions) -> Result<serde_json::Value, StoreError> {
    let mut filter = serde_json::Map::new();
    for (attribute, condition) in conditions {
        let Condition::Eq(value) = condition;
        filter.insert(attribute.clone(), serde_json::to_value(value)?);
    }
    Ok(serde_json::Value::Object(filter))
}

#[async_trait]
impl ItemStore for PgStore {
    async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn create_table(&self, table: &str) -> Result<bool, StoreError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY, item JSONB NOT NULL)",
            ident(table)?
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        info!("Created table {table}");
        Ok(true)
    }

    async fn delete_table(&self, table: &str) -> Result<bool, StoreError> {
        if !self.table_exists(table).await? {
            return Ok(false);
        }
        let sql = format!("DROP TABLE {}", ident(table)?);
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err(table, e))?;
        info!("Dropped table {table}");
        Ok(true)
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<bool, StoreError> {
        let key = item
            .get(&self.hash_key)
            .ok_or_else(|| StoreError::MissingKey(self.hash_key.clone()))?
            .as_str()
            .to_string();

        let sql = format!(
            "INSERT INTO {} (key, item) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET item = EXCLUDED.item",
            ident(table)?
        );
        sqlx::query(&sql)
            .bind(key)
            .bind(Json(item))
            .execute(&self.pool)
            .await
            .map_err(|e| map_err(table, e))?;
        Ok(true)
    }

    async fn get_item(&self, table: &str, key: &PrimaryKey) -> Result<Option<Item>, StoreError> {
        let key = self.check_key(key)?;
        let sql = format!("SELECT item FROM {} WHERE key = $1", ident(table)?);
        let item = sqlx::query_scalar::<_, Json<Item>>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_err(table, e))?;
        Ok(item.map(|Json(item)| item))
    }

    async fn scan(&self, table: &str, conditions: &Conditions) -> Result<Vec<Item>, StoreError> {
        let filter = containment_filter(conditions)?;
        debug!("Scanning {table} with {filter}");

        let sql = format!(
            "SELECT item FROM {} WHERE item @> $1 ORDER BY key",
            ident(table)?
        );
        Ok(sqlx::query_scalar::<_, Json<Item>>(&sql)
            .bind(Json(filter))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_err(table, e))?
            .into_iter()
            .map(|Json(item)| item)
            .collect())
    }

    async fn update_item(
        &self,
        table: &str,
        key: &PrimaryKey,
        updates: Item,
    ) -> Result<bool, StoreError> {
        let key = self.check_key(key)?;
        let sql = format!(
            "UPDATE {} SET item = item || $2 WHERE key = $1",
            ident(table)?
        );
        let result = sqlx::query(&sql)
            .bind(key)
            .bind(Json(updates))
            .execute(&self.pool)
            .await
            .map_err(|e| map_err(table, e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_item(&self, table: &str, key: &PrimaryKey) -> Result<bool, StoreError> {
        let key = self.check_key(key)?;
        let sql = format!("DELETE FROM {} WHERE key = $1", ident(table)?);
        let result = sqlx::query(&sql)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err(table, e))?;
        debug!("Deleted {} rows from {table}", result.rows_affected());
        Ok(true)
    }
}
