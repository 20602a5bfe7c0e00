use super::{
    mapper::{self, ENTITY_NAME, IS_DIRECTORY, MODIFIED_DATE, PARENT_UUID, UUID},
    models::{now, Entity, Folder},
};
use crate::{
    error::EntityFsError,
    store::{AttributeValue, Condition, Conditions, Item, ItemStore, PrimaryKey},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Entity operations on top of an [ItemStore]. Every call is a single round trip.
#[derive(Debug, Clone)]
pub struct TableManager {
    store: Arc<dyn ItemStore>,
}

impl TableManager {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// Create the table unless it already exists. Returns whether the table exists afterwards.
    pub async fn create_table(&self, table: &str) -> Result<bool, EntityFsError> {
        if self.store.table_exists(table).await? {
            debug!("Table {table} already exists");
            return Ok(true);
        }

        info!("Creating table {table}");
        Ok(self.store.create_table(table).await?)
    }

    pub async fn delete_table(&self, table: &str) -> Result<bool, EntityFsError> {
        info!("Deleting table {table}");
        Ok(self.store.delete_table(table).await?)
    }

    /// Check whether `parent` has a child called `entity_name`.
    /// A `None` parent checks among the roots.
    pub async fn is_exist_entity(
        &self,
        table: &str,
        parent: Option<&Folder>,
        entity_name: &str,
    ) -> Result<bool, EntityFsError> {
        if entity_name.is_empty() {
            return Ok(false);
        }

        let conditions = Conditions::from([
            (
                PARENT_UUID.to_string(),
                Condition::Eq(mapper::parent_value(parent.map(|p| p.id))),
            ),
            (
                ENTITY_NAME.to_string(),
                Condition::Eq(AttributeValue::s(entity_name)),
            ),
        ]);

        let items = self.store.scan(table, &conditions).await?;
        let children = mapper::to_entities(&items)?;

        Ok(!children.is_empty())
    }

    pub async fn put_entity(&self, table: &str, entity: &Entity) -> Result<bool, EntityFsError> {
        debug!("Putting {} ({}) into {table}", entity.name(), entity.id());
        Ok(self.store.put_item(table, mapper::to_item(entity)).await?)
    }

    pub async fn find_root_folder(&self, table: &str) -> Result<Option<Folder>, EntityFsError> {
        let conditions = Conditions::from([(
            PARENT_UUID.to_string(),
            Condition::Eq(mapper::parent_value(None)),
        )]);

        let items = self.store.scan(table, &conditions).await?;

        Ok(mapper::to_entities(&items)?
            .into_iter()
            .find_map(Entity::into_folder))
    }

    /// Look up the stored state of `entity`.
    pub async fn find_entity(
        &self,
        table: &str,
        entity: &Entity,
    ) -> Result<Option<Entity>, EntityFsError> {
        self.find_entity_by_unique_id(table, &entity.id().to_string())
            .await
    }

    pub async fn find_entity_by_unique_id(
        &self,
        table: &str,
        id: &str,
    ) -> Result<Option<Entity>, EntityFsError> {
        if id.is_empty() {
            return Ok(None);
        }

        let item = self.store.get_item(table, &primary_key(id)).await?;

        Ok(item.as_ref().map(mapper::to_entity).transpose()?)
    }

    /// All children of `parent`. Returns nothing without a parent.
    pub async fn find_entity_by_parent(
        &self,
        table: &str,
        parent: Option<&Folder>,
    ) -> Result<Vec<Entity>, EntityFsError> {
        let Some(parent) = parent else {
            return Ok(vec![]);
        };

        let conditions = Conditions::from([(
            PARENT_UUID.to_string(),
            Condition::Eq(mapper::parent_value(Some(parent.id))),
        )]);

        let items = self.store.scan(table, &conditions).await?;
        Ok(mapper::to_entities(&items)?)
    }

    /// Children of `parent` that are either folders or files.
    pub async fn find_entity_by_parent_and_type(
        &self,
        table: &str,
        parent: Option<&Folder>,
        is_directory: bool,
    ) -> Result<Vec<Entity>, EntityFsError> {
        let Some(parent) = parent else {
            return Ok(vec![]);
        };

        let conditions = Conditions::from([
            (
                PARENT_UUID.to_string(),
                Condition::Eq(mapper::parent_value(Some(parent.id))),
            ),
            (
                IS_DIRECTORY.to_string(),
                Condition::Eq(mapper::directory_value(is_directory)),
            ),
        ]);

        let items = self.store.scan(table, &conditions).await?;
        Ok(mapper::to_entities(&items)?)
    }

    /// Rename `entity` and, unless `is_renaming` is set, move it under `new_parent`.
    /// The modification time is always refreshed.
    pub async fn update_entity_by_unique_id(
        &self,
        table: &str,
        entity: &Entity,
        new_parent: &Folder,
        new_name: &str,
        is_renaming: bool,
    ) -> Result<bool, EntityFsError> {
        let mut updates = Item::from([
            (ENTITY_NAME.to_string(), AttributeValue::s(new_name)),
            (MODIFIED_DATE.to_string(), mapper::timestamp_value(now())),
        ]);

        if !is_renaming {
            updates.insert(
                PARENT_UUID.to_string(),
                mapper::parent_value(Some(new_parent.id)),
            );
        }

        debug!(
            "Updating {} in {table}, renaming only: {is_renaming}",
            entity.id()
        );

        Ok(self
            .store
            .update_item(table, &primary_key(&entity.id().to_string()), updates)
            .await?)
    }

    pub async fn delete_entity_by_unique_id(
        &self,
        table: &str,
        id: &str,
    ) -> Result<bool, EntityFsError> {
        if id.is_empty() {
            return Ok(false);
        }

        debug!("Deleting {id} from {table}");
        Ok(self.store.delete_item(table, &primary_key(id)).await?)
    }
}

fn primary_key(id: &str) -> PrimaryKey {
    PrimaryKey::new(UUID, AttributeValue::s(id))
}
