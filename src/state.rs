use std::{collections::HashSet, sync::Arc};
use tracing::{info, warn};

use crate::{
    entity::{Entity, File, Folder, TableManager},
    error::EntityFsError,
};

/// Entity operations on the configured table, as used by the HTTP handlers.
#[derive(Debug, Clone)]
pub struct Entities {
    pub db: TableManager,

    pub table: Arc<str>,
}

impl Entities {
    pub fn new(db: TableManager, table: &str) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }

    /// Make sure the table and its root folder exist.
    pub async fn init(&self, root_name: &str) -> Result<Folder, EntityFsError> {
        if !self.db.create_table(&self.table).await? {
            return Err(EntityFsError::Config(format!(
                "unable to create table {}",
                self.table
            )));
        }

        if let Some(root) = self.db.find_root_folder(&self.table).await? {
            info!("Using root folder {} ({})", root.name, root.id);
            return Ok(root);
        }

        let root = Folder::root(root_name);
        self.db
            .put_entity(&self.table, &Entity::from(root.clone()))
            .await?;
        info!("Created root folder {} ({})", root.name, root.id);

        Ok(root)
    }

    pub async fn root(&self) -> Result<Folder, EntityFsError> {
        self.db
            .find_root_folder(&self.table)
            .await?
            .ok_or_else(|| EntityFsError::NotFound("root folder".to_string()))
    }

    pub async fn get(&self, id: uuid::Uuid) -> Result<Entity, EntityFsError> {
        self.db
            .find_entity_by_unique_id(&self.table, &id.to_string())
            .await?
            .ok_or_else(|| EntityFsError::NotFound(id.to_string()))
    }

    pub async fn folder(&self, id: uuid::Uuid) -> Result<Folder, EntityFsError> {
        self.get(id)
            .await?
            .into_folder()
            .ok_or_else(|| EntityFsError::BadRequest(format!("{id}: not a folder")))
    }

    /// Children of a folder, optionally only folders or only files.
    pub async fn children(
        &self,
        id: uuid::Uuid,
        is_directory: Option<bool>,
    ) -> Result<Vec<Entity>, EntityFsError> {
        let parent = self.folder(id).await?;
        match is_directory {
            Some(is_directory) => {
                self.db
                    .find_entity_by_parent_and_type(&self.table, Some(&parent), is_directory)
                    .await
            }
            None => {
                self.db
                    .find_entity_by_parent(&self.table, Some(&parent))
                    .await
            }
        }
    }

    pub async fn create_folder(
        &self,
        parent: uuid::Uuid,
        name: &str,
    ) -> Result<Folder, EntityFsError> {
        let parent = self.folder(parent).await?;
        self.check_free(&parent, name).await?;

        let folder = Folder::new(name, &parent);
        self.db
            .put_entity(&self.table, &Entity::from(folder.clone()))
            .await?;

        Ok(folder)
    }

    pub async fn create_file(
        &self,
        parent: uuid::Uuid,
        name: &str,
        content_type: Option<String>,
        content_length: u64,
    ) -> Result<File, EntityFsError> {
        let parent = self.folder(parent).await?;
        self.check_free(&parent, name).await?;

        let file = File::new(name, &parent, content_type, content_length);
        self.db
            .put_entity(&self.table, &Entity::from(file.clone()))
            .await?;

        Ok(file)
    }

    /// Rename the entity, and move it to `new_parent` when one is given.
    pub async fn update(
        &self,
        id: uuid::Uuid,
        new_name: &str,
        new_parent: Option<uuid::Uuid>,
    ) -> Result<Entity, EntityFsError> {
        let entity = self.get(id).await?;

        let Some(current_parent) = entity.parent() else {
            return Err(EntityFsError::BadRequest(
                "the root folder cannot be renamed or moved".to_string(),
            ));
        };

        let is_renaming = new_parent.map_or(true, |parent| parent == current_parent);
        let target = self.folder(new_parent.unwrap_or(current_parent)).await?;

        if !is_renaming && entity.is_directory() && self.is_within(&target, entity.id()).await? {
            return Err(EntityFsError::BadRequest(
                "a folder cannot be moved into itself".to_string(),
            ));
        }

        if new_name != entity.name() || !is_renaming {
            self.check_free(&target, new_name).await?;
        }

        let updated = self
            .db
            .update_entity_by_unique_id(&self.table, &entity, &target, new_name, is_renaming)
            .await?;

        if !updated {
            return Err(EntityFsError::NotFound(id.to_string()));
        }

        self.get(id).await
    }

    pub async fn delete(&self, id: uuid::Uuid) -> Result<(), EntityFsError> {
        let entity = self.get(id).await?;

        if entity.parent().is_none() {
            return Err(EntityFsError::BadRequest(
                "the root folder cannot be deleted".to_string(),
            ));
        }

        if entity.is_directory()
            && !self
                .db
                .find_entity_by_parent(&self.table, entity.as_folder())
                .await?
                .is_empty()
        {
            return Err(EntityFsError::Conflict(format!(
                "{}: folder is not empty",
                entity.name()
            )));
        }

        self.db
            .delete_entity_by_unique_id(&self.table, &id.to_string())
            .await?;

        Ok(())
    }

    /// Whether `folder` is `ancestor` or lies somewhere below it.
    /// Stored parent links that loop back on themselves are a conflict.
    async fn is_within(&self, folder: &Folder, ancestor: uuid::Uuid) -> Result<bool, EntityFsError> {
        let mut visited = HashSet::new();
        let mut current = Some(folder.clone());
        while let Some(folder) = current {
            if folder.id == ancestor {
                return Ok(true);
            }
            if !visited.insert(folder.id) {
                return Err(EntityFsError::Conflict(format!(
                    "{}: parent cycle",
                    folder.id
                )));
            }
            current = match folder.parent {
                Some(parent) => Some(self.folder(parent).await?),
                None => None,
            };
        }
        Ok(false)
    }

    async fn check_free(&self, parent: &Folder, name: &str) -> Result<(), EntityFsError> {
        if name.is_empty() || name.contains('/') {
            warn!("Rejected entity name {name:?}");
            return Err(EntityFsError::BadRequest(format!("invalid name {name:?}")));
        }

        if self
            .db
            .is_exist_entity(&self.table, Some(parent), name)
            .await?
        {
            return Err(EntityFsError::Conflict(format!(
                "{name} already exists in {}",
                parent.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::mapper::UUID, store::MemoryStore};

    async fn entities() -> (Entities, Folder) {
        let manager = TableManager::new(Arc::new(MemoryStore::new(UUID)));
        let entities = Entities::new(manager, "entities");
        let root = entities.init("root").await.unwrap();
        (entities, root)
    }

    #[tokio::test]
    async fn init_reuses_root() {
        let (entities, root) = entities().await;
        let again = entities.init("other").await.unwrap();

        assert_eq!(root, again);
        assert_eq!(root, entities.root().await.unwrap());
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let (entities, root) = entities().await;

        entities.create_folder(root.id, "docs").await.unwrap();
        let result = entities.create_file(root.id, "docs", None, 0).await;
        assert!(matches!(result, Err(EntityFsError::Conflict(_))));

        let result = entities.create_folder(root.id, "").await;
        assert!(matches!(result, Err(EntityFsError::BadRequest(_))));
    }

    #[tokio::test]
    async fn files_cannot_be_parents() {
        let (entities, root) = entities().await;
        let file = entities.create_file(root.id, "a.txt", None, 1).await.unwrap();

        let result = entities.create_folder(file.id, "sub").await;
        assert!(matches!(result, Err(EntityFsError::BadRequest(_))));
    }

    #[tokio::test]
    async fn rename_and_move() {
        let (entities, root) = entities().await;
        let docs = entities.create_folder(root.id, "docs").await.unwrap();
        let file = entities.create_file(root.id, "a.txt", None, 1).await.unwrap();

        let renamed = entities.update(file.id, "b.txt", None).await.unwrap();
        assert_eq!("b.txt", renamed.name());
        assert_eq!(Some(root.id), renamed.parent());

        let moved = entities
            .update(file.id, "b.txt", Some(docs.id))
            .await
            .unwrap();
        assert_eq!(Some(docs.id), moved.parent());

        let listed = entities.children(docs.id, Some(false)).await.unwrap();
        assert_eq!(vec![moved], listed);

        let result = entities.update(docs.id, "docs", Some(docs.id)).await;
        assert!(matches!(result, Err(EntityFsError::BadRequest(_))));

        let nested = entities.create_folder(docs.id, "nested").await.unwrap();
        let result = entities.update(docs.id, "docs", Some(nested.id)).await;
        assert!(matches!(result, Err(EntityFsError::BadRequest(_))));

        let result = entities.update(root.id, "renamed-root", None).await;
        assert!(matches!(result, Err(EntityFsError::BadRequest(_))));
    }

    #[tokio::test]
    async fn delete_requires_empty_folder() {
        let (entities, root) = entities().await;
        let docs = entities.create_folder(root.id, "docs").await.unwrap();
        let file = entities.create_file(docs.id, "a.txt", None, 1).await.unwrap();

        let result = entities.delete(docs.id).await;
        assert!(matches!(result, Err(EntityFsError::Conflict(_))));

        entities.delete(file.id).await.unwrap();
        entities.delete(docs.id).await.unwrap();

        let result = entities.get(docs.id).await;
        assert!(matches!(result, Err(EntityFsError::NotFound(_))));
    }

    #[tokio::test]
    async fn root_cannot_be_deleted() {
        let (entities, root) = entities().await;

        let result = entities.delete(root.id).await;
        assert!(matches!(result, Err(EntityFsError::BadRequest(_))));

        assert_eq!(root, entities.root().await.unwrap());
        entities.create_folder(root.id, "docs").await.unwrap();
    }

    #[tokio::test]
    async fn move_stops_on_parent_cycle() {
        let (entities, root) = entities().await;
        let docs = entities.create_folder(root.id, "docs").await.unwrap();

        let mut left = Folder::root("left");
        let mut right = Folder::root("right");
        left.parent = Some(right.id);
        right.parent = Some(left.id);
        for folder in [left.clone(), right] {
            entities
                .db
                .put_entity(&entities.table, &Entity::from(folder))
                .await
                .unwrap();
        }

        let result = entities.update(docs.id, "docs", Some(left.id)).await;
        assert!(matches!(result, Err(EntityFsError::Conflict(_))));

        let unchanged = entities.get(docs.id).await.unwrap();
        assert_eq!(Some(root.id), unchanged.parent());
    }
}
