use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

/// Directory entity. Only folders can be parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub id: uuid::Uuid,
    pub name: String,
    /// `None` for the root folder
    pub parent: Option<uuid::Uuid>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Folder {
    /// A new root folder, i.e. one without a parent.
    pub fn root(name: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            parent: None,
            created: now,
            modified: now,
        }
    }

    pub fn new(name: impl Into<String>, parent: &Folder) -> Self {
        Self {
            parent: Some(parent.id),
            ..Self::root(name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub id: uuid::Uuid,
    pub name: String,
    pub parent: Option<uuid::Uuid>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub content_type: Option<String>,
    /// Size in bytes
    pub content_length: u64,
}

impl File {
    pub fn new(
        name: impl Into<String>,
        parent: &Folder,
        content_type: Option<String>,
        content_length: u64,
    ) -> Self {
        let now = now();
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            parent: Some(parent.id),
            created: now,
            modified: now,
            content_type,
            content_length,
        }
    }
}

/// A stored file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    Folder(Folder),
    File(File),
}

impl Entity {
    pub fn id(&self) -> uuid::Uuid {
        match self {
            Entity::Folder(folder) => folder.id,
            Entity::File(file) => file.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Folder(folder) => &folder.name,
            Entity::File(file) => &file.name,
        }
    }

    pub fn parent(&self) -> Option<uuid::Uuid> {
        match self {
            Entity::Folder(folder) => folder.parent,
            Entity::File(file) => file.parent,
        }
    }

    pub fn created(&self) -> DateTime<Utc> {
        match self {
            Entity::Folder(folder) => folder.created,
            Entity::File(file) => file.created,
        }
    }

    pub fn modified(&self) -> DateTime<Utc> {
        match self {
            Entity::Folder(folder) => folder.modified,
            Entity::File(file) => file.modified,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entity::Folder(_))
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Entity::Folder(folder) => Some(folder),
            Entity::File(_) => None,
        }
    }

    pub fn into_folder(self) -> Option<Folder> {
        match self {
            Entity::Folder(folder) => Some(folder),
            Entity::File(_) => None,
        }
    }
}

impl From<Folder> for Entity {
    fn from(value: Folder) -> Self {
        Self::Folder(value)
    }
}

impl From<File> for Entity {
    fn from(value: File) -> Self {
        Self::File(value)
    }
}

/// Current time at the precision timestamps are stored with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
