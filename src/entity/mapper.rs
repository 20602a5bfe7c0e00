//! Conversion between stored attribute rows and typed entities.

use super::models::{Entity, File, Folder};
use crate::store::{AttributeValue, Item};
use chrono::{DateTime, SecondsFormat, Utc};
use std::num::ParseIntError;
use thiserror::Error;

/// Hash key of every entity table.
pub const UUID: &str = "uuid";
pub const ENTITY_NAME: &str = "entity_name";
pub const PARENT_UUID: &str = "parent_uuid";
pub const IS_DIRECTORY: &str = "is_directory";
pub const CREATED_DATE: &str = "created_date";
pub const MODIFIED_DATE: &str = "modified_date";
pub const CONTENT_TYPE: &str = "content_type";
pub const CONTENT_LENGTH: &str = "content_length";

/// Stored in place of a parent id for root entities so that they can be queried by equality.
pub const NOT_EXIST: &str = "NOT_EXIST";

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("missing attribute '{0}'")]
    MissingAttribute(&'static str),

    #[error("attribute '{0}' has the wrong type")]
    WrongType(&'static str),

    #[error("uuid: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("number: {0}")]
    Number(#[from] ParseIntError),
}

/// The `parent_uuid` value for the given parent, the sentinel if there is none.
pub fn parent_value(parent: Option<uuid::Uuid>) -> AttributeValue {
    match parent {
        Some(id) => AttributeValue::s(id.to_string()),
        None => AttributeValue::s(NOT_EXIST),
    }
}

pub fn directory_value(is_directory: bool) -> AttributeValue {
    AttributeValue::n(u8::from(is_directory))
}

pub fn timestamp_value(timestamp: DateTime<Utc>) -> AttributeValue {
    AttributeValue::s(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn to_item(entity: &Entity) -> Item {
    let mut item = Item::from([
        (UUID.to_string(), AttributeValue::s(entity.id().to_string())),
        (ENTITY_NAME.to_string(), AttributeValue::s(entity.name())),
        (PARENT_UUID.to_string(), parent_value(entity.parent())),
        (
            IS_DIRECTORY.to_string(),
            directory_value(entity.is_directory()),
        ),
        (CREATED_DATE.to_string(), timestamp_value(entity.created())),
        (MODIFIED_DATE.to_string(), timestamp_value(entity.modified())),
    ]);

    if let Entity::File(File {
        content_type,
        content_length,
        ..
    }) = entity
    {
        if let Some(content_type) = content_type {
            item.insert(CONTENT_TYPE.to_string(), AttributeValue::s(content_type));
        }
        item.insert(
            CONTENT_LENGTH.to_string(),
            AttributeValue::n(content_length),
        );
    }

    item
}

pub fn to_entity(item: &Item) -> Result<Entity, MapperError> {
    let id = uuid::Uuid::parse_str(string(item, UUID)?)?;
    let name = string(item, ENTITY_NAME)?.to_string();

    let parent = match string(item, PARENT_UUID)? {
        NOT_EXIST => None,
        parent => Some(uuid::Uuid::parse_str(parent)?),
    };

    let created = timestamp(item, CREATED_DATE)?;
    let modified = timestamp(item, MODIFIED_DATE)?;

    if number(item, IS_DIRECTORY)? != 0 {
        return Ok(Entity::Folder(Folder {
            id,
            name,
            parent,
            created,
            modified,
        }));
    }

    let content_type = item
        .get(CONTENT_TYPE)
        .map(|value| match value {
            AttributeValue::S(s) => Ok(s.clone()),
            AttributeValue::N(_) => Err(MapperError::WrongType(CONTENT_TYPE)),
        })
        .transpose()?;

    let content_length = match item.get(CONTENT_LENGTH) {
        Some(_) => number(item, CONTENT_LENGTH)?,
        None => 0,
    };

    Ok(Entity::File(File {
        id,
        name,
        parent,
        created,
        modified,
        content_type,
        content_length,
    }))
}

pub fn to_entities(items: &[Item]) -> Result<Vec<Entity>, MapperError> {
    items.iter().map(to_entity).collect()
}

fn string<'a>(item: &'a Item, attribute: &'static str) -> Result<&'a str, MapperError> {
    match item.get(attribute) {
        Some(AttributeValue::S(s)) => Ok(s),
        Some(AttributeValue::N(_)) => Err(MapperError::WrongType(attribute)),
        None => Err(MapperError::MissingAttribute(attribute)),
    }
}

fn number(item: &Item, attribute: &'static str) -> Result<u64, MapperError> {
    match item.get(attribute) {
        Some(AttributeValue::N(n)) => Ok(n.parse()?),
        Some(AttributeValue::S(_)) => Err(MapperError::WrongType(attribute)),
        None => Err(MapperError::MissingAttribute(attribute)),
    }
}

fn timestamp(item: &Item, attribute: &'static str) -> Result<DateTime<Utc>, MapperError> {
    Ok(DateTime::parse_from_rfc3339(string(item, attribute)?)?.with_timezone(&Utc))
}
