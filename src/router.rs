use crate::{
    entity::Entity,
    error::EntityFsError,
    state::Entities,
};
use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use axum_macros::debug_handler;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub fn router(state: Entities) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE]);

    Router::new()
        .route("/entities/root", get(root))
        .route(
            "/entities/:id",
            get(entity).patch(update_entity).delete(delete_entity),
        )
        .route("/entities/:id/children", get(children))
        .route("/entities/:id/folders", post(create_folder))
        .route("/entities/:id/files", post(create_file))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[debug_handler]
async fn root(state: State<Entities>) -> Result<Json<Entity>, EntityFsError> {
    Ok(Json(state.root().await?.into()))
}

async fn entity(
    state: State<Entities>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<Entity>, EntityFsError> {
    Ok(Json(state.get(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EntityKind {
    Folder,
    File,
}

#[derive(Debug, Deserialize)]
struct ChildrenQuery {
    kind: Option<EntityKind>,
}

async fn children(
    state: State<Entities>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<ChildrenQuery>,
) -> Result<Json<Vec<Entity>>, EntityFsError> {
    let is_directory = query.kind.map(|kind| matches!(kind, EntityKind::Folder));
    Ok(Json(state.children(id, is_directory).await?))
}

#[derive(Debug, Deserialize)]
struct NewFolder {
    name: String,
}

async fn create_folder(
    state: State<Entities>,
    Path(parent): Path<uuid::Uuid>,
    Json(NewFolder { name }): Json<NewFolder>,
) -> Result<(StatusCode, Json<Entity>), EntityFsError> {
    let folder = state.create_folder(parent, &name).await?;
    info!("Created folder {} ({})", folder.name, folder.id);
    Ok((StatusCode::CREATED, Json(folder.into())))
}

#[derive(Debug, Deserialize)]
struct NewFile {
    name: String,
    content_type: Option<String>,
    #[serde(default)]
    content_length: u64,
}

async fn create_file(
    state: State<Entities>,
    Path(parent): Path<uuid::Uuid>,
    Json(NewFile {
        name,
        content_type,
        content_length,
    }): Json<NewFile>,
) -> Result<(StatusCode, Json<Entity>), EntityFsError> {
    let file = state
        .create_file(parent, &name, content_type, content_length)
        .await?;
    info!("Created file {} ({})", file.name, file.id);
    Ok((StatusCode::CREATED, Json(file.into())))
}

/// A rename when `parent` is missing, otherwise a move.
#[derive(Debug, Deserialize)]
struct EntityUpdate {
    name: String,
    parent: Option<uuid::Uuid>,
}

async fn update_entity(
    state: State<Entities>,
    Path(id): Path<uuid::Uuid>,
    Json(EntityUpdate { name, parent }): Json<EntityUpdate>,
) -> Result<Json<Entity>, EntityFsError> {
    Ok(Json(state.update(id, &name, parent).await?))
}

async fn delete_entity(
    state: State<Entities>,
    Path(id): Path<uuid::Uuid>,
) -> Result<StatusCode, EntityFsError> {
    state.delete(id).await?;
    info!("Deleted {id}");
    Ok(StatusCode::NO_CONTENT)
}
