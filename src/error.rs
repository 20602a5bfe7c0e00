use crate::{entity::mapper::MapperError, store::StoreError};
use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntityFsError {
    #[error("{0}")]
    IO(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("mapping: {0}")]
    Mapper(#[from] MapperError),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for EntityFsError {
    fn into_response(self) -> axum::response::Response {
        match self {
            EntityFsError::NotFound(e) => (StatusCode::NOT_FOUND, e).into_response(),
            EntityFsError::Conflict(e) => (StatusCode::CONFLICT, e).into_response(),
            EntityFsError::BadRequest(e) => (StatusCode::BAD_REQUEST, e).into_response(),
            EntityFsError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            EntityFsError::IO(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            EntityFsError::Store(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            EntityFsError::Mapper(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            EntityFsError::Config(e) => (StatusCode::INTERNAL_SERVER_ERROR, e).into_response(),
        }
    }
}
