use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{RequestStatus, TierChangeRequestView};

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Token error: {0}")]
    TokenGeneration(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Validation failed")]
    Validation { fields: BTreeMap<String, String> },

    #[error("A pending request already exists")]
    DuplicateRequest(Box<TierChangeRequestView>),

    #[error("Request already {status}")]
    InvalidState { status: RequestStatus },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid signature")]
    InvalidSignature,
}

impl AppError {
    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.to_string());
        AppError::Validation { fields }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database(ref e) => internal("Database", e),
            AppError::Transaction(ref e) => internal("Transaction", e),
            AppError::Table(ref e) => internal("Table", e),
            AppError::Storage(ref e) => internal("Storage", e),
            AppError::Commit(ref e) => internal("Commit", e),
            AppError::Serialization(ref e) => internal("Serialization", e),
            AppError::Deserialization(ref e) => internal("Deserialization", e),
            AppError::TaskJoin(ref e) => internal("Task join", e),
            AppError::TokenGeneration(ref e) => internal("Token generation", e),
            AppError::PasswordHash(ref e) => internal("Password hashing", e),
            AppError::Validation { fields } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Validation failed",
                    "code": "VALIDATION_ERROR",
                    "fields": fields,
                }),
            ),
            AppError::DuplicateRequest(request) => (
                StatusCode::CONFLICT,
                json!({
                    "error": "You already have a pending upgrade request",
                    "code": "DUPLICATE_REQUEST",
                    "request": request,
                }),
            ),
            AppError::InvalidState { status } => (
                StatusCode::CONFLICT,
                json!({
                    "error": format!("Request has already been {}", status),
                    "code": "INVALID_STATE",
                    "status": status,
                }),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("{} not found", what), "code": "NOT_FOUND" }),
            ),
            AppError::Conflict(ref msg) => (
                StatusCode::CONFLICT,
                json!({ "error": msg, "code": "CONFLICT" }),
            ),
            AppError::InvalidInput(ref msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "code": "INVALID_INPUT" }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Authentication required", "code": "UNAUTHORIZED" }),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Invalid or expired token", "code": "UNAUTHORIZED" }),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Not allowed", "code": "FORBIDDEN" }),
            ),
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Invalid signature", "code": "INVALID_SIGNATURE" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn internal(kind: &str, e: &dyn std::fmt::Debug) -> (StatusCode, serde_json::Value) {
    tracing::error!("{} error: {:?}", kind, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "Internal server error", "code": "INTERNAL" }),
    )
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
