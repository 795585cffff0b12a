use actix_web::{http::StatusCode, ResponseError};
use log::error;
use sea_orm::{DbErr, SqlErr, TransactionError};
use thiserror::Error;

use crate::response::response_from_error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{msg}")]
    Validation { msg: String, details: Option<String> },
    #[error("{msg}")]
    NotFound { resource: &'static str, msg: String },
    #[error("{msg}")]
    Conflict { msg: String },
    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn param_error(msg: impl Into<String>) -> Self {
        Self::Validation { msg: msg.into(), details: None }
    }

    pub fn param_error_with(msg: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Validation { msg: msg.into(), details: Some(details.into()) }
    }

    pub fn not_found(resource: &'static str, msg: impl Into<String>) -> Self {
        Self::NotFound { resource, msg: msg.into() }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict { msg: msg.into() }
    }

    pub fn system_exception() -> Self {
        Self::Internal
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Validation { details, .. } => details.as_deref(),
            _ => None,
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return AppError::conflict(format!("Record already exists: {}", unique_column(&detail)));
        }
        error!("database error: {}", err);
        AppError::system_exception()
    }
}

pub fn map_tx_error(err: TransactionError<AppError>) -> AppError {
    match err {
        TransactionError::Connection(db_err) => db_err.into(),
        TransactionError::Transaction(app) => app,
    }
}

// sqlite reports "UNIQUE constraint failed: t_user.email"; postgres names the index
fn unique_column(detail: &str) -> &str {
    detail
        .rsplit(['.', ' '])
        .next()
        .map(|c| c.trim_matches(|ch: char| ch == '"' || ch == '\''))
        .filter(|c| !c.is_empty())
        .unwrap_or("unique field")
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        response_from_error(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_db_errors_are_internal() {
        let err = DbErr::Custom("disk I/O error".to_string());
        assert!(matches!(AppError::from(err), AppError::Internal));
    }

    #[test]
    fn unique_column_names() {
        assert_eq!(unique_column("UNIQUE constraint failed: t_user.email"), "email");
        assert_eq!(
            unique_column("duplicate key value violates unique constraint \"t_planet_name_key\""),
            "t_planet_name_key"
        );
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::param_error("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("user", "gone").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("dup").status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::system_exception().status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_error_is_opaque() {
        assert_eq!(AppError::system_exception().to_string(), "Internal server error");
        assert_eq!(AppError::system_exception().details(), None);
    }
}
