use actix_web::{
    error::{JsonPayloadError, PathError},
    HttpRequest, HttpResponse, ResponseError,
};
use serde::Serialize;

use crate::error::AppError;

#[derive(Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a str>,
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let app_err = match err {
        JsonPayloadError::ContentType => AppError::param_error("Content-Type must be application/json"),
        JsonPayloadError::Deserialize(e) => AppError::param_error_with("Invalid request body", e.to_string()),
        other => AppError::param_error_with("Invalid request body", other.to_string()),
    };
    app_err.into()
}

pub fn path_error_handler(_err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::not_found("resource", "Resource not found").into()
}

pub fn response_from_error(err: &AppError) -> HttpResponse {
    let msg = err.to_string();
    HttpResponse::build(err.status_code()).json(ErrorBody {
        error: &msg,
        details: err.details(),
    })
}
