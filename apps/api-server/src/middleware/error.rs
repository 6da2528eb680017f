//! Error handling - every failure renders as the `{success: false, message}`
//! envelope.

use actix_web::dev::ServiceResponse;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use quill_core::DomainError;
use quill_shared::ApiResponse;

const INTERNAL_MESSAGE: &str = "Something went wrong!";

/// Application-level error type rendered through the response envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                ApiResponse::failure(INTERNAL_MESSAGE)
            }
            other => ApiResponse::failure(other.to_string()),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidState(msg) => {
                AppError::BadRequest(msg)
            }
            DomainError::Unauthenticated(msg) => AppError::Unauthorized(msg),
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            err @ DomainError::NotFound { .. } => AppError::NotFound(err.to_string()),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Development-mode middleware that adds the underlying message of an
/// [`AppError::Internal`] to its 500 envelope as `error`.
pub fn internal_error_details<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::INTERNAL_SERVER_ERROR, add_internal_detail)
}

fn add_internal_detail<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let detail = res
        .response()
        .error()
        .and_then(|e| e.as_error::<AppError>())
        .and_then(|e| match e {
            AppError::Internal(detail) => Some(detail.clone()),
            _ => None,
        });

    let Some(detail) = detail else {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    };

    let (req, _) = res.into_parts();
    let response = HttpResponse::InternalServerError()
        .json(ApiResponse::failure(INTERNAL_MESSAGE).with_error(detail));
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, response).map_into_right_body(),
    ))
}

/// Malformed or oversized JSON bodies.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let app_error = match &err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            AppError::PayloadTooLarge("Request body is too large".to_string())
        }
        JsonPayloadError::ContentType => {
            AppError::BadRequest("Content-Type must be application/json".to_string())
        }
        JsonPayloadError::Deserialize(e) => AppError::BadRequest(format!("Invalid request body: {e}")),
        other => AppError::BadRequest(other.to_string()),
    };
    app_error.into()
}

/// Query strings that don't fit the endpoint's parameters.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query parameters: {err}")).into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
