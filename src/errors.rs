use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("failed to initiate payment")]
    Gateway(serde_json::Value),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(what) => AppError::NotFound(what),
            DomainError::InvalidState(msg) => AppError::InvalidState(msg),
            DomainError::PermissionDenied(msg) => AppError::PermissionDenied(msg),
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Unauthorized(msg) => AppError::Unauthorized(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::InvalidState(_) | AppError::Validation(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": self.to_string()
                }))
            }
            AppError::PermissionDenied(_) => HttpResponse::Forbidden().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Conflict(_) => HttpResponse::Conflict().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Gateway(details) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": self.to_string(),
                "details": details
            })),
            // Internal detail stays in the logs, never on the wire.
            AppError::Internal(msg) => {
                log::error!("internal error: {msg}");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    use super::*;

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("order").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_state_returns_400() {
        let resp = AppError::InvalidState("cart is empty".into()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn permission_denied_returns_403() {
        let resp = AppError::PermissionDenied("admin only".into()).error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn validation_returns_400() {
        let resp = AppError::Validation("rating out of range".into()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflict_returns_409() {
        let resp = AppError::Conflict("username taken".into()).error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unauthorized_returns_401() {
        let resp = AppError::Unauthorized("invalid credentials".into()).error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_error_returns_500_without_detail() {
        let err = AppError::Internal("connection refused".into());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let app_err: AppError = DomainError::NotFound("service").into();
        assert!(matches!(app_err, AppError::NotFound("service")));
    }

    #[test]
    fn domain_invalid_state_maps_to_app_invalid_state() {
        let app_err: AppError = DomainError::InvalidState("cart is empty".into()).into();
        assert!(matches!(app_err, AppError::InvalidState(_)));
    }

    #[test]
    fn domain_permission_denied_maps_to_app_permission_denied() {
        let app_err: AppError = DomainError::PermissionDenied("nope".into()).into();
        assert!(matches!(app_err, AppError::PermissionDenied(_)));
    }
}
