use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};

use crate::db::DbPool;
use crate::domain::ports::TokenRepository;
use crate::domain::user::{TokenKind, UserView};
use crate::errors::AppError;
use crate::infrastructure::user_repo::DieselUserRepository;

/// Pulls the token out of `Authorization: Bearer <token>`.
fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("invalid authorization header".into()))?;

    match value.split_whitespace().collect::<Vec<_>>()[..] {
        ["Bearer", token] => Ok(token.to_string()),
        _ => Err(AppError::Unauthorized("invalid authorization header".into())),
    }
}

/// The caller behind a live access token. Extracting this fails the request
/// with 401 when the token is missing, unknown, or expired.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserView);

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let token = bearer_token(&req)?;
            let pool = req
                .app_data::<web::Data<DbPool>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("database pool not configured".into()))?;

            let user = web::block(move || {
                DieselUserRepository::new(pool.get_ref().clone())
                    .find_user_by_token(&token, TokenKind::Access)
            })
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

            user.map(AuthUser)
                .ok_or_else(|| AppError::Unauthorized("invalid or expired token".into()))
        })
    }
}
