use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::auth::{AuthService, RegisterInput, TokenPair};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::domain::user::{ProfileChanges, Role, UserView};
use crate::errors::AppError;
use crate::infrastructure::user_repo::DieselUserRepository;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// "admin" or "client"; defaults to "client".
    pub role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
}

impl From<UserView> for UserResponse {
    fn from(user: UserView) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            bio: user.bio,
            profile_picture: user.profile_picture,
            facebook: user.facebook,
            twitter: user.twitter,
            linkedin: user.linkedin,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserResponse,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access: pair.access,
            refresh: pair.refresh,
            user: pair.user.into(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
}

fn service(pool: &web::Data<DbPool>) -> AuthService<DieselUserRepository> {
    AuthService::new(DieselUserRepository::new(pool.get_ref().clone()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/register
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid username or password"),
        (status = 409, description = "Username already taken"),
    ),
    tag = "auth"
)]
pub async fn register(
    pool: web::Data<DbPool>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let role = body
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(AppError::from)?;

    let user = web::block(move || {
        service(&pool).register(RegisterInput {
            username: body.username,
            email: body.email,
            password: body.password,
            role,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// POST /api/login
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access/refresh token pair", body = TokenPairResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    pool: web::Data<DbPool>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let pair = web::block(move || service(&pool).login(&body.username, &body.password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(TokenPairResponse::from(pair)))
}

/// POST /api/token/refresh
#[utoipa::path(
    post,
    path = "/api/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Fresh access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid or expired refresh token"),
    ),
    tag = "auth"
)]
pub async fn refresh(
    pool: web::Data<DbPool>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let pair = web::block(move || service(&pool).refresh(&body.refresh))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access: pair.access }))
}

/// GET /api/profile
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "The caller's profile", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "auth"
)]
pub async fn profile(
    pool: web::Data<DbPool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let user = web::block(move || service(&pool).profile(user.0.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PATCH /api/profile
#[utoipa::path(
    patch,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "auth"
)]
pub async fn update_profile(
    pool: web::Data<DbPool>,
    user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let updated = web::block(move || {
        service(&pool).update_profile(
            user.0.id,
            ProfileChanges {
                bio: body.bio,
                profile_picture: body.profile_picture,
                facebook: body.facebook,
                twitter: body.twitter,
                linkedin: body.linkedin,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

/// PATCH /api/promote/{user_id}
#[utoipa::path(
    patch,
    path = "/api/promote/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User to promote to admin"),
    ),
    responses(
        (status = 200, description = "Promoted user", body = UserResponse),
        (status = 400, description = "Target is not a client account"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found"),
    ),
    tag = "auth"
)]
pub async fn promote(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let target = path.into_inner();

    let promoted = web::block(move || service(&pool).promote(&user.0, target))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(UserResponse::from(promoted)))
}
