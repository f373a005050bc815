use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::reviews::ReviewService;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::domain::review::{NewReviewInput, ReviewView};
use crate::errors::AppError;
use crate::infrastructure::review_repo::DieselReviewRepository;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub service_id: Uuid,
    /// 1 to 5.
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListReviewsParams {
    pub service_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: String,
}

impl From<ReviewView> for ReviewResponse {
    fn from(review: ReviewView) -> Self {
        Self {
            id: review.id,
            user_id: review.user_id,
            service_id: review.service_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at.to_rfc3339(),
        }
    }
}

fn service(pool: &web::Data<DbPool>) -> ReviewService<DieselReviewRepository> {
    ReviewService::new(DieselReviewRepository::new(pool.get_ref().clone()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/reviews
///
/// Public; optionally narrowed to one service.
#[utoipa::path(
    get,
    path = "/api/reviews",
    params(
        ("service_id" = Option<Uuid>, Query, description = "Only reviews for this service"),
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = [ReviewResponse]),
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    pool: web::Data<DbPool>,
    query: web::Query<ListReviewsParams>,
) -> Result<HttpResponse, AppError> {
    let service_id = query.into_inner().service_id;

    let reviews = web::block(move || service(&pool).list(service_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let items: Vec<ReviewResponse> = reviews.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// POST /api/reviews
#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Service not found"),
    ),
    tag = "reviews"
)]
pub async fn create_review(
    pool: web::Data<DbPool>,
    user: AuthUser,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let review = web::block(move || {
        service(&pool).create(
            user.0.id,
            NewReviewInput {
                service_id: body.service_id,
                rating: body.rating,
                comment: body.comment.unwrap_or_default(),
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ReviewResponse::from(review)))
}

/// DELETE /api/reviews/{id}
///
/// Author or admin only.
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(
        ("id" = Uuid, Path, description = "Review UUID"),
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Caller is neither the author nor an admin"),
        (status = 404, description = "Review not found"),
    ),
    tag = "reviews"
)]
pub async fn delete_review(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let review_id = path.into_inner();

    web::block(move || service(&pool).delete(&user.0, review_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
