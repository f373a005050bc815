use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::catalog::CatalogService;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::domain::catalog::{NewServiceInput, ServiceChanges, ServiceView};
use crate::errors::AppError;
use crate::infrastructure::catalog_repo::DieselCatalogRepository;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "49.99"
    pub price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListServicesParams {
    /// avg_rating | price | name, with a leading `-` for descending.
    /// Defaults to `-avg_rating`.
    pub ordering: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: String,
    pub average_rating: f64,
    pub created_at: String,
}

impl From<ServiceView> for ServiceResponse {
    fn from(service: ServiceView) -> Self {
        Self {
            id: service.id,
            name: service.name,
            description: service.description,
            price: service.price.to_string(),
            average_rating: service.average_rating.unwrap_or(0.0),
            created_at: service.created_at.to_rfc3339(),
        }
    }
}

fn parse_price(raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw)
        .map_err(|e| AppError::Validation(format!("invalid price '{raw}': {e}")))
}

fn service(pool: &web::Data<DbPool>) -> CatalogService<DieselCatalogRepository> {
    CatalogService::new(DieselCatalogRepository::new(pool.get_ref().clone()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/services
///
/// Public. Sorted by derived average rating (descending) unless `ordering`
/// says otherwise.
#[utoipa::path(
    get,
    path = "/api/services",
    params(
        ("ordering" = Option<String>, Query, description = "avg_rating | price | name, `-` prefix for descending"),
    ),
    responses(
        (status = 200, description = "Catalog listing", body = [ServiceResponse]),
        (status = 400, description = "Unknown ordering"),
    ),
    tag = "services"
)]
pub async fn list_services(
    pool: web::Data<DbPool>,
    query: web::Query<ListServicesParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();

    let services = web::block(move || service(&pool).list(params.ordering.as_deref()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let items: Vec<ServiceResponse> = services.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/services/{id}
#[utoipa::path(
    get,
    path = "/api/services/{id}",
    params(
        ("id" = Uuid, Path, description = "Service UUID"),
    ),
    responses(
        (status = 200, description = "Service found", body = ServiceResponse),
        (status = 404, description = "Service not found"),
    ),
    tag = "services"
)]
pub async fn get_service(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let found = web::block(move || service(&pool).get(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ServiceResponse::from(found)))
}

/// POST /api/services (admin)
#[utoipa::path(
    post,
    path = "/api/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = ServiceResponse),
        (status = 400, description = "Invalid name or price"),
        (status = 403, description = "Caller is not an admin"),
    ),
    tag = "services"
)]
pub async fn create_service(
    pool: web::Data<DbPool>,
    user: AuthUser,
    body: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let price = parse_price(&body.price)?;

    let created = web::block(move || {
        service(&pool).create(
            user.0.role,
            NewServiceInput {
                name: body.name,
                description: body.description,
                price,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ServiceResponse::from(created)))
}

/// PATCH /api/services/{id} (admin)
#[utoipa::path(
    patch,
    path = "/api/services/{id}",
    params(
        ("id" = Uuid, Path, description = "Service UUID"),
    ),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Updated service", body = ServiceResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Service not found"),
    ),
    tag = "services"
)]
pub async fn update_service(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateServiceRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let price = body.price.as_deref().map(parse_price).transpose()?;

    let updated = web::block(move || {
        service(&pool).update(
            user.0.role,
            id,
            ServiceChanges {
                name: body.name,
                description: body.description,
                price,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ServiceResponse::from(updated)))
}

/// DELETE /api/services/{id} (admin)
#[utoipa::path(
    delete,
    path = "/api/services/{id}",
    params(
        ("id" = Uuid, Path, description = "Service UUID"),
    ),
    responses(
        (status = 204, description = "Service deleted"),
        (status = 400, description = "Service has purchase history"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Service not found"),
    ),
    tag = "services"
)]
pub async fn delete_service(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    web::block(move || service(&pool).delete(user.0.role, id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
