use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::cart::CartService;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::domain::cart::{CartItemView, CartView};
use crate::errors::AppError;
use crate::infrastructure::cart_repo::DieselCartRepository;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub service_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub unit_price: String,
    pub quantity: i32,
}

impl From<CartItemView> for CartItemResponse {
    fn from(item: CartItemView) -> Self {
        Self {
            id: item.id,
            service_id: item.service_id,
            service_name: item.service_name,
            unit_price: item.unit_price.to_string(),
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub items: Vec<CartItemResponse>,
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        Self {
            id: cart.id,
            items: cart.items.into_iter().map(Into::into).collect(),
        }
    }
}

fn service(pool: &web::Data<DbPool>) -> CartService<DieselCartRepository> {
    CartService::new(DieselCartRepository::new(pool.get_ref().clone()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/cart
///
/// Returns the caller's cart, creating an empty one on first touch.
#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "The caller's cart", body = CartResponse),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "cart"
)]
pub async fn view_cart(pool: web::Data<DbPool>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || service(&pool).view(user.0.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// POST /api/cart/items
///
/// Adds one unit of the service to the caller's cart; a repeated add
/// increments the existing line's quantity.
#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Cart after the add", body = CartResponse),
        (status = 404, description = "Service not found"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    pool: web::Data<DbPool>,
    user: AuthUser,
    body: web::Json<AddCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let service_id = body.into_inner().service_id;

    let cart = web::block(move || service(&pool).add_item(user.0.id, service_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// DELETE /api/cart/items/{id}
///
/// Removes a line from the caller's own cart. Items in other users' carts
/// read as missing.
#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item UUID"),
    ),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();

    web::block(move || service(&pool).remove_item(user.0.id, item_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
