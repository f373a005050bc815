use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::orders::{CheckoutDraft, OrderService};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::domain::order::{OrderItemView, OrderView};
use crate::errors::AppError;
use crate::infrastructure::order_repo::DieselOrderRepository;

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Checkout contact details. All fields are optional; omitted ones fall back
/// to the caller's profile.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// pending | completed | cancelled
    pub status: Option<String>,
    /// pending | paid | failed
    pub payment_status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub quantity: i32,
    pub price_at_purchase: String,
    pub line_total: String,
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(item: OrderItemView) -> Self {
        let line_total = item.line_total().to_string();
        Self {
            id: item.id,
            service_id: item.service_id,
            service_name: item.service_name,
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase.to_string(),
            line_total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub total_amount: String,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            name: order.name,
            email: order.email,
            phone: order.phone,
            address: order.address,
            status: order.status.to_string(),
            payment_status: order.payment_status.to_string(),
            payment_method: order.payment_method.map(|m| m.to_string()),
            total_amount: order.total_amount.to_string(),
            created_at: order.created_at.to_rfc3339(),
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

fn service(pool: &web::Data<DbPool>) -> OrderService<DieselOrderRepository> {
    OrderService::new(DieselOrderRepository::new(pool.get_ref().clone()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/orders
///
/// The caller's order history; admins see every order.
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders, newest first", body = [OrderResponse]),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "orders"
)]
pub async fn list_orders(pool: web::Data<DbPool>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service(&pool).list(&user.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let items: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service(&pool).get(&user.0, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /api/orders (also mounted as POST /api/checkout)
///
/// Converts the caller's cart into an order: line prices are snapshotted,
/// the total is fixed, and the cart is emptied, all in one database
/// transaction.
#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created from the cart", body = OrderResponse),
        (status = 400, description = "Cart is empty"),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "orders"
)]
pub async fn checkout(
    pool: web::Data<DbPool>,
    user: AuthUser,
    body: Option<web::Json<CheckoutRequest>>,
) -> Result<HttpResponse, AppError> {
    let body = body.map(web::Json::into_inner).unwrap_or_default();

    let order = web::block(move || {
        service(&pool).checkout(
            &user.0,
            CheckoutDraft {
                name: body.name,
                email: body.email,
                phone: body.phone,
                address: body.address,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// PATCH /api/orders/{id} (admin)
#[utoipa::path(
    patch,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 400, description = "Unknown status value"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();

    let order = web::block(move || {
        service(&pool).patch_status(
            user.0.role,
            order_id,
            body.status.as_deref(),
            body.payment_status.as_deref(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
