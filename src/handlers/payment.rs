use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::orders::OrderService;
use crate::application::payment::PaymentService;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::domain::order::PaymentStatus;
use crate::errors::AppError;
use crate::handlers::orders::OrderResponse;
use crate::infrastructure::gateway::GatewayClient;
use crate::infrastructure::order_repo::DieselOrderRepository;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentRequest {
    pub order_id: Uuid,
    /// credit_card | bkash | nagad | cash
    pub payment_method: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InitiatePaymentResponse {
    pub gateway_page_url: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/payment
///
/// Simulated payment: records the method and moves the caller's pending
/// order to completed/paid. Non-pending orders are rejected.
#[utoipa::path(
    post,
    path = "/api/payment",
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Order paid", body = OrderResponse),
        (status = 400, description = "Unknown method or order not pending"),
        (status = 404, description = "Order not found"),
    ),
    tag = "payment"
)]
pub async fn pay(
    pool: web::Data<DbPool>,
    user: AuthUser,
    body: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let order = web::block(move || {
        PaymentService::new(DieselOrderRepository::new(pool.get_ref().clone())).pay(
            user.0.id,
            body.order_id,
            &body.payment_method,
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({
        "detail": "payment successful",
        "order": OrderResponse::from(order)
    })))
}

/// POST /api/payment/initiate
///
/// Opens a hosted-payment-page session with the external provider for one of
/// the caller's unpaid orders. Amount and transaction id come from the order.
#[utoipa::path(
    post,
    path = "/api/payment/initiate",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, description = "Redirect URL for the hosted page", body = InitiatePaymentResponse),
        (status = 400, description = "Order already paid, or provider declined"),
        (status = 404, description = "Order not found"),
    ),
    tag = "payment"
)]
pub async fn initiate_hosted_payment(
    pool: web::Data<DbPool>,
    gateway: web::Data<GatewayClient>,
    user: AuthUser,
    body: web::Json<InitiatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = body.into_inner().order_id;

    let order = web::block(move || {
        OrderService::new(DieselOrderRepository::new(pool.get_ref().clone())).get(&user.0, order_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    if order.payment_status != PaymentStatus::Pending {
        return Err(AppError::InvalidState(
            "order is already paid or failed".into(),
        ));
    }

    let url = gateway.initiate(&order).await?;

    Ok(HttpResponse::Ok().json(InitiatePaymentResponse {
        gateway_page_url: url,
    }))
}
