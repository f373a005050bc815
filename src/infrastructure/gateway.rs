use serde_json::Value;
use thiserror::Error;

use crate::domain::order::OrderView;
use crate::errors::AppError;

/// Hosted-payment-page provider settings, read from the environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_url: String,
    pub store_id: String,
    pub store_password: String,
    /// Base URL the provider redirects back to after the customer pays.
    pub public_base_url: String,
    pub currency: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let get = |key: &str, default: &str| {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };
        Self {
            api_url: get(
                "GATEWAY_API_URL",
                "https://sandbox.sslcommerz.com/gwprocess/v4/api.php",
            ),
            store_id: get("GATEWAY_STORE_ID", "testbox"),
            store_password: get("GATEWAY_STORE_PASSWORD", "qwerty"),
            public_base_url: get("PUBLIC_BASE_URL", "http://localhost:8080"),
            currency: get("GATEWAY_CURRENCY", "BDT"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider answered but did not hand out a payment page.
    #[error("payment initiation declined by provider")]
    Declined(Value),
    #[error("gateway request failed: {0}")]
    Transport(String),
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Declined(details) => AppError::Gateway(details),
            GatewayError::Transport(msg) => AppError::Internal(msg),
        }
    }
}

/// Client for the provider's session-initiation endpoint. Only the request
/// shape and the two response outcomes are modelled; the actual customer
/// interaction happens on the provider's hosted page.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Form fields for the provider's create-session call. Field names are
    /// the provider's wire contract.
    fn build_params(&self, order: &OrderView) -> Vec<(&'static str, String)> {
        let product_name = order
            .items
            .first()
            .map(|i| i.service_name.clone())
            .unwrap_or_else(|| "Household services".to_string());
        vec![
            ("store_id", self.config.store_id.clone()),
            ("store_passwd", self.config.store_password.clone()),
            ("total_amount", order.total_amount.to_string()),
            ("currency", self.config.currency.clone()),
            ("tran_id", order.id.to_string()),
            (
                "success_url",
                format!("{}/api/payment/success", self.config.public_base_url),
            ),
            (
                "fail_url",
                format!("{}/api/payment/fail", self.config.public_base_url),
            ),
            (
                "cancel_url",
                format!("{}/api/payment/cancel", self.config.public_base_url),
            ),
            ("cus_name", order.name.clone()),
            ("cus_email", order.email.clone()),
            ("cus_add1", order.address.clone()),
            ("cus_phone", order.phone.clone()),
            ("shipping_method", "NO".to_string()),
            ("product_name", product_name),
            ("product_category", "Household".to_string()),
            ("product_profile", "general".to_string()),
        ]
    }

    /// Initiate a hosted-payment session for the order. A `GatewayPageURL` in
    /// the response means success; anything else is a decline carrying the
    /// provider's detail payload.
    pub async fn initiate(&self, order: &OrderView) -> Result<String, GatewayError> {
        let params = self.build_params(order);

        let response = self
            .http
            .post(&self.config.api_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        match body.get("GatewayPageURL").and_then(Value::as_str) {
            Some(url) if !url.is_empty() => Ok(url.to_string()),
            _ => Err(GatewayError::Declined(body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use uuid::Uuid;

    use super::{GatewayClient, GatewayConfig, GatewayError};
    use crate::domain::order::{
        OrderItemView, OrderStatus, OrderView, PaymentStatus,
    };
    use crate::errors::AppError;

    fn config() -> GatewayConfig {
        GatewayConfig {
            api_url: "https://gateway.example/api".to_string(),
            store_id: "store-1".to_string(),
            store_password: "secret".to_string(),
            public_base_url: "https://shop.example".to_string(),
            currency: "BDT".to_string(),
        }
    }

    fn order() -> OrderView {
        OrderView {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: "01700000000".to_string(),
            address: "12 Lake Road".to_string(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            total_amount: BigDecimal::from_str("25.00").unwrap(),
            created_at: Utc::now(),
            items: vec![OrderItemView {
                id: Uuid::new_v4(),
                service_id: Uuid::new_v4(),
                service_name: "Deep cleaning".to_string(),
                quantity: 2,
                price_at_purchase: BigDecimal::from_str("12.50").unwrap(),
            }],
        }
    }

    #[test]
    fn params_carry_order_amount_and_transaction_id() {
        let order = order();
        let client = GatewayClient::new(config());
        let params = client.build_params(&order);

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap_or_default()
        };

        assert_eq!(get("total_amount"), "25.00");
        assert_eq!(get("tran_id"), order.id.to_string());
        assert_eq!(get("store_id"), "store-1");
        assert_eq!(get("cus_name"), "Alice");
        assert_eq!(get("product_name"), "Deep cleaning");
        assert_eq!(get("success_url"), "https://shop.example/api/payment/success");
    }

    #[test]
    fn decline_maps_to_gateway_error_with_detail() {
        let detail = serde_json::json!({"failedreason": "store inactive"});
        let app_err: AppError = GatewayError::Declined(detail.clone()).into();
        match app_err {
            AppError::Gateway(d) => assert_eq!(d, detail),
            other => panic!("expected Gateway, got {other:?}"),
        }
    }

    #[test]
    fn transport_failure_maps_to_internal() {
        let app_err: AppError = GatewayError::Transport("timeout".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}
