use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Catalog entry with its derived average review rating. The rating is
/// computed from `reviews` at read time and never stored.
#[derive(Debug, Clone)]
pub struct ServiceView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub average_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewServiceInput {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

/// Partial catalog update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ServiceChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
}
