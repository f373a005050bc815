use bigdecimal::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct CartView {
    pub id: Uuid,
    pub items: Vec<CartItemView>,
}
