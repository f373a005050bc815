use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ReviewView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReviewInput {
    pub service_id: Uuid,
    pub rating: i32,
    pub comment: String,
}
