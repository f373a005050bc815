use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::CartView;
use super::catalog::{NewServiceInput, ServiceChanges, ServiceView};
use super::errors::DomainError;
use super::order::{CheckoutDetails, OrderStatusPatch, OrderView, PaymentMethod};
use super::review::{NewReviewInput, ReviewView};
use super::user::{NewUserInput, ProfileChanges, TokenKind, UserCredentials, UserView};

pub trait UserRepository: Send + Sync + 'static {
    fn create(&self, input: NewUserInput) -> Result<UserView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<UserView>, DomainError>;
    fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, DomainError>;
    fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<UserView, DomainError>;
    /// Flips `role` to admin only while the target is still a client.
    fn promote_to_admin(&self, target: Uuid) -> Result<UserView, DomainError>;
}

pub trait TokenRepository: Send + Sync + 'static {
    fn issue(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
    /// Resolves a live (non-expired) token of the given kind to its user.
    fn find_user_by_token(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<Option<UserView>, DomainError>;
}

pub trait CatalogRepository: Send + Sync + 'static {
    fn list(&self) -> Result<Vec<ServiceView>, DomainError>;
    fn find(&self, id: Uuid) -> Result<Option<ServiceView>, DomainError>;
    fn create(&self, input: NewServiceInput) -> Result<ServiceView, DomainError>;
    fn update(&self, id: Uuid, changes: ServiceChanges) -> Result<ServiceView, DomainError>;
    fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn add_item(&self, user_id: Uuid, service_id: Uuid) -> Result<CartView, DomainError>;
    /// Removal is scoped to the caller's own cart.
    fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError>;
    fn view(&self, user_id: Uuid) -> Result<CartView, DomainError>;
}

pub trait ReviewRepository: Send + Sync + 'static {
    fn create(&self, user_id: Uuid, input: NewReviewInput) -> Result<ReviewView, DomainError>;
    fn list(&self, service_id: Option<Uuid>) -> Result<Vec<ReviewView>, DomainError>;
    fn find(&self, id: Uuid) -> Result<Option<ReviewView>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Converts the user's cart into an order atomically; see the diesel
    /// implementation for the transaction boundary.
    fn checkout(&self, user_id: Uuid, details: CheckoutDetails) -> Result<OrderView, DomainError>;
    fn find(&self, order_id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError>;
    fn list_all(&self) -> Result<Vec<OrderView>, DomainError>;
    /// Pays an order owned by `user_id`; valid only while status is pending.
    fn mark_paid(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        method: PaymentMethod,
    ) -> Result<OrderView, DomainError>;
    fn patch_status(&self, order_id: Uuid, patch: OrderStatusPatch)
        -> Result<OrderView, DomainError>;
}
