use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderView, PaymentMethod};
use crate::domain::ports::OrderRepository;

/// Simulated payment path: validates the method, then lets the repository
/// perform the pending → completed/paid transition.
pub struct PaymentService<R> {
    repo: R,
}

impl<R: OrderRepository> PaymentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn pay(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        payment_method: &str,
    ) -> Result<OrderView, DomainError> {
        let method: PaymentMethod = payment_method.parse()?;
        self.repo.mark_paid(user_id, order_id, method)
    }
}
