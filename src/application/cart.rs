use uuid::Uuid;

use crate::domain::cart::CartView;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;

pub struct CartService<R> {
    repo: R,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn add_item(&self, user_id: Uuid, service_id: Uuid) -> Result<CartView, DomainError> {
        self.repo.add_item(user_id, service_id)
    }

    pub fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError> {
        self.repo.remove_item(user_id, item_id)
    }

    pub fn view(&self, user_id: Uuid) -> Result<CartView, DomainError> {
        self.repo.view(user_id)
    }
}
