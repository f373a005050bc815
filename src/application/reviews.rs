use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ReviewRepository;
use crate::domain::review::{NewReviewInput, ReviewView};
use crate::domain::user::UserView;

pub struct ReviewService<R> {
    repo: R,
}

impl<R: ReviewRepository> ReviewService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, user_id: Uuid, input: NewReviewInput) -> Result<ReviewView, DomainError> {
        if !(1..=5).contains(&input.rating) {
            return Err(DomainError::Validation(
                "rating must be between 1 and 5".into(),
            ));
        }
        self.repo.create(user_id, input)
    }

    pub fn list(&self, service_id: Option<Uuid>) -> Result<Vec<ReviewView>, DomainError> {
        self.repo.list(service_id)
    }

    /// Only the author or an admin may delete a review.
    pub fn delete(&self, actor: &UserView, review_id: Uuid) -> Result<(), DomainError> {
        let review = self
            .repo
            .find(review_id)?
            .ok_or(DomainError::NotFound("review"))?;
        if review.user_id != actor.id && !actor.role.is_admin() {
            return Err(DomainError::PermissionDenied(
                "only the author or an admin can delete a review".into(),
            ));
        }
        self.repo.delete(review_id)
    }
}
