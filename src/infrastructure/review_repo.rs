use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ReviewRepository;
use crate::domain::review::{NewReviewInput, ReviewView};
use crate::models::review::{NewReview, Review};
use crate::schema::reviews;

pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn review_view(row: Review) -> ReviewView {
    ReviewView {
        id: row.id,
        user_id: row.user_id,
        service_id: row.service_id,
        rating: row.rating,
        comment: row.comment,
        created_at: row.created_at,
    }
}

impl ReviewRepository for DieselReviewRepository {
    fn create(&self, user_id: Uuid, input: NewReviewInput) -> Result<ReviewView, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Review = diesel::insert_into(reviews::table)
            .values(&NewReview {
                id: Uuid::new_v4(),
                user_id,
                service_id: input.service_id,
                rating: input.rating,
                comment: input.comment,
            })
            .get_result(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    DatabaseErrorKind::ForeignKeyViolation,
                    _,
                ) => DomainError::NotFound("service"),
                other => other.into(),
            })?;

        Ok(review_view(row))
    }

    fn list(&self, service_id: Option<Uuid>) -> Result<Vec<ReviewView>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = reviews::table
            .select(Review::as_select())
            .order(reviews::created_at.desc())
            .into_boxed();
        if let Some(service_id) = service_id {
            query = query.filter(reviews::service_id.eq(service_id));
        }
        let rows = query.load(&mut conn)?;

        Ok(rows.into_iter().map(review_view).collect())
    }

    fn find(&self, id: Uuid) -> Result<Option<ReviewView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = reviews::table
            .find(id)
            .select(Review::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(review_view))
    }

    fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(reviews::table.find(id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(DomainError::NotFound("review"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::DieselReviewRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::ReviewRepository;
    use crate::domain::review::NewReviewInput;
    use crate::test_support::{insert_service, insert_user, setup_db};

    #[tokio::test]
    async fn create_and_list_by_service() {
        let (_container, pool) = setup_db().await;
        let repo = DieselReviewRepository::new(pool.clone());
        let user = insert_user(&pool, "alice", "client");
        let cleaning = insert_service(&pool, "Deep cleaning", "49.99");
        let gardening = insert_service(&pool, "Gardening", "25.00");

        repo.create(
            user,
            NewReviewInput {
                service_id: cleaning,
                rating: 5,
                comment: "spotless".to_string(),
            },
        )
        .expect("create failed");
        repo.create(
            user,
            NewReviewInput {
                service_id: gardening,
                rating: 3,
                comment: String::new(),
            },
        )
        .expect("create failed");

        let all = repo.list(None).expect("list failed");
        assert_eq!(all.len(), 2);

        let for_cleaning = repo.list(Some(cleaning)).expect("list failed");
        assert_eq!(for_cleaning.len(), 1);
        assert_eq!(for_cleaning[0].rating, 5);
    }

    #[tokio::test]
    async fn review_for_unknown_service_is_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselReviewRepository::new(pool.clone());
        let user = insert_user(&pool, "bob", "client");

        let err = repo
            .create(
                user,
                NewReviewInput {
                    service_id: Uuid::new_v4(),
                    rating: 4,
                    comment: String::new(),
                },
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound("service")));
    }

    #[tokio::test]
    async fn a_user_may_review_the_same_service_twice() {
        // No uniqueness over (user, service) — left open deliberately.
        let (_container, pool) = setup_db().await;
        let repo = DieselReviewRepository::new(pool.clone());
        let user = insert_user(&pool, "carol", "client");
        let service = insert_service(&pool, "Painting", "80.00");

        for rating in [2, 4] {
            repo.create(
                user,
                NewReviewInput {
                    service_id: service,
                    rating,
                    comment: String::new(),
                },
            )
            .expect("create failed");
        }

        assert_eq!(repo.list(Some(service)).expect("list failed").len(), 2);
    }
}
