use std::collections::HashMap;

use bigdecimal::{BigDecimal, ToPrimitive};
use diesel::dsl::avg;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{NewServiceInput, ServiceChanges, ServiceView};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::models::service::{NewService, Service, ServiceChangeset};
use crate::schema::{reviews, services};

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn service_view(row: Service, average_rating: Option<f64>) -> ServiceView {
    ServiceView {
        id: row.id,
        name: row.name,
        description: row.description,
        price: row.price,
        average_rating,
        created_at: row.created_at,
    }
}

impl CatalogRepository for DieselCatalogRepository {
    fn list(&self) -> Result<Vec<ServiceView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = services::table
            .select(Service::as_select())
            .load(&mut conn)?;

        // Ratings are derived, never stored; one grouped query covers the
        // whole catalog.
        let ratings: Vec<(Uuid, Option<BigDecimal>)> = reviews::table
            .group_by(reviews::service_id)
            .select((reviews::service_id, avg(reviews::rating)))
            .load(&mut conn)?;
        let ratings: HashMap<Uuid, f64> = ratings
            .into_iter()
            .filter_map(|(id, r)| r.and_then(|r| r.to_f64()).map(|r| (id, r)))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let rating = ratings.get(&row.id).copied();
                service_view(row, rating)
            })
            .collect())
    }

    fn find(&self, id: Uuid) -> Result<Option<ServiceView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = services::table
            .find(id)
            .select(Service::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let rating: Option<BigDecimal> = reviews::table
            .filter(reviews::service_id.eq(row.id))
            .select(avg(reviews::rating))
            .first(&mut conn)?;

        Ok(Some(service_view(row, rating.and_then(|r| r.to_f64()))))
    }

    fn create(&self, input: NewServiceInput) -> Result<ServiceView, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Service = diesel::insert_into(services::table)
            .values(&NewService {
                id: Uuid::new_v4(),
                name: input.name,
                description: input.description,
                price: input.price,
            })
            .get_result(&mut conn)?;

        Ok(service_view(row, None))
    }

    fn update(&self, id: Uuid, changes: ServiceChanges) -> Result<ServiceView, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Option<Service> = diesel::update(services::table.find(id))
            .set(&ServiceChangeset {
                name: changes.name,
                description: changes.description,
                price: changes.price,
            })
            .get_result(&mut conn)
            .optional()?;

        let row = row.ok_or(DomainError::NotFound("service"))?;

        let rating: Option<BigDecimal> = reviews::table
            .filter(reviews::service_id.eq(row.id))
            .select(avg(reviews::rating))
            .first(&mut conn)?;

        Ok(service_view(row, rating.and_then(|r| r.to_f64())))
    }

    fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(services::table.find(id))
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    DatabaseErrorKind::ForeignKeyViolation,
                    _,
                ) => DomainError::InvalidState(
                    "service has purchase history and cannot be deleted".to_string(),
                ),
                other => other.into(),
            })?;

        if deleted == 0 {
            return Err(DomainError::NotFound("service"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    use super::DieselCatalogRepository;
    use crate::domain::catalog::{NewServiceInput, ServiceChanges};
    use crate::domain::errors::DomainError;
    use crate::domain::ports::CatalogRepository;
    use crate::test_support::{insert_review, insert_user, setup_db};

    fn input(name: &str, price: &str) -> NewServiceInput {
        NewServiceInput {
            name: name.to_string(),
            description: format!("{name} description"),
            price: BigDecimal::from_str(price).expect("valid decimal"),
        }
    }

    #[tokio::test]
    async fn create_and_find_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let created = repo.create(input("Deep cleaning", "49.99")).expect("create failed");
        let found = repo
            .find(created.id)
            .expect("find failed")
            .expect("service should exist");

        assert_eq!(found.name, "Deep cleaning");
        assert_eq!(found.price, BigDecimal::from_str("49.99").unwrap());
        assert_eq!(found.average_rating, None);
    }

    #[tokio::test]
    async fn average_rating_is_derived_from_reviews() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool.clone());

        let service = repo.create(input("Gardening", "25.00")).expect("create failed");
        let reviewer = insert_user(&pool, "rita", "client");
        insert_review(&pool, reviewer, service.id, 4);
        insert_review(&pool, reviewer, service.id, 5);

        let found = repo
            .find(service.id)
            .expect("find failed")
            .expect("service should exist");

        assert_eq!(found.average_rating, Some(4.5));
    }

    #[tokio::test]
    async fn update_unknown_service_is_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let err = repo
            .update(
                Uuid::new_v4(),
                ServiceChanges {
                    price: Some(BigDecimal::from(10)),
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound("service")));
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let service = repo.create(input("Painting", "80.00")).expect("create failed");
        repo.delete(service.id).expect("delete failed");

        assert!(repo.find(service.id).expect("find failed").is_none());
        assert!(matches!(
            repo.delete(service.id).unwrap_err(),
            DomainError::NotFound("service")
        ));
    }
}
