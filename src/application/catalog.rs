use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::catalog::{NewServiceInput, ServiceChanges, ServiceView};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::domain::user::Role;

/// Catalog list ordering. Matches the `ordering` query parameter values;
/// a leading `-` means descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrdering {
    AvgRating { descending: bool },
    Price { descending: bool },
    Name { descending: bool },
}

impl CatalogOrdering {
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        match raw.unwrap_or("-avg_rating") {
            "avg_rating" => Ok(Self::AvgRating { descending: false }),
            "-avg_rating" => Ok(Self::AvgRating { descending: true }),
            "price" => Ok(Self::Price { descending: false }),
            "-price" => Ok(Self::Price { descending: true }),
            "name" => Ok(Self::Name { descending: false }),
            "-name" => Ok(Self::Name { descending: true }),
            other => Err(DomainError::Validation(format!(
                "unknown ordering '{other}'"
            ))),
        }
    }

    fn apply(self, items: &mut [ServiceView]) {
        match self {
            // Unrated services sort below any rated one, regardless of
            // direction.
            Self::AvgRating { descending } => {
                items.sort_by(|a, b| {
                    let a = a.average_rating.unwrap_or(f64::NEG_INFINITY);
                    let b = b.average_rating.unwrap_or(f64::NEG_INFINITY);
                    if descending {
                        b.total_cmp(&a)
                    } else {
                        a.total_cmp(&b)
                    }
                });
            }
            Self::Price { descending } => {
                items.sort_by(|a, b| {
                    if descending {
                        b.price.cmp(&a.price)
                    } else {
                        a.price.cmp(&b.price)
                    }
                });
            }
            Self::Name { descending } => {
                items.sort_by(|a, b| {
                    if descending {
                        b.name.cmp(&a.name)
                    } else {
                        a.name.cmp(&b.name)
                    }
                });
            }
        }
    }
}

fn require_admin(actor_role: Role) -> Result<(), DomainError> {
    if !actor_role.is_admin() {
        return Err(DomainError::PermissionDenied(
            "only admins can manage the catalog".into(),
        ));
    }
    Ok(())
}

pub struct CatalogService<R> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self, ordering: Option<&str>) -> Result<Vec<ServiceView>, DomainError> {
        let ordering = CatalogOrdering::parse(ordering)?;
        let mut items = self.repo.list()?;
        ordering.apply(&mut items);
        Ok(items)
    }

    pub fn get(&self, id: Uuid) -> Result<ServiceView, DomainError> {
        self.repo.find(id)?.ok_or(DomainError::NotFound("service"))
    }

    pub fn create(
        &self,
        actor_role: Role,
        input: NewServiceInput,
    ) -> Result<ServiceView, DomainError> {
        require_admin(actor_role)?;
        if input.name.trim().is_empty() {
            return Err(DomainError::Validation("name must not be empty".into()));
        }
        if input.price < BigDecimal::from(0) {
            return Err(DomainError::Validation("price must not be negative".into()));
        }
        self.repo.create(input)
    }

    pub fn update(
        &self,
        actor_role: Role,
        id: Uuid,
        changes: ServiceChanges,
    ) -> Result<ServiceView, DomainError> {
        require_admin(actor_role)?;
        if changes.name.is_none() && changes.description.is_none() && changes.price.is_none() {
            return Err(DomainError::Validation("nothing to update".into()));
        }
        if let Some(price) = &changes.price {
            if *price < BigDecimal::from(0) {
                return Err(DomainError::Validation("price must not be negative".into()));
            }
        }
        self.repo.update(id, changes)
    }

    pub fn delete(&self, actor_role: Role, id: Uuid) -> Result<(), DomainError> {
        require_admin(actor_role)?;
        self.repo.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    struct MemoryCatalog {
        services: Mutex<Vec<ServiceView>>,
    }

    impl MemoryCatalog {
        fn with(items: Vec<ServiceView>) -> Self {
            Self {
                services: Mutex::new(items),
            }
        }
    }

    impl CatalogRepository for MemoryCatalog {
        fn list(&self) -> Result<Vec<ServiceView>, DomainError> {
            Ok(self.services.lock().unwrap().clone())
        }

        fn find(&self, id: Uuid) -> Result<Option<ServiceView>, DomainError> {
            Ok(self
                .services
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == id)
                .cloned())
        }

        fn create(&self, input: NewServiceInput) -> Result<ServiceView, DomainError> {
            let service = ServiceView {
                id: Uuid::new_v4(),
                name: input.name,
                description: input.description,
                price: input.price,
                average_rating: None,
                created_at: Utc::now(),
            };
            self.services.lock().unwrap().push(service.clone());
            Ok(service)
        }

        fn update(&self, id: Uuid, changes: ServiceChanges) -> Result<ServiceView, DomainError> {
            let mut services = self.services.lock().unwrap();
            let service = services
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(DomainError::NotFound("service"))?;
            if let Some(price) = changes.price {
                service.price = price;
            }
            Ok(service.clone())
        }

        fn delete(&self, id: Uuid) -> Result<(), DomainError> {
            let mut services = self.services.lock().unwrap();
            let before = services.len();
            services.retain(|s| s.id != id);
            if services.len() == before {
                return Err(DomainError::NotFound("service"));
            }
            Ok(())
        }
    }

    fn service(name: &str, price: &str, rating: Option<f64>) -> ServiceView {
        ServiceView {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            price: BigDecimal::from_str(price).unwrap(),
            average_rating: rating,
            created_at: Utc::now(),
        }
    }

    fn input(name: &str, price: &str) -> NewServiceInput {
        NewServiceInput {
            name: name.to_string(),
            description: String::new(),
            price: BigDecimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn create_is_admin_only() {
        let svc = CatalogService::new(MemoryCatalog::default());

        let err = svc.create(Role::Client, input("Cleaning", "10.00")).unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        svc.create(Role::Admin, input("Cleaning", "10.00"))
            .expect("admin create failed");
    }

    #[test]
    fn default_ordering_is_rating_descending_with_unrated_last() {
        let svc = CatalogService::new(MemoryCatalog::with(vec![
            service("Unrated", "1.00", None),
            service("Low", "1.00", Some(2.0)),
            service("High", "1.00", Some(4.5)),
        ]));

        let listed = svc.list(None).expect("list failed");
        let names: Vec<&str> = listed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["High", "Low", "Unrated"]);
    }

    #[test]
    fn price_ordering_uses_decimal_comparison() {
        let svc = CatalogService::new(MemoryCatalog::with(vec![
            service("Mid", "10.50", None),
            service("Cheap", "2.00", None),
            service("Pricey", "100.00", None),
        ]));

        let listed = svc.list(Some("price")).expect("list failed");
        let names: Vec<&str> = listed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Cheap", "Mid", "Pricey"]);
    }

    #[test]
    fn unknown_ordering_is_a_validation_error() {
        let svc = CatalogService::new(MemoryCatalog::default());
        let err = svc.list(Some("created_at")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_price_is_rejected_before_the_repo() {
        let svc = CatalogService::new(MemoryCatalog::default());
        let err = svc.create(Role::Admin, input("Bad", "-1.00")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
