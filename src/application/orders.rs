use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{CheckoutDetails, OrderStatusPatch, OrderView};
use crate::domain::ports::OrderRepository;
use crate::domain::user::{Role, UserView};

/// Checkout contact fields as submitted; anything omitted falls back to the
/// caller's profile.
#[derive(Debug, Clone, Default)]
pub struct CheckoutDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CheckoutDraft {
    fn resolve(self, user: &UserView) -> CheckoutDetails {
        CheckoutDetails {
            name: self.name.unwrap_or_else(|| user.username.clone()),
            email: self.email.unwrap_or_else(|| user.email.clone()),
            phone: self.phone.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
        }
    }
}

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn checkout(&self, user: &UserView, draft: CheckoutDraft) -> Result<OrderView, DomainError> {
        self.repo.checkout(user.id, draft.resolve(user))
    }

    pub fn list(&self, actor: &UserView) -> Result<Vec<OrderView>, DomainError> {
        if actor.role.is_admin() {
            self.repo.list_all()
        } else {
            self.repo.list_for_user(actor.id)
        }
    }

    /// Admins see any order; clients only their own. A foreign order id
    /// reads as missing rather than forbidden.
    pub fn get(&self, actor: &UserView, order_id: Uuid) -> Result<OrderView, DomainError> {
        let order = self
            .repo
            .find(order_id)?
            .ok_or(DomainError::NotFound("order"))?;
        if !actor.role.is_admin() && order.user_id != Some(actor.id) {
            return Err(DomainError::NotFound("order"));
        }
        Ok(order)
    }

    pub fn patch_status(
        &self,
        actor_role: Role,
        order_id: Uuid,
        status: Option<&str>,
        payment_status: Option<&str>,
    ) -> Result<OrderView, DomainError> {
        if !actor_role.is_admin() {
            return Err(DomainError::PermissionDenied(
                "only admins can update order status".into(),
            ));
        }
        let patch = OrderStatusPatch {
            status: status.map(str::parse).transpose()?,
            payment_status: payment_status.map(str::parse).transpose()?,
        };
        self.repo.patch_status(order_id, patch)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bigdecimal::BigDecimal;
    use chrono::Utc;

    use super::*;
    use crate::domain::order::{OrderStatus, PaymentMethod, PaymentStatus};

    #[derive(Default)]
    struct MemoryOrders {
        orders: Mutex<Vec<OrderView>>,
    }

    fn order_for(user_id: Uuid) -> OrderView {
        OrderView {
            id: Uuid::new_v4(),
            user_id: Some(user_id),
            name: "Someone".into(),
            email: "someone@example.com".into(),
            phone: String::new(),
            address: String::new(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            total_amount: BigDecimal::from(0),
            created_at: Utc::now(),
            items: vec![],
        }
    }

    impl MemoryOrders {
        fn with(orders: Vec<OrderView>) -> Self {
            Self {
                orders: Mutex::new(orders),
            }
        }
    }

    impl OrderRepository for MemoryOrders {
        fn checkout(
            &self,
            user_id: Uuid,
            details: CheckoutDetails,
        ) -> Result<OrderView, DomainError> {
            let mut order = order_for(user_id);
            order.name = details.name;
            order.email = details.email;
            order.phone = details.phone;
            order.address = details.address;
            self.orders.lock().unwrap().push(order.clone());
            Ok(order)
        }

        fn find(&self, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.id == order_id)
                .cloned())
        }

        fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.user_id == Some(user_id))
                .cloned()
                .collect())
        }

        fn list_all(&self) -> Result<Vec<OrderView>, DomainError> {
            Ok(self.orders.lock().unwrap().clone())
        }

        fn mark_paid(
            &self,
            user_id: Uuid,
            order_id: Uuid,
            method: PaymentMethod,
        ) -> Result<OrderView, DomainError> {
            let mut orders = self.orders.lock().unwrap();
            let order = orders
                .iter_mut()
                .find(|o| o.id == order_id && o.user_id == Some(user_id))
                .ok_or(DomainError::NotFound("order"))?;
            if order.status != OrderStatus::Pending {
                return Err(DomainError::InvalidState("not pending".into()));
            }
            order.status = OrderStatus::Completed;
            order.payment_status = PaymentStatus::Paid;
            order.payment_method = Some(method);
            Ok(order.clone())
        }

        fn patch_status(
            &self,
            order_id: Uuid,
            patch: OrderStatusPatch,
        ) -> Result<OrderView, DomainError> {
            let mut orders = self.orders.lock().unwrap();
            let order = orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or(DomainError::NotFound("order"))?;
            if let Some(status) = patch.status {
                order.status = status;
            }
            if let Some(payment_status) = patch.payment_status {
                order.payment_status = payment_status;
            }
            Ok(order.clone())
        }
    }

    fn user(role: Role) -> UserView {
        UserView {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            role,
            bio: None,
            profile_picture: None,
            facebook: None,
            twitter: None,
            linkedin: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn checkout_defaults_contact_fields_from_the_profile() {
        let svc = OrderService::new(MemoryOrders::default());
        let caller = user(Role::Client);

        let order = svc
            .checkout(&caller, CheckoutDraft::default())
            .expect("checkout failed");

        assert_eq!(order.name, "alice");
        assert_eq!(order.email, "alice@example.com");
        assert_eq!(order.phone, "");
    }

    #[test]
    fn submitted_contact_fields_win_over_the_profile() {
        let svc = OrderService::new(MemoryOrders::default());
        let caller = user(Role::Client);

        let order = svc
            .checkout(
                &caller,
                CheckoutDraft {
                    name: Some("Alice Rahman".into()),
                    phone: Some("01700000000".into()),
                    ..Default::default()
                },
            )
            .expect("checkout failed");

        assert_eq!(order.name, "Alice Rahman");
        assert_eq!(order.phone, "01700000000");
        assert_eq!(order.email, "alice@example.com");
    }

    #[test]
    fn clients_cannot_read_foreign_orders() {
        let stranger = order_for(Uuid::new_v4());
        let svc = OrderService::new(MemoryOrders::with(vec![stranger.clone()]));

        let err = svc.get(&user(Role::Client), stranger.id).unwrap_err();
        assert!(matches!(err, DomainError::NotFound("order")));

        // Admins can.
        svc.get(&user(Role::Admin), stranger.id).expect("admin read failed");
    }

    #[test]
    fn listing_is_role_dependent() {
        let mine = user(Role::Client);
        let svc = OrderService::new(MemoryOrders::with(vec![
            order_for(mine.id),
            order_for(Uuid::new_v4()),
        ]));

        assert_eq!(svc.list(&mine).expect("list failed").len(), 1);
        assert_eq!(svc.list(&user(Role::Admin)).expect("list failed").len(), 2);
    }

    #[test]
    fn status_patch_is_admin_only_and_validated() {
        let target = order_for(Uuid::new_v4());
        let svc = OrderService::new(MemoryOrders::with(vec![target.clone()]));

        let err = svc
            .patch_status(Role::Client, target.id, Some("cancelled"), None)
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let err = svc
            .patch_status(Role::Admin, target.id, Some("shipped"), None)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let patched = svc
            .patch_status(Role::Admin, target.id, Some("cancelled"), None)
            .expect("patch failed");
        assert_eq!(patched.status, OrderStatus::Cancelled);
    }
}
