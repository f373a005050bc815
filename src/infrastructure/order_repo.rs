use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    CheckoutDetails, OrderItemView, OrderStatus, OrderStatusPatch, OrderView, PaymentMethod,
    PaymentStatus,
};
use crate::domain::ports::OrderRepository;
use crate::models::cart::CartItem;
use crate::models::order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusChangeset};
use crate::models::service::Service;
use crate::schema::{cart_items, order_items, orders, services};

use super::cart_repo::get_or_create_cart;

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn order_view(row: Order, items: Vec<OrderItemView>) -> Result<OrderView, DomainError> {
    let status: OrderStatus = row
        .status
        .parse()
        .map_err(|_| DomainError::Internal(format!("corrupt order status '{}'", row.status)))?;
    let payment_status: PaymentStatus = row.payment_status.parse().map_err(|_| {
        DomainError::Internal(format!("corrupt payment status '{}'", row.payment_status))
    })?;
    let payment_method = row
        .payment_method
        .as_deref()
        .map(|m| {
            m.parse::<PaymentMethod>()
                .map_err(|_| DomainError::Internal(format!("corrupt payment method '{m}'")))
        })
        .transpose()?;

    Ok(OrderView {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        address: row.address,
        status,
        payment_status,
        payment_method,
        total_amount: row.total_amount,
        created_at: row.created_at,
        items,
    })
}

fn load_items(
    conn: &mut PgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderItemView>>, DomainError> {
    let rows: Vec<(OrderItem, Service)> = order_items::table
        .inner_join(services::table)
        .filter(order_items::order_id.eq_any(order_ids))
        .order(order_items::created_at.asc())
        .select((OrderItem::as_select(), Service::as_select()))
        .load(conn)?;

    let mut grouped: HashMap<Uuid, Vec<OrderItemView>> = HashMap::new();
    for (item, service) in rows {
        grouped.entry(item.order_id).or_default().push(OrderItemView {
            id: item.id,
            service_id: service.id,
            service_name: service.name,
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
        });
    }
    Ok(grouped)
}

fn load_order(conn: &mut PgConnection, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
    let row = orders::table
        .find(order_id)
        .select(Order::as_select())
        .first(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items = load_items(conn, &[row.id])?.remove(&row.id).unwrap_or_default();
    Some(order_view(row, items)).transpose()
}

fn load_order_list(conn: &mut PgConnection, rows: Vec<Order>) -> Result<Vec<OrderView>, DomainError> {
    let ids: Vec<Uuid> = rows.iter().map(|o| o.id).collect();
    let mut items = load_items(conn, &ids)?;
    rows.into_iter()
        .map(|row| {
            let order_items = items.remove(&row.id).unwrap_or_default();
            order_view(row, order_items)
        })
        .collect()
}

impl OrderRepository for DieselOrderRepository {
    /// Snapshot the cart into an order. One transaction covers the order
    /// insert, the line snapshots, the total, and the cart wipe: either the
    /// order is fully created and the cart emptied, or nothing happened.
    fn checkout(&self, user_id: Uuid, details: CheckoutDetails) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let cart_id = get_or_create_cart(conn, user_id)?;

            let cart_rows: Vec<(CartItem, Service)> = cart_items::table
                .inner_join(services::table)
                .filter(cart_items::cart_id.eq(cart_id))
                .order(cart_items::created_at.asc())
                .select((CartItem::as_select(), Service::as_select()))
                .load(conn)?;

            if cart_rows.is_empty() {
                return Err(DomainError::InvalidState("cart is empty".to_string()));
            }

            let order_id = Uuid::new_v4();
            diesel::insert_into(orders::table)
                .values(&NewOrder {
                    id: order_id,
                    user_id: Some(user_id),
                    name: details.name,
                    email: details.email,
                    phone: details.phone,
                    address: details.address,
                    status: OrderStatus::Pending.as_str().to_string(),
                    payment_status: PaymentStatus::Pending.as_str().to_string(),
                    total_amount: BigDecimal::from(0),
                })
                .execute(conn)?;

            // price_at_purchase is fixed here; later catalog price changes
            // must not reach this order.
            let mut total = BigDecimal::from(0);
            let new_items: Vec<NewOrderItem> = cart_rows
                .iter()
                .map(|(item, service)| {
                    total += &service.price * BigDecimal::from(item.quantity);
                    NewOrderItem {
                        id: Uuid::new_v4(),
                        order_id,
                        service_id: service.id,
                        quantity: item.quantity,
                        price_at_purchase: service.price.clone(),
                    }
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&new_items)
                .execute(conn)?;

            diesel::update(orders::table.find(order_id))
                .set((
                    orders::total_amount.eq(&total),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
                .execute(conn)?;

            load_order(conn, order_id)?
                .ok_or_else(|| DomainError::Internal("order vanished mid-transaction".to_string()))
        })
    }

    fn find(&self, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;
        load_order(&mut conn, order_id)
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .order(orders::created_at.desc())
            .select(Order::as_select())
            .load(&mut conn)?;

        load_order_list(&mut conn, rows)
    }

    fn list_all(&self) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .order(orders::created_at.desc())
            .select(Order::as_select())
            .load(&mut conn)?;

        load_order_list(&mut conn, rows)
    }

    fn mark_paid(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        method: PaymentMethod,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let current: Option<String> = orders::table
                .filter(orders::id.eq(order_id).and(orders::user_id.eq(user_id)))
                .select(orders::status)
                .first(conn)
                .optional()?;

            let current = current.ok_or(DomainError::NotFound("order"))?;
            // Payment is a state transition valid only from pending; paying a
            // completed or cancelled order is rejected rather than silently
            // "succeeding" again.
            if current != OrderStatus::Pending.as_str() {
                return Err(DomainError::InvalidState(format!(
                    "order is {current}, only pending orders can be paid"
                )));
            }

            diesel::update(orders::table.find(order_id))
                .set((
                    orders::status.eq(OrderStatus::Completed.as_str()),
                    orders::payment_status.eq(PaymentStatus::Paid.as_str()),
                    orders::payment_method.eq(method.as_str()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            load_order(conn, order_id)?
                .ok_or_else(|| DomainError::Internal("order vanished mid-transaction".to_string()))
        })
    }

    fn patch_status(
        &self,
        order_id: Uuid,
        patch: OrderStatusPatch,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated: Option<Order> = diesel::update(orders::table.find(order_id))
                .set(&OrderStatusChangeset {
                    status: patch.status.map(|s| s.as_str().to_string()),
                    payment_status: patch.payment_status.map(|s| s.as_str().to_string()),
                    updated_at: Some(Utc::now()),
                })
                .get_result(conn)
                .optional()?;

            let row = updated.ok_or(DomainError::NotFound("order"))?;
            let items = load_items(conn, &[row.id])?.remove(&row.id).unwrap_or_default();
            order_view(row, items)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use diesel::prelude::*;

    use super::DieselOrderRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{CheckoutDetails, OrderStatus, PaymentMethod, PaymentStatus};
    use crate::domain::ports::{CartRepository, OrderRepository};
    use crate::infrastructure::cart_repo::DieselCartRepository;
    use crate::schema::{cart_items, orders, services};
    use crate::test_support::{insert_service, insert_user, setup_db};

    fn details(name: &str) -> CheckoutDetails {
        CheckoutDetails {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            phone: "01700000000".to_string(),
            address: "12 Lake Road".to_string(),
        }
    }

    #[tokio::test]
    async fn checkout_totals_lines_and_empties_the_cart() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());

        let user = insert_user(&pool, "alice", "client");
        let a = insert_service(&pool, "Deep cleaning", "10.00");
        let b = insert_service(&pool, "Gardening", "5.00");

        carts.add_item(user, a).expect("add failed");
        carts.add_item(user, a).expect("add failed");
        carts.add_item(user, b).expect("add failed");

        let order = repo.checkout(user, details("Alice")).expect("checkout failed");

        assert_eq!(order.total_amount, BigDecimal::from_str("25.00").unwrap());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);

        let line_sum: BigDecimal = order.items.iter().map(|i| i.line_total()).sum();
        assert_eq!(order.total_amount, line_sum);

        assert!(carts.view(user).expect("view failed").items.is_empty());
    }

    #[tokio::test]
    async fn checkout_on_empty_cart_creates_no_order() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user = insert_user(&pool, "bob", "client");

        let err = repo.checkout(user, details("Bob")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        let mut conn = pool.get().expect("conn failed");
        let order_count: i64 = orders::table.count().get_result(&mut conn).expect("count failed");
        assert_eq!(order_count, 0);
    }

    #[tokio::test]
    async fn checkout_failure_rolls_back_order_and_keeps_cart() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());

        let user = insert_user(&pool, "carol", "client");
        // Two of these overflow NUMERIC(10, 2) when the running total is
        // written back, after the order row and its items already exist.
        let pricey = insert_service(&pool, "Estate renovation", "99999999.99");
        carts.add_item(user, pricey).expect("add failed");
        carts.add_item(user, pricey).expect("add failed");

        let err = repo.checkout(user, details("Carol")).unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));

        let mut conn = pool.get().expect("conn failed");
        let order_count: i64 = orders::table.count().get_result(&mut conn).expect("count failed");
        assert_eq!(order_count, 0, "partially built order must not survive");

        let cart = carts.view(user).expect("view failed");
        assert_eq!(cart.items.len(), 1, "cart must be untouched after rollback");
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn later_price_changes_do_not_touch_existing_orders() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());

        let user = insert_user(&pool, "dora", "client");
        let service = insert_service(&pool, "Painting", "80.00");
        carts.add_item(user, service).expect("add failed");

        let order = repo.checkout(user, details("Dora")).expect("checkout failed");

        let mut conn = pool.get().expect("conn failed");
        diesel::update(services::table.find(service))
            .set(services::price.eq(BigDecimal::from_str("120.00").unwrap()))
            .execute(&mut conn)
            .expect("price update failed");

        let reloaded = repo
            .find(order.id)
            .expect("find failed")
            .expect("order should exist");
        assert_eq!(
            reloaded.items[0].price_at_purchase,
            BigDecimal::from_str("80.00").unwrap()
        );
        assert_eq!(reloaded.total_amount, BigDecimal::from_str("80.00").unwrap());
    }

    #[tokio::test]
    async fn paying_a_pending_order_completes_it() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());

        let user = insert_user(&pool, "eve", "client");
        let service = insert_service(&pool, "Gardening", "25.00");
        carts.add_item(user, service).expect("add failed");
        let order = repo.checkout(user, details("Eve")).expect("checkout failed");

        let paid = repo
            .mark_paid(user, order.id, PaymentMethod::Cash)
            .expect("payment failed");

        assert_eq!(paid.status, OrderStatus::Completed);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.payment_method, Some(PaymentMethod::Cash));
    }

    #[tokio::test]
    async fn paying_twice_is_rejected() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());

        let user = insert_user(&pool, "frank", "client");
        let service = insert_service(&pool, "Painting", "80.00");
        carts.add_item(user, service).expect("add failed");
        let order = repo.checkout(user, details("Frank")).expect("checkout failed");

        repo.mark_paid(user, order.id, PaymentMethod::Bkash).expect("payment failed");
        let err = repo.mark_paid(user, order.id, PaymentMethod::Bkash).unwrap_err();

        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn paying_another_users_order_is_not_found() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());

        let owner = insert_user(&pool, "grace", "client");
        let other = insert_user(&pool, "mallory", "client");
        let service = insert_service(&pool, "Deep cleaning", "49.99");
        carts.add_item(owner, service).expect("add failed");
        let order = repo.checkout(owner, details("Grace")).expect("checkout failed");

        let err = repo
            .mark_paid(other, order.id, PaymentMethod::Cash)
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound("order")));
    }

    #[tokio::test]
    async fn checkout_leaves_no_stray_cart_items_for_other_users() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());

        let buyer = insert_user(&pool, "henry", "client");
        let bystander = insert_user(&pool, "iris", "client");
        let service = insert_service(&pool, "Gardening", "25.00");

        carts.add_item(buyer, service).expect("add failed");
        carts.add_item(bystander, service).expect("add failed");

        repo.checkout(buyer, details("Henry")).expect("checkout failed");

        let mut conn = pool.get().expect("conn failed");
        let remaining: i64 = cart_items::table
            .count()
            .get_result(&mut conn)
            .expect("count failed");
        assert_eq!(remaining, 1, "only the buyer's cart is cleared");
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_user() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());

        let a = insert_user(&pool, "jack", "client");
        let b = insert_user(&pool, "kate", "client");
        let service = insert_service(&pool, "Painting", "80.00");

        carts.add_item(a, service).expect("add failed");
        repo.checkout(a, details("Jack")).expect("checkout failed");
        carts.add_item(b, service).expect("add failed");
        repo.checkout(b, details("Kate")).expect("checkout failed");

        assert_eq!(repo.list_for_user(a).expect("list failed").len(), 1);
        assert_eq!(repo.list_all().expect("list failed").len(), 2);
    }
}
