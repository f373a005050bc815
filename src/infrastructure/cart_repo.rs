use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{CartItemView, CartView};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::models::cart::{CartItem, NewCart, NewCartItem};
use crate::models::service::Service;
use crate::schema::{cart_items, carts, services};

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Get-or-create the user's cart. The unique index on `carts.user_id` plus
/// `ON CONFLICT DO NOTHING` absorbs the race when two requests arrive at once.
pub(crate) fn get_or_create_cart(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Uuid, DomainError> {
    diesel::insert_into(carts::table)
        .values(&NewCart {
            id: Uuid::new_v4(),
            user_id,
        })
        .on_conflict(carts::user_id)
        .do_nothing()
        .execute(conn)?;

    let cart_id = carts::table
        .filter(carts::user_id.eq(user_id))
        .select(carts::id)
        .first(conn)?;

    Ok(cart_id)
}

fn load_cart(conn: &mut PgConnection, cart_id: Uuid) -> Result<CartView, DomainError> {
    let rows: Vec<(CartItem, Service)> = cart_items::table
        .inner_join(services::table)
        .filter(cart_items::cart_id.eq(cart_id))
        .order(cart_items::created_at.asc())
        .select((CartItem::as_select(), Service::as_select()))
        .load(conn)?;

    Ok(CartView {
        id: cart_id,
        items: rows
            .into_iter()
            .map(|(item, service)| CartItemView {
                id: item.id,
                service_id: service.id,
                service_name: service.name,
                unit_price: service.price,
                quantity: item.quantity,
            })
            .collect(),
    })
}

impl CartRepository for DieselCartRepository {
    fn add_item(&self, user_id: Uuid, service_id: Uuid) -> Result<CartView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let known: Option<Uuid> = services::table
                .find(service_id)
                .select(services::id)
                .first(conn)
                .optional()?;
            if known.is_none() {
                return Err(DomainError::NotFound("service"));
            }

            let cart_id = get_or_create_cart(conn, user_id)?;

            // Same (cart, service) pair twice means one row with quantity + 1.
            diesel::insert_into(cart_items::table)
                .values(&NewCartItem {
                    id: Uuid::new_v4(),
                    cart_id,
                    service_id,
                    quantity: 1,
                })
                .on_conflict((cart_items::cart_id, cart_items::service_id))
                .do_update()
                .set(cart_items::quantity.eq(cart_items::quantity + 1))
                .execute(conn)?;

            load_cart(conn, cart_id)
        })
    }

    fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        // Scoped to the caller's own cart; an item id belonging to another
        // user behaves as if it did not exist.
        let own_cart = carts::table
            .filter(carts::user_id.eq(user_id))
            .select(carts::id);
        let deleted = diesel::delete(
            cart_items::table.filter(
                cart_items::id
                    .eq(item_id)
                    .and(cart_items::cart_id.eq_any(own_cart)),
            ),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(DomainError::NotFound("cart item"));
        }
        Ok(())
    }

    fn view(&self, user_id: Uuid) -> Result<CartView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let cart_id = get_or_create_cart(conn, user_id)?;
            load_cart(conn, cart_id)
        })
    }
}
