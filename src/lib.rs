pub mod application;
pub mod auth;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod models;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_support;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};
pub use infrastructure::gateway::{GatewayClient, GatewayConfig};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::profile,
        handlers::auth::update_profile,
        handlers::auth::promote,
        handlers::services::list_services,
        handlers::services::get_service,
        handlers::services::create_service,
        handlers::services::update_service,
        handlers::services::delete_service,
        handlers::cart::view_cart,
        handlers::cart::add_item,
        handlers::cart::remove_item,
        handlers::reviews::list_reviews,
        handlers::reviews::create_review,
        handlers::reviews::delete_review,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::checkout,
        handlers::orders::update_order_status,
        handlers::payment::pay,
        handlers::payment::initiate_hosted_payment,
    ),
    components(schemas(
        handlers::auth::RegisterRequest,
        handlers::auth::LoginRequest,
        handlers::auth::RefreshRequest,
        handlers::auth::UpdateProfileRequest,
        handlers::auth::UserResponse,
        handlers::auth::TokenPairResponse,
        handlers::auth::AccessTokenResponse,
        handlers::services::CreateServiceRequest,
        handlers::services::UpdateServiceRequest,
        handlers::services::ServiceResponse,
        handlers::cart::AddCartItemRequest,
        handlers::cart::CartItemResponse,
        handlers::cart::CartResponse,
        handlers::reviews::CreateReviewRequest,
        handlers::reviews::ReviewResponse,
        handlers::orders::CheckoutRequest,
        handlers::orders::UpdateOrderStatusRequest,
        handlers::orders::OrderItemResponse,
        handlers::orders::OrderResponse,
        handlers::payment::PaymentRequest,
        handlers::payment::InitiatePaymentRequest,
        handlers::payment::InitiatePaymentResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login, profile, promotion"),
        (name = "services", description = "Household-services catalog"),
        (name = "cart", description = "Per-user cart"),
        (name = "reviews", description = "Service reviews"),
        (name = "orders", description = "Checkout and order history"),
        (name = "payment", description = "Simulated payment and hosted payment page"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    gateway: GatewayClient,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(gateway.clone()))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .route("/register", web::post().to(handlers::auth::register))
                    .route("/login", web::post().to(handlers::auth::login))
                    .route("/token/refresh", web::post().to(handlers::auth::refresh))
                    .route("/profile", web::get().to(handlers::auth::profile))
                    .route("/profile", web::patch().to(handlers::auth::update_profile))
                    .route("/promote/{user_id}", web::patch().to(handlers::auth::promote))
                    .route("/services", web::get().to(handlers::services::list_services))
                    .route("/services", web::post().to(handlers::services::create_service))
                    .route("/services/{id}", web::get().to(handlers::services::get_service))
                    .route(
                        "/services/{id}",
                        web::patch().to(handlers::services::update_service),
                    )
                    .route(
                        "/services/{id}",
                        web::delete().to(handlers::services::delete_service),
                    )
                    .route("/cart", web::get().to(handlers::cart::view_cart))
                    .route("/cart/items", web::post().to(handlers::cart::add_item))
                    .route(
                        "/cart/items/{id}",
                        web::delete().to(handlers::cart::remove_item),
                    )
                    .route("/reviews", web::get().to(handlers::reviews::list_reviews))
                    .route("/reviews", web::post().to(handlers::reviews::create_review))
                    .route(
                        "/reviews/{id}",
                        web::delete().to(handlers::reviews::delete_review),
                    )
                    .route("/orders", web::get().to(handlers::orders::list_orders))
                    .route("/orders", web::post().to(handlers::orders::checkout))
                    .route("/orders/{id}", web::get().to(handlers::orders::get_order))
                    .route(
                        "/orders/{id}",
                        web::patch().to(handlers::orders::update_order_status),
                    )
                    // Same pipeline as POST /orders; kept as an explicit alias.
                    .route("/checkout", web::post().to(handlers::orders::checkout))
                    .route("/payment", web::post().to(handlers::payment::pay))
                    .route(
                        "/payment/initiate",
                        web::post().to(handlers::payment::initiate_hosted_payment),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
