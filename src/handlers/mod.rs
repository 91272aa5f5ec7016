// HTTP request handlers for the bridge
use actix_cors::Cors;
use actix_web::web;

pub mod auth;
pub mod data;


// Re-export the main handler functions
pub use auth::{index, logout, oauth_callback};
pub use data::{get_categories, get_group_data, get_group_users, get_groups, health};

/// Request headers the SPA may send cross-origin
pub const ALLOWED_HEADERS: [&str; 9] = [
    "Accept",
    "X-Requested-With",
    "Content-Type",
    "Authorization",
    "Content-Length",
    "Accept-Encoding",
    "X-CSRF-Token",
    "Access-Control-Allow-Credentials",
    "Access-Control-Allow-Origin",
];

/// CORS layer admitting only the SPA origin, with credentials
#[must_use]
pub fn cors_layer(spa_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(spa_origin)
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(ALLOWED_HEADERS)
        .supports_credentials()
        .max_age(3600)
}

/// Register every route
///
/// Expects `BridgeSettings`, `SessionManager`, `HandshakeEngine` and
/// `dyn ExpenseApi` to be registered as app data.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Session endpoints
        .route("/", web::get().to(index))
        .route("/expenses", web::get().to(oauth_callback))
        .route("/logout", web::get().to(logout))
        // Data endpoints
        .route("/getGroups", web::get().to(get_groups))
        .route("/GetGroupUsers", web::get().to(get_group_users))
        .route("/GetGroupData", web::get().to(get_group_data))
        .route("/GetCategories", web::get().to(get_categories))
        // Health endpoint
        .route("/ping", web::get().to(health));
}
