#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use splitgate::{
    api::ExpenseApi,
    handlers::{configure_services, cors_layer},
    oauth::{AuthorizationProvider, HandshakeEngine, SplitwiseClient},
    session::{SessionManager, SessionStore},
    settings::BridgeSettings,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml, .env and environment variables
    let settings = BridgeSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.logging.level.as_str()),
    )
    .init();

    let client = Arc::new(
        SplitwiseClient::new(&settings.oauth, &settings.api)
            .map_err(|e| std::io::Error::other(format!("Failed to build Splitwise client: {e}")))?,
    );

    let cookie_options = settings
        .cookie_options()
        .map_err(|e| std::io::Error::other(format!("Invalid cookie settings: {e}")))?;
    let session_manager = SessionManager::new(
        cookie_options,
        settings.session.token_max_age_seconds,
        Arc::new(SessionStore::new()),
    );

    start_server(client, session_manager, settings).await
}

/// Start the server with the in-memory session store
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    client: Arc<SplitwiseClient>,
    session_manager: SessionManager,
    settings: BridgeSettings,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let provider: Arc<dyn AuthorizationProvider> = client.clone();
    let api: Arc<dyn ExpenseApi> = client;

    // Shared by every worker so a callback can land on any of them
    let handshake = web::Data::new(HandshakeEngine::new(
        provider,
        settings.oauth.pending_ttl_seconds,
    ));
    let api = web::Data::from(api);
    let session_manager = web::Data::new(session_manager);
    let spa_origin = settings.application.spa_origin.clone();
    let settings = web::Data::new(settings);

    HttpServer::new(move || {
        App::new()
            .app_data(settings.clone())
            .app_data(session_manager.clone())
            .app_data(handshake.clone())
            .app_data(api.clone())
            .wrap(cors_layer(&spa_origin))
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &BridgeSettings) {
    println!("Starting Splitgate on http://{bind_address}");
    println!("Session Backend: in-memory, one session per user");
    println!();
    println!("Session endpoints:");
    println!("  GET  /          - Refresh session or start Splitwise authorization");
    println!("  GET  /expenses  - OAuth callback from Splitwise");
    println!("  GET  /logout    - Clear session");
    println!();
    println!("OAuth callback URL registered with Splitwise:");
    println!("  {}", settings.oauth.callback_url);
    println!();
    println!("Data endpoints (session cookie required):");
    println!("  GET  /getGroups");
    println!("  GET  /GetGroupUsers?groupID=");
    println!("  GET  /GetGroupData?groupID=&startYear=&startMonth=&startDay=&endYear=&endMonth=&endDay=");
    println!("  GET  /GetCategories");
    println!();
    println!("System endpoints:");
    println!("  GET  /ping      - Health check");
    println!("SPA origin: {}", settings.application.spa_origin);
}
