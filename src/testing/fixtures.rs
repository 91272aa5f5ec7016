//! Test fixtures providing pre-built test objects
//!
//! Canned upstream bodies shaped like real Splitwise responses, test settings, and
//! [`TestState`], which registers everything the handlers expect as app data.

use actix_web::web;
use std::sync::Arc;

use super::constants::{TEST_SPA_ORIGIN, TEST_USER_ID};
use crate::api::ExpenseApi;
use crate::handlers::configure_services;
use crate::oauth::{AuthorizationProvider, HandshakeEngine, DEFAULT_PENDING_TTL_SECONDS};
use crate::session::{SessionManager, SessionStore};
use crate::settings::BridgeSettings;

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Valid settings for a non-TLS test server
    #[must_use]
    pub fn settings() -> BridgeSettings {
        let mut settings = BridgeSettings::default();
        settings.application.spa_origin = TEST_SPA_ORIGIN.to_string();
        settings.oauth.consumer_key = "test-consumer-key".to_string();
        settings.oauth.consumer_secret = "test-consumer-secret".to_string();
        settings.cookies.secure = false;
        settings
    }

    /// Session manager built from [`Self::settings`] with an empty store
    ///
    /// # Panics
    ///
    /// Panics if the test settings are invalid
    #[must_use]
    pub fn session_manager() -> SessionManager {
        let settings = Self::settings();
        SessionManager::new(
            settings.cookie_options().unwrap(),
            settings.session.token_max_age_seconds,
            Arc::new(SessionStore::new()),
        )
    }

    /// `oauth_token` query parameter of an authorization redirect
    ///
    /// # Panics
    ///
    /// Panics if `location` is not a URL carrying `oauth_token`
    #[must_use]
    pub fn request_token_from(location: &str) -> String {
        url::Url::parse(location)
            .unwrap()
            .query_pairs()
            .find(|(key, _)| key == "oauth_token")
            .map(|(_, value)| value.into_owned())
            .unwrap()
    }

    #[must_use]
    pub fn current_user_body() -> String {
        format!(
            r#"{{"user":{{"id":{TEST_USER_ID},"first_name":"Ada","last_name":"Lovelace","email":"ada@example.com"}}}}"#
        )
    }

    #[must_use]
    pub fn groups_body() -> &'static str {
        r#"{"groups":[
            {"id":0,"name":"Non-group expenses","updated_at":"2023-06-01T10:00:00Z","members":[]},
            {"id":7,"name":"Flatmates","updated_at":"2023-06-01T10:00:00Z","members":[]},
            {"id":9,"name":"Road trip","updated_at":"2023-07-14T08:00:00Z","members":[]}
        ]}"#
    }

    #[must_use]
    pub fn group_body() -> &'static str {
        r#"{"group":{"id":7,"name":"Flatmates","members":[
            {"id":42,"first_name":"Ada","last_name":"Lovelace","balance":[]},
            {"id":43,"first_name":"Grace","last_name":null,"balance":[]}
        ]}}"#
    }

    /// Four expenses for group 7: two inside 2023, one on each side of it
    #[must_use]
    pub fn expenses_body() -> &'static str {
        r#"{"expenses":[
            {"id":100,"group_id":7,"description":"Power","cost":"10.00","date":"2022-12-31T23:59:59Z",
             "category":{"id":5,"name":"Utilities"},
             "users":[{"user_id":42,"owed_share":"5.00","paid_share":"10.00"},{"user_id":43,"owed_share":"5.00","paid_share":"0.00"}]},
            {"id":101,"group_id":7,"description":"Market","cost":"10.00","date":"2023-01-01T00:00:00Z",
             "category":{"id":12,"name":"Groceries"},
             "users":[{"user_id":42,"owed_share":"10.00","paid_share":"0.00"},{"user_id":43,"owed_share":"0.00","paid_share":"10.00"}]},
            {"id":102,"group_id":7,"description":"December rent","cost":"800.00","date":"2023-12-31T18:30:00Z",
             "category":{"id":3,"name":"Rent"},
             "users":[{"user_id":42,"owed_share":"400.00","paid_share":"800.00"},{"user_id":43,"owed_share":"400.00","paid_share":"0.00"}]},
            {"id":103,"group_id":7,"description":"Snacks","cost":"3.00","date":"2024-01-01T00:00:00Z",
             "category":{"id":12,"name":"Groceries"},
             "users":[{"user_id":42,"owed_share":"3.00","paid_share":"3.00"}]}
        ]}"#
    }

    #[must_use]
    pub fn categories_body() -> &'static str {
        r#"{"categories":[
            {"id":1,"name":"Food and drink","icon":"https://example.com/food.png","subcategories":[
                {"id":12,"name":"Groceries"},{"id":13,"name":"Dining out"}
            ]},
            {"id":2,"name":"Utilities","subcategories":[]}
        ]}"#
    }
}

/// App data for a handler test, sharing its state with the test body
#[derive(Clone)]
pub struct TestState {
    pub settings: web::Data<BridgeSettings>,
    pub session_manager: web::Data<SessionManager>,
    pub handshake: web::Data<HandshakeEngine>,
    pub api: web::Data<dyn ExpenseApi>,
}

impl TestState {
    #[must_use]
    pub fn new(provider: Arc<dyn AuthorizationProvider>, api: Arc<dyn ExpenseApi>) -> Self {
        Self {
            settings: web::Data::new(TestFixtures::settings()),
            session_manager: web::Data::new(TestFixtures::session_manager()),
            handshake: web::Data::new(HandshakeEngine::new(
                provider,
                DEFAULT_PENDING_TTL_SECONDS,
            )),
            api: web::Data::from(api),
        }
    }

    /// Register the app data and every route
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.settings.clone())
            .app_data(self.session_manager.clone())
            .app_data(self.handshake.clone())
            .app_data(self.api.clone())
            .configure(configure_services);
    }
}
