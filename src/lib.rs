#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the splitgate application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod api;
pub mod error;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use error::BridgeError;
pub use handlers::{
    configure_services, get_categories, get_group_data, get_group_users, get_groups, health,
    index, logout, oauth_callback,
};
pub use models::{AccessToken, SessionRecord};
pub use oauth::{HandshakeEngine, SplitwiseClient};
pub use session::{SessionManager, SessionStore};
pub use settings::BridgeSettings;
