//! Session Management Module
//!
//! - [`codec`] - authenticated, encrypted cookie values
//! - [`id`] - session identifier generation
//! - [`store`] - in-memory session table
//! - [`cookie`] - cookie attributes and construction
//! - [`manager`] - validation, issuing, refresh and logout

pub mod codec;
pub mod cookie;
pub mod id;
pub mod manager;
pub mod store;

pub use codec::CookieCodec;
pub use cookie::{CookieFactory, CookieOptions, COOKIE_NAME};
pub use id::new_session_id;
pub use manager::SessionManager;
pub use store::SessionStore;
