//! OAuth 1.0a module
//!
//! Request signing, the Splitwise HTTP client, the handshake engine with its
//! pending-token table, and identity resolution for a freshly issued access token.

pub mod client;
pub mod handshake;
pub mod identity;
pub mod provider;
pub mod signer;

pub use client::SplitwiseClient;
pub use handshake::{HandshakeEngine, PendingHandshakes, DEFAULT_PENDING_TTL_SECONDS};
pub use identity::resolve_user_id;
pub use provider::AuthorizationProvider;
pub use signer::OAuthSigner;
