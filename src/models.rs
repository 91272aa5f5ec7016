//! Session-side data model: OAuth credential pairs, the server-side session record,
//! and the payload carried inside the session cookie.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Long-lived credential pair authorizing expense API calls for one user
///
/// Never serialized to the client. `Debug` redacts the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
}

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.token)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Short-lived credential pair from the first leg of the handshake
#[derive(Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

impl RequestToken {
    #[must_use]
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestToken")
            .field("token", &self.token)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Server-side state for one logged-in user
///
/// Replaced, never mutated: a refresh or a new login produces a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: String,
    pub session_id: String,
    pub access_token: AccessToken,
}

impl SessionRecord {
    #[must_use]
    pub const fn new(user_id: String, session_id: String, access_token: AccessToken) -> Self {
        Self {
            user_id,
            session_id,
            access_token,
        }
    }

    /// Same user and access token under a new session id
    #[must_use]
    pub fn refreshed(&self, session_id: String) -> Self {
        Self {
            user_id: self.user_id.clone(),
            session_id,
            access_token: self.access_token.clone(),
        }
    }

    /// The client-visible part of this record
    #[must_use]
    pub fn cookie_payload(&self) -> CookiePayload {
        CookiePayload {
            username: self.user_id.clone(),
            sessionid: self.session_id.clone(),
        }
    }
}

/// Decoded content of the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePayload {
    pub username: String,
    pub sessionid: String,
}
