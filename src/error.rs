//! Error taxonomy shared by the session core and the data handlers.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::utils::responses::ResponseBuilder;

/// Errors surfaced by the bridge
///
/// Each variant maps to exactly one HTTP status through [`ResponseError`]. None of
/// them are retried automatically; the caller decides.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The authorization server rejected a handshake step
    #[error("upstream authorization failed: {0}")]
    UpstreamAuth(String),

    /// The cookie payload could not be serialized or sealed
    #[error("cookie encoding failed: {0}")]
    Encoding(String),

    /// The cookie value is malformed, expired, or fails integrity validation
    #[error("cookie decoding failed: {0}")]
    Decoding(String),

    /// The cookie decoded but does not match a live server-side session
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// The handshake succeeded but the user identity could not be established
    #[error("identity resolution failed")]
    IdentityResolution,

    /// A data call to the expense API failed or returned an unexpected shape
    #[error("upstream data error: {0}")]
    UpstreamData(String),

    /// Request parameters are missing or invalid
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Startup configuration is unusable
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BridgeError {
    /// Whether this error means "no valid session" rather than a server fault
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::UpstreamAuth(_)
                | Self::Decoding(_)
                | Self::InvalidSession(_)
                | Self::IdentityResolution
        )
    }
}

impl ResponseError for BridgeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UpstreamAuth(_)
            | Self::Decoding(_)
            | Self::InvalidSession(_)
            | Self::IdentityResolution => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Encoding(_) | Self::UpstreamData(_) | Self::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => ResponseBuilder::unauthorized(),
            StatusCode::BAD_REQUEST => ResponseBuilder::bad_request(&self.to_string()),
            _ => ResponseBuilder::internal_server_error(),
        }
    }
}
