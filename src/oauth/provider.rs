use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::BridgeError;
use crate::models::{AccessToken, RequestToken};

/// The authorization server side of the three-legged handshake
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Obtain a request token bound to the configured callback
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UpstreamAuth`] if the server rejects the request, does
    /// not confirm the callback, or cannot be reached
    async fn request_token(&self) -> Result<RequestToken, BridgeError>;

    /// URL the user is sent to for authorizing `request_token`
    fn authorization_url(&self, request_token: &RequestToken) -> String;

    /// Exchange an authorized request token and its verifier for an access token
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UpstreamAuth`] if the exchange is rejected or the server
    /// cannot be reached
    async fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, BridgeError>;
}

/// Credentials from a form-encoded token endpoint response
pub struct TokenResponse {
    pub token: String,
    pub secret: String,
    pub callback_confirmed: bool,
}

/// Parse a form-encoded token response (`oauth_token=..&oauth_token_secret=..`)
///
/// # Errors
///
/// Returns [`BridgeError::UpstreamAuth`] if either credential is missing or empty
pub fn parse_token_response(body: &str) -> Result<TokenResponse, BridgeError> {
    let fields: HashMap<String, String> = url::form_urlencoded::parse(body.trim().as_bytes())
        .into_owned()
        .collect();

    Ok(TokenResponse {
        token: non_empty(&fields, "oauth_token")?,
        secret: non_empty(&fields, "oauth_token_secret")?,
        callback_confirmed: fields
            .get("oauth_callback_confirmed")
            .is_some_and(|value| value == "true"),
    })
}

fn non_empty(fields: &HashMap<String, String>, name: &str) -> Result<String, BridgeError> {
    fields
        .get(name)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| BridgeError::UpstreamAuth(format!("token response is missing {name}")))
}
