//! Splitwise data API
//!
//! [`ExpenseApi`] is the seam between the handlers and the network: the real
//! implementation is [`crate::oauth::SplitwiseClient`], tests use a canned mock.

pub mod models;
pub mod service;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::BridgeError;
use crate::models::AccessToken;
use crate::utils::logging::LoggingHelper;

/// Signed GET access to the expense API on behalf of one user
#[async_trait]
pub trait ExpenseApi: Send + Sync {
    /// Raw response body of `GET <api base>/<endpoint>?<query>`
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UpstreamData`] if the call fails or returns a
    /// non-success status
    async fn get(
        &self,
        access_token: &AccessToken,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<String, BridgeError>;
}

/// Call `endpoint` and decode the body into `T`
///
/// # Errors
///
/// Returns [`BridgeError::UpstreamData`] if the call fails or the body does not
/// match `T`
pub async fn fetch<T: DeserializeOwned>(
    api: &dyn ExpenseApi,
    access_token: &AccessToken,
    endpoint: &str,
    query: &[(String, String)],
) -> Result<T, BridgeError> {
    let body = api.get(access_token, endpoint, query).await?;
    serde_json::from_str(&body).map_err(|e| {
        LoggingHelper::log_upstream_failure(endpoint, &format!("unexpected response shape: {e}"));
        BridgeError::UpstreamData(format!("{endpoint}: {e}"))
    })
}
