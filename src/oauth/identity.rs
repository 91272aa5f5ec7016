use serde::Deserialize;

use crate::api::{fetch, ExpenseApi};
use crate::models::AccessToken;
use crate::utils::logging::LoggingHelper;

#[derive(Deserialize)]
struct CurrentUserResponse {
    user: CurrentUser,
}

#[derive(Deserialize)]
struct CurrentUser {
    id: u64,
}

/// Resolve the stable user id behind an access token
///
/// Returns `None` if the call fails or the response does not carry a numeric
/// `user.id`. The caller must abort the login in that case.
pub async fn resolve_user_id(api: &dyn ExpenseApi, access_token: &AccessToken) -> Option<String> {
    match fetch::<CurrentUserResponse>(api, access_token, "get_current_user", &[]).await {
        Ok(response) => Some(response.user.id.to_string()),
        Err(e) => {
            LoggingHelper::log_identity_unresolved(&e.to_string());
            None
        }
    }
}
