// Login, OAuth callback and logout handlers
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::api::ExpenseApi;
use crate::error::BridgeError;
use crate::oauth::{resolve_user_id, HandshakeEngine};
use crate::session::SessionManager;
use crate::settings::BridgeSettings;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub oauth_token: Option<String>,
    pub oauth_verifier: Option<String>,
}

/// `GET /`: refresh a live session, otherwise start a handshake
///
/// # Errors
///
/// Returns [`BridgeError::UpstreamAuth`] if the handshake cannot be started and
/// [`BridgeError::Encoding`] if a refreshed cookie cannot be encoded
pub async fn index(
    req: HttpRequest,
    settings: web::Data<BridgeSettings>,
    session_manager: web::Data<SessionManager>,
    handshake: web::Data<HandshakeEngine>,
) -> Result<HttpResponse, BridgeError> {
    if let Ok(record) = session_manager.validate_request(&req) {
        // A session cleared or replaced mid-request falls through to a new handshake
        match session_manager.refresh(&record) {
            Ok((_, cookie)) => {
                return Ok(ResponseBuilder::spa_redirect(
                    &settings.application.spa_origin,
                    vec![cookie],
                ));
            }
            Err(e) if e.is_unauthenticated() => {}
            Err(e) => return Err(e),
        }
    }

    let authorization_url = handshake.start().await?;
    Ok(ResponseBuilder::redirect_with_cookies(
        &authorization_url,
        Vec::new(),
    ))
}

/// `GET /expenses`: OAuth callback
///
/// Completes the handshake, resolves the user and issues the session cookie. Any
/// failure leaves no session behind.
///
/// # Errors
///
/// - [`BridgeError::UpstreamAuth`] if the callback is incomplete or the exchange fails
/// - [`BridgeError::IdentityResolution`] if the user id cannot be resolved
/// - [`BridgeError::Encoding`] if the cookie cannot be encoded
pub async fn oauth_callback(
    query: web::Query<CallbackQuery>,
    settings: web::Data<BridgeSettings>,
    session_manager: web::Data<SessionManager>,
    handshake: web::Data<HandshakeEngine>,
    api: web::Data<dyn ExpenseApi>,
) -> Result<HttpResponse, BridgeError> {
    let CallbackQuery {
        oauth_token: Some(token),
        oauth_verifier: Some(verifier),
    } = query.into_inner()
    else {
        LoggingHelper::log_handshake_failed("callback", "missing oauth_token or oauth_verifier");
        return Err(BridgeError::UpstreamAuth(
            "callback is missing oauth_token or oauth_verifier".to_string(),
        ));
    };

    let access_token = handshake.complete(&token, &verifier).await?;

    let user_id = resolve_user_id(api.get_ref(), &access_token)
        .await
        .ok_or(BridgeError::IdentityResolution)?;

    let cookie = session_manager.establish(user_id.clone(), access_token)?;
    LoggingHelper::log_session_established(&user_id);

    Ok(ResponseBuilder::spa_redirect(
        &settings.application.spa_origin,
        vec![cookie],
    ))
}

/// `GET /logout`: drop the session and expire the cookie
///
/// # Errors
///
/// Returns the validation error (401) if the request has no live session
pub async fn logout(
    req: HttpRequest,
    settings: web::Data<BridgeSettings>,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse, BridgeError> {
    let expired = session_manager.logout(&req)?;
    Ok(ResponseBuilder::ok_with_cookies(
        &settings.application.spa_origin,
        vec![expired],
    ))
}
