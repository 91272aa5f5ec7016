//! HTTP response handling
//!
//! A single place that shapes every response the bridge sends: JSON error bodies,
//! redirects carrying cookies, and the credentialed CORS headers the SPA needs.

use actix_web::{cookie::Cookie, http::header, HttpResponse, HttpResponseBuilder};
use serde::Serialize;
use serde_json::json;

// ===============================
// CACHED RESPONSES FOR PERFORMANCE
// ===============================

/// Global instance of pre-serialized common responses
static CACHED_RESPONSES: std::sync::LazyLock<CachedResponses> =
    std::sync::LazyLock::new(CachedResponses::new);

/// Pre-serialized bodies for the responses sent on every rejected request
struct CachedResponses {
    unauthorized: String,
    server_error: String,
}

impl CachedResponses {
    fn new() -> Self {
        Self {
            unauthorized: Self::create_json(
                "unauthorized",
                "Authentication is required to access this resource",
            ),
            server_error: Self::create_json("server_error", "An internal server error occurred"),
        }
    }

    fn create_json(error: &str, description: &str) -> String {
        json!({
            "error": error,
            "error_description": description
        })
        .to_string()
    }
}

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    // ===============================
    // ERROR RESPONSE METHODS
    // ===============================

    /// `Unauthorized` (401) with the cached JSON body
    #[must_use]
    pub fn unauthorized() -> HttpResponse {
        HttpResponse::Unauthorized()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(CACHED_RESPONSES.unauthorized.clone())
    }

    /// `InternalServerError` (500) with the cached JSON body
    #[must_use]
    pub fn internal_server_error() -> HttpResponse {
        HttpResponse::InternalServerError()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(CACHED_RESPONSES.server_error.clone())
    }

    /// `BadRequest` (400) describing what was wrong with the request
    #[must_use]
    pub fn bad_request(description: &str) -> HttpResponse {
        HttpResponse::BadRequest()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(CachedResponses::create_json("invalid_request", description))
    }

    // ===============================
    // SUCCESS RESPONSE METHODS
    // ===============================

    /// Redirect (302 Found) carrying the given cookies
    #[must_use]
    pub fn redirect_with_cookies(location: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = HttpResponse::Found();

        for cookie in cookies {
            builder.cookie(cookie);
        }

        builder
            .append_header((header::LOCATION, location.to_string()))
            .finish()
    }

    /// Redirect to the SPA, carrying cookies and the credentialed CORS headers
    #[must_use]
    pub fn spa_redirect(spa_origin: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        Self::apply_cors(&mut builder, spa_origin);

        for cookie in cookies {
            builder.cookie(cookie);
        }

        builder
            .append_header((header::LOCATION, spa_origin.to_string()))
            .finish()
    }

    /// 200 JSON body with the credentialed CORS headers
    #[must_use]
    pub fn json_with_cors<T: Serialize>(body: &T, spa_origin: &str) -> HttpResponse {
        let mut builder = HttpResponse::Ok();
        Self::apply_cors(&mut builder, spa_origin);
        builder.json(body)
    }

    /// Empty 200 carrying cookies and the credentialed CORS headers
    #[must_use]
    pub fn ok_with_cookies(spa_origin: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = HttpResponse::Ok();
        Self::apply_cors(&mut builder, spa_origin);
        builder.insert_header((header::CONTENT_TYPE, "application/json"));

        for cookie in cookies {
            builder.cookie(cookie);
        }

        builder.finish()
    }

    /// Attach `Access-Control-Allow-Origin` restricted to the SPA and allow credentials
    pub fn apply_cors(builder: &mut HttpResponseBuilder, spa_origin: &str) {
        builder
            .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, spa_origin.to_string()))
            .insert_header((header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"));
    }
}
