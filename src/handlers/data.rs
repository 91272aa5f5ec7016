// Session-protected data endpoints
//
// Each handler validates the session before looking at its query string, so an
// unauthenticated request is a 401 even when its parameters are also wrong.
use actix_web::{web, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::api::service::{self, DateRange};
use crate::api::ExpenseApi;
use crate::error::BridgeError;
use crate::session::SessionManager;
use crate::settings::BridgeSettings;
use crate::utils::responses::ResponseBuilder;

#[derive(Deserialize)]
pub struct GroupQuery {
    #[serde(rename = "groupID")]
    pub group_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDataQuery {
    #[serde(rename = "groupID")]
    pub group_id: u64,
    pub start_year: i32,
    pub start_month: u32,
    pub start_day: u32,
    pub end_year: i32,
    pub end_month: u32,
    pub end_day: u32,
}

impl GroupDataQuery {
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidRequest`] if the dates are invalid or reversed
    pub fn date_range(&self) -> Result<DateRange, BridgeError> {
        DateRange::from_parts(
            (self.start_year, self.start_month, self.start_day),
            (self.end_year, self.end_month, self.end_day),
        )
    }
}

fn parse_query<T: DeserializeOwned>(req: &HttpRequest) -> Result<T, BridgeError> {
    web::Query::<T>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .map_err(|e| BridgeError::InvalidRequest(e.to_string()))
}

/// `GET /getGroups`
///
/// # Errors
///
/// 401 without a live session, 500 if the upstream call fails
pub async fn get_groups(
    req: HttpRequest,
    settings: web::Data<BridgeSettings>,
    session_manager: web::Data<SessionManager>,
    api: web::Data<dyn ExpenseApi>,
) -> Result<HttpResponse, BridgeError> {
    let record = session_manager.validate_request(&req)?;
    let groups = service::list_groups(api.get_ref(), &record.access_token).await?;
    Ok(ResponseBuilder::json_with_cors(
        &groups,
        &settings.application.spa_origin,
    ))
}

/// `GET /GetGroupUsers?groupID=`
///
/// # Errors
///
/// 401 without a live session, 400 without a numeric `groupID`, 500 if the
/// upstream call fails
pub async fn get_group_users(
    req: HttpRequest,
    settings: web::Data<BridgeSettings>,
    session_manager: web::Data<SessionManager>,
    api: web::Data<dyn ExpenseApi>,
) -> Result<HttpResponse, BridgeError> {
    let record = session_manager.validate_request(&req)?;
    let query: GroupQuery = parse_query(&req)?;

    let members = service::group_members(api.get_ref(), &record.access_token, query.group_id).await?;
    Ok(ResponseBuilder::json_with_cors(
        &members,
        &settings.application.spa_origin,
    ))
}

/// `GET /GetGroupData?groupID=&startYear=&startMonth=&startDay=&endYear=&endMonth=&endDay=`
///
/// # Errors
///
/// 401 without a live session, 400 on missing or invalid parameters, 500 if the
/// upstream call fails
pub async fn get_group_data(
    req: HttpRequest,
    settings: web::Data<BridgeSettings>,
    session_manager: web::Data<SessionManager>,
    api: web::Data<dyn ExpenseApi>,
) -> Result<HttpResponse, BridgeError> {
    let record = session_manager.validate_request(&req)?;
    let query: GroupDataQuery = parse_query(&req)?;
    let range = query.date_range()?;

    let rows =
        service::group_expenses(api.get_ref(), &record.access_token, query.group_id, &range)
            .await?;
    Ok(ResponseBuilder::json_with_cors(
        &rows,
        &settings.application.spa_origin,
    ))
}

/// `GET /GetCategories`
///
/// # Errors
///
/// 401 without a live session, 500 if the upstream call fails
pub async fn get_categories(
    req: HttpRequest,
    settings: web::Data<BridgeSettings>,
    session_manager: web::Data<SessionManager>,
    api: web::Data<dyn ExpenseApi>,
) -> Result<HttpResponse, BridgeError> {
    let record = session_manager.validate_request(&req)?;
    let categories = service::list_categories(api.get_ref(), &record.access_token).await?;
    Ok(ResponseBuilder::json_with_cors(
        &categories,
        &settings.application.spa_origin,
    ))
}

/// `GET /ping`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
