//! Translators from upstream responses to the payloads the SPA consumes

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;

use crate::api::models::{
    CategoriesResponse, Category, ExpensesResponse, GroupResponse, GroupsResponse, Member,
    ShareRow,
};
use crate::api::{fetch, ExpenseApi};
use crate::error::BridgeError;
use crate::models::AccessToken;

/// Inclusive range of calendar days, interpreted in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range from year/month/day parts
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidRequest`] if either date does not exist or the
    /// start falls after the end
    pub fn from_parts(start: (i32, u32, u32), end: (i32, u32, u32)) -> Result<Self, BridgeError> {
        let start = NaiveDate::from_ymd_opt(start.0, start.1, start.2)
            .ok_or_else(|| BridgeError::InvalidRequest("start date does not exist".to_string()))?;
        let end = NaiveDate::from_ymd_opt(end.0, end.1, end.2)
            .ok_or_else(|| BridgeError::InvalidRequest("end date does not exist".to_string()))?;

        if start > end {
            return Err(BridgeError::InvalidRequest(
                "start date is after end date".to_string(),
            ));
        }
        // The exclusive upper bound sent upstream is the day after `end`
        if end.succ_opt().is_none() {
            return Err(BridgeError::InvalidRequest("end date out of range".to_string()));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls on a day inside the range
    #[must_use]
    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        let day = date.date_naive();
        self.start <= day && day <= self.end
    }

    /// `(dated_after, dated_before)` as sent to `get_expenses`
    #[must_use]
    pub fn upstream_bounds(&self) -> (String, String) {
        let after = self.start.and_time(NaiveTime::MIN).and_utc();
        let before = self
            .end
            .succ_opt()
            .unwrap_or(self.end)
            .and_time(NaiveTime::MIN)
            .and_utc();
        (format_timestamp(&after), format_timestamp(&before))
    }
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Groups of the current user as `{ "<id>": "<name>" }`
///
/// # Errors
///
/// Returns [`BridgeError::UpstreamData`] on call failure or shape mismatch
pub async fn list_groups(
    api: &dyn ExpenseApi,
    access_token: &AccessToken,
) -> Result<BTreeMap<String, String>, BridgeError> {
    let response: GroupsResponse = fetch(api, access_token, "get_groups", &[]).await?;
    Ok(response
        .groups
        .into_iter()
        .map(|group| (group.id.to_string(), group.name))
        .collect())
}

/// Members of one group
///
/// # Errors
///
/// Returns [`BridgeError::UpstreamData`] on call failure or shape mismatch
pub async fn group_members(
    api: &dyn ExpenseApi,
    access_token: &AccessToken,
    group_id: u64,
) -> Result<Vec<Member>, BridgeError> {
    let query = [("id".to_string(), group_id.to_string())];
    let response: GroupResponse = fetch(api, access_token, "get_group", &query).await?;
    Ok(response.group.members)
}

/// One row per (expense, user share) for expenses dated inside `range`
///
/// # Errors
///
/// Returns [`BridgeError::UpstreamData`] on call failure or shape mismatch
pub async fn group_expenses(
    api: &dyn ExpenseApi,
    access_token: &AccessToken,
    group_id: u64,
    range: &DateRange,
) -> Result<Vec<ShareRow>, BridgeError> {
    let (dated_after, dated_before) = range.upstream_bounds();
    let query = [
        ("group_id".to_string(), group_id.to_string()),
        ("dated_after".to_string(), dated_after),
        ("dated_before".to_string(), dated_before),
        ("limit".to_string(), "0".to_string()),
    ];
    let response: ExpensesResponse = fetch(api, access_token, "get_expenses", &query).await?;

    Ok(response
        .expenses
        .into_iter()
        .filter(|expense| range.contains(&expense.date))
        .flat_map(|expense| {
            let category = expense.category.name;
            let date = expense.date;
            expense.users.into_iter().map(move |share| ShareRow {
                category: category.clone(),
                user_id: share.user_id,
                owed_share: share.owed_share,
                date,
            })
        })
        .collect())
}

/// Expense categories with their subcategories
///
/// # Errors
///
/// Returns [`BridgeError::UpstreamData`] on call failure or shape mismatch
pub async fn list_categories(
    api: &dyn ExpenseApi,
    access_token: &AccessToken,
) -> Result<Vec<Category>, BridgeError> {
    let response: CategoriesResponse = fetch(api, access_token, "get_categories", &[]).await?;
    Ok(response.categories)
}
