//! Upstream response shapes and the JSON the SPA receives
//!
//! Upstream structs only name the fields the bridge uses; unknown fields are
//! ignored, but a named field that is missing or mistyped fails the decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Upstream: get_groups / get_group
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GroupsResponse {
    pub groups: Vec<GroupSummary>,
}

#[derive(Debug, Deserialize)]
pub struct GroupSummary {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupResponse {
    pub group: GroupDetail,
}

#[derive(Debug, Deserialize)]
pub struct GroupDetail {
    pub id: u64,
    #[serde(default)]
    pub members: Vec<Member>,
}

/// Group member as both received and returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub first_name: String,
}

// =============================================================================
// Upstream: get_expenses
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ExpensesResponse {
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Deserialize)]
pub struct Expense {
    pub id: u64,
    pub date: DateTime<Utc>,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub users: Vec<ExpenseShare>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseCategory {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseShare {
    pub user_id: u64,
    pub owed_share: String,
}

/// One user's share of one expense, flattened for the SPA
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareRow {
    pub category: String,
    pub user_id: u64,
    pub owed_share: String,
    pub date: DateTime<Utc>,
}

// =============================================================================
// Upstream: get_categories
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: u64,
    pub name: String,
}
