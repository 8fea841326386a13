use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ===== Rows =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub last_login: Option<DateTime<Utc>>,
    /// Topics not yet discussed.
    pub topic_count: i64,
    pub discussed_count: i64,
    #[sqlx(skip)]
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: i32,
    pub person_id: i32,
    pub person_name: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub discussed: bool,
    pub vote_count: i64,
    pub voted_by_current_user: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Suggestion {
    pub id: i32,
    pub suggested_by: i32,
    pub suggested_by_name: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub claimed_by: Option<i32>,
    pub claimed_by_name: Option<String>,
    pub vote_count: i64,
    pub voted_by_current_user: bool,
}

// ===== Requests =====
//
// Every field is optional so that a missing value is reported by the handler
// with a readable message instead of a serde rejection.

#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    pub person_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTopicRequest {
    pub topic_id: Option<i32>,
    pub person_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTopicRequest {
    pub topic_id: Option<i32>,
    pub person_id: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub voter_id: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DiscussedRequest {
    pub discussed: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSuggestionRequest {
    pub suggested_by: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub claimer_id: Option<i32>,
}

// ===== Responses =====

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub new_topics: Vec<Topic>,
    pub last_login: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub voted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub claimed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetupResponse {
    pub success: bool,
    pub message: String,
    pub seeded: u64,
}
