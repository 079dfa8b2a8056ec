/// Jules API Collaborator
///
/// The dispatch core only depends on the `JulesApi` trait. `JulesClient` in
/// `http.rs` is the production implementation; tests substitute an in-memory
/// fake. Parameter structs deserialize from the normalized (camelCase) output
/// of schema validation.

mod http;

pub use http::{DEFAULT_BASE_URL, JulesClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::ClientError;

/// Shared pagination parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl PageParams {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(size) = self.page_size {
            query.push(("pageSize", size.to_string()));
        }
        if let Some(token) = &self.page_token {
            query.push(("pageToken", token.clone()));
        }
        query
    }
}

pub type ListSourcesParams = PageParams;
pub type ListSessionsParams = PageParams;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionParams {
    pub prompt: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub starting_branch: String,
    pub require_plan_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePlanParams {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageParams {
    pub session_id: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActivitiesParams {
    pub session_id: String,
    #[serde(flatten)]
    pub page: PageParams,
}

/// Remote operations the tools and resources forward to.
///
/// Every method returns the API's JSON payload untouched; the core only
/// serializes it back to the caller.
#[async_trait]
pub trait JulesApi: Send + Sync {
    async fn list_sources(&self, params: ListSourcesParams) -> Result<Value, ClientError>;

    async fn list_sessions(&self, params: ListSessionsParams) -> Result<Value, ClientError>;

    async fn create_session(&self, params: CreateSessionParams) -> Result<Value, ClientError>;

    async fn approve_plan(&self, params: ApprovePlanParams) -> Result<Value, ClientError>;

    async fn send_message(&self, params: SendMessageParams) -> Result<Value, ClientError>;

    async fn list_activities(&self, params: ListActivitiesParams) -> Result<Value, ClientError>;
}

/// Resource name of a session: accepts both `sessions/{id}` and a bare id.
pub fn session_name(session_id: &str) -> String {
    if session_id.starts_with("sessions/") {
        session_id.to_string()
    } else {
        format!("sessions/{session_id}")
    }
}
