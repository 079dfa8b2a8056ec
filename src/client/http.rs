/// reqwest-backed Jules API client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use std::time::Duration;

use super::{
    ApprovePlanParams, CreateSessionParams, JulesApi, ListActivitiesParams, ListSessionsParams,
    ListSourcesParams, SendMessageParams, session_name,
};
use crate::core::error::{ClientError, ConfigError};

pub const DEFAULT_BASE_URL: &str = "https://jules.googleapis.com/v1alpha";

const API_KEY_HEADER: &str = "X-Goog-Api-Key";

/// Immutable handle shared by every request for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct JulesClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl JulesClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jules-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn get(&self, path: &str, query: &[(&'static str, String)]) -> RequestBuilder {
        self.http.get(self.url(path)).query(query)
    }

    fn post(&self, path: &str, body: &Value) -> RequestBuilder {
        self.http.post(self.url(path)).json(body)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.header(API_KEY_HEADER, &self.api_key).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Jules API error response");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(json!({}));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl JulesApi for JulesClient {
    async fn list_sources(&self, params: ListSourcesParams) -> Result<Value, ClientError> {
        self.send(self.get("sources", &params.query())).await
    }

    async fn list_sessions(&self, params: ListSessionsParams) -> Result<Value, ClientError> {
        self.send(self.get("sessions", &params.query())).await
    }

    async fn create_session(&self, params: CreateSessionParams) -> Result<Value, ClientError> {
        let mut body = json!({
            "prompt": params.prompt,
            "sourceContext": {
                "source": params.source,
                "githubRepoContext": { "startingBranch": params.starting_branch }
            },
            "requirePlanApproval": params.require_plan_approval,
        });
        if let Some(title) = params.title {
            body["title"] = json!(title);
        }
        self.send(self.post("sessions", &body)).await
    }

    async fn approve_plan(&self, params: ApprovePlanParams) -> Result<Value, ClientError> {
        let path = format!("{}:approvePlan", session_name(&params.session_id));
        self.send(self.post(&path, &json!({}))).await
    }

    async fn send_message(&self, params: SendMessageParams) -> Result<Value, ClientError> {
        let path = format!("{}:sendMessage", session_name(&params.session_id));
        self.send(self.post(&path, &json!({ "prompt": params.prompt }))).await
    }

    async fn list_activities(&self, params: ListActivitiesParams) -> Result<Value, ClientError> {
        let path = format!("{}/activities", session_name(&params.session_id));
        self.send(self.get(&path, &params.page.query())).await
    }
}
