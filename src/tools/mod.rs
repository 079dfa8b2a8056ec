/// Tools Module
///
/// Every Jules operation exposed as an MCP tool is a `ToolKind` variant. The
/// variant supplies the tool's name, description and rule-set; the handler
/// lives in the per-area modules (`sources`, `sessions`, `activities`).
/// `ToolRegistry` pairs each kind with its built schema at startup.

mod activities;
mod sessions;
mod sources;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

use crate::client::JulesApi;
use crate::core::error::{ConfigError, DispatchError};
use crate::core::validation::OperationSchema;
use crate::schemas;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ListSources,
    CreateSession,
    ListSessions,
    ApprovePlan,
    SendMessage,
    ListActivities,
}

impl ToolKind {
    /// Registration order, which is also the `tools/list` order.
    pub const ALL: [ToolKind; 6] = [
        ToolKind::ListSources,
        ToolKind::CreateSession,
        ToolKind::ListSessions,
        ToolKind::ApprovePlan,
        ToolKind::SendMessage,
        ToolKind::ListActivities,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ListSources => "jules_list_sources",
            ToolKind::CreateSession => "jules_create_session",
            ToolKind::ListSessions => "jules_list_sessions",
            ToolKind::ApprovePlan => "jules_approve_plan",
            ToolKind::SendMessage => "jules_send_message",
            ToolKind::ListActivities => "jules_list_activities",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::ListSources => "List Jules sources - GET /v1alpha/sources",
            ToolKind::CreateSession => "Create Jules session - POST /v1alpha/sessions",
            ToolKind::ListSessions => "List Jules sessions - GET /v1alpha/sessions",
            ToolKind::ApprovePlan => {
                "Approve latest plan - POST /v1alpha/sessions/{id}:approvePlan"
            }
            ToolKind::SendMessage => {
                "Send a message to the agent - POST /v1alpha/sessions/{id}:sendMessage"
            }
            ToolKind::ListActivities => {
                "List session activities - GET /v1alpha/sessions/{id}/activities"
            }
        }
    }

    pub fn schema(self) -> Result<OperationSchema, ConfigError> {
        match self {
            ToolKind::ListSources => schemas::list_sources(),
            ToolKind::CreateSession => schemas::create_session(),
            ToolKind::ListSessions => schemas::list_sessions(),
            ToolKind::ApprovePlan => schemas::approve_plan(),
            ToolKind::SendMessage => schemas::send_message(),
            ToolKind::ListActivities => schemas::list_activities(),
        }
    }
}

/// MCP `CallToolResult`: a list of text blocks plus the error flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<TextContent>,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent { kind: "text", text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { is_error: true, ..Self::text(text) }
    }

    /// API payload rendered with two-space indentation.
    pub fn pretty_json(data: &Value) -> Result<Self, DispatchError> {
        Ok(Self::text(serde_json::to_string_pretty(data)?))
    }

    /// API payload rendered on a single line.
    pub fn compact_json(data: &Value) -> Result<Self, DispatchError> {
        Ok(Self::text(serde_json::to_string(data)?))
    }
}

/// A registered tool: its kind and the schema its arguments are checked against.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub kind: ToolKind,
    pub schema: OperationSchema,
}

impl ToolDefinition {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Validates `args` and forwards them to the matching Jules API call.
    pub async fn invoke(
        &self,
        args: &Value,
        client: &dyn JulesApi,
    ) -> Result<CallToolResult, DispatchError> {
        match self.kind {
            ToolKind::ListSources => sources::list_sources(self, args, client).await,
            ToolKind::CreateSession => sessions::create_session(self, args, client).await,
            ToolKind::ListSessions => sessions::list_sessions(self, args, client).await,
            ToolKind::ApprovePlan => sessions::approve_plan(self, args, client).await,
            ToolKind::SendMessage => sessions::send_message(self, args, client).await,
            ToolKind::ListActivities => activities::list_activities(self, args, client).await,
        }
    }

    /// Schema validation followed by conversion into the client's typed params.
    fn parse<T: DeserializeOwned>(&self, args: &Value) -> Result<T, DispatchError> {
        let normalized = self.schema.validate(args)?;
        Ok(serde_json::from_value(Value::Object(normalized))?)
    }

    /// `tools/list` entry.
    pub fn describe(&self) -> Value {
        serde_json::json!({
            "name": self.kind.name(),
            "description": self.kind.description(),
            "inputSchema": self.schema.json_schema(),
        })
    }
}

/// Registry of available MCP tools, in registration order.
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_kinds(&ToolKind::ALL)
    }

    /// Builds every schema and rejects duplicate tool names.
    pub fn from_kinds(kinds: &[ToolKind]) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            if !seen.insert(kind.name()) {
                return Err(ConfigError::DuplicateTool(kind.name().to_string()));
            }
            tools.push(ToolDefinition { kind, schema: kind.schema()? });
        }
        Ok(Self { tools })
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}
