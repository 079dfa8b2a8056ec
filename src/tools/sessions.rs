/// Session tools: create, list, approve plan, send message.
///
/// Create and list echo the API payload pretty-printed; the two session
/// actions return it on one line.

use serde_json::Value;

use super::{CallToolResult, ToolDefinition};
use crate::client::{
    ApprovePlanParams, CreateSessionParams, JulesApi, ListSessionsParams, SendMessageParams,
};
use crate::core::error::DispatchError;

pub(super) async fn create_session(
    tool: &ToolDefinition,
    args: &Value,
    client: &dyn JulesApi,
) -> Result<CallToolResult, DispatchError> {
    let params: CreateSessionParams = tool.parse(args)?;
    let data = client.create_session(params).await?;
    CallToolResult::pretty_json(&data)
}

pub(super) async fn list_sessions(
    tool: &ToolDefinition,
    args: &Value,
    client: &dyn JulesApi,
) -> Result<CallToolResult, DispatchError> {
    let params: ListSessionsParams = tool.parse(args)?;
    let data = client.list_sessions(params).await?;
    CallToolResult::pretty_json(&data)
}

pub(super) async fn approve_plan(
    tool: &ToolDefinition,
    args: &Value,
    client: &dyn JulesApi,
) -> Result<CallToolResult, DispatchError> {
    let params: ApprovePlanParams = tool.parse(args)?;
    let data = client.approve_plan(params).await?;
    CallToolResult::compact_json(&data)
}

pub(super) async fn send_message(
    tool: &ToolDefinition,
    args: &Value,
    client: &dyn JulesApi,
) -> Result<CallToolResult, DispatchError> {
    let params: SendMessageParams = tool.parse(args)?;
    let data = client.send_message(params).await?;
    CallToolResult::compact_json(&data)
}
