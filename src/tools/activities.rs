/// `jules_list_activities` tool.

use serde_json::Value;

use super::{CallToolResult, ToolDefinition};
use crate::client::{JulesApi, ListActivitiesParams};
use crate::core::error::DispatchError;

pub(super) async fn list_activities(
    tool: &ToolDefinition,
    args: &Value,
    client: &dyn JulesApi,
) -> Result<CallToolResult, DispatchError> {
    let params: ListActivitiesParams = tool.parse(args)?;
    let data = client.list_activities(params).await?;
    CallToolResult::pretty_json(&data)
}
