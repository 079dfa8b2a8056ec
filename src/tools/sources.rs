/// `jules_list_sources` tool.

use serde_json::Value;

use super::{CallToolResult, ToolDefinition};
use crate::client::{JulesApi, ListSourcesParams};
use crate::core::error::DispatchError;

pub(super) async fn list_sources(
    tool: &ToolDefinition,
    args: &Value,
    client: &dyn JulesApi,
) -> Result<CallToolResult, DispatchError> {
    let params: ListSourcesParams = tool.parse(args)?;
    let data = client.list_sources(params).await?;
    CallToolResult::pretty_json(&data)
}
