/// Dispatch Gateway
///
/// Single entry point between the protocol layer and the tool/resource
/// handlers. Validation faults are turned into an `isError` tool result here;
/// every other failure is logged and handed back to the caller.

use serde_json::Value;
use std::sync::Arc;

use crate::client::JulesApi;
use crate::core::error::{ConfigError, DispatchError, ValidationError};
use crate::resources::{ReadResourceResult, ResourceRegistry};
use crate::tools::{CallToolResult, ToolRegistry};

/// Which registry an identifier is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Tool,
    Resource,
}

pub struct Gateway {
    tools: ToolRegistry,
    resources: ResourceRegistry,
    client: Arc<dyn JulesApi>,
}

impl Gateway {
    /// Builds both registries. Any error here is a configuration fault and
    /// the server must not start.
    pub fn new(client: Arc<dyn JulesApi>) -> Result<Self, ConfigError> {
        Ok(Self::with_registries(ToolRegistry::new()?, ResourceRegistry::new()?, client))
    }

    pub fn with_registries(
        tools: ToolRegistry,
        resources: ResourceRegistry,
        client: Arc<dyn JulesApi>,
    ) -> Self {
        tracing::info!("Registering {} tools...", tools.len());
        for tool in tools.iter() {
            tracing::info!("  - {}", tool.name());
        }
        tracing::info!("Registering {} resources...", resources.len());
        for resource in resources.iter() {
            tracing::info!("  - {} ({})", resource.kind.name(), resource.template.as_str());
        }
        Self { tools, resources, client }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Resolves `identifier` (a tool name or a resource URI) and runs it,
    /// returning the protocol result as JSON.
    pub async fn execute(
        &self,
        kind: OperationKind,
        identifier: &str,
        params: Value,
    ) -> Result<Value, DispatchError> {
        match kind {
            OperationKind::Tool => {
                Ok(serde_json::to_value(self.call_tool(identifier, &params).await?)?)
            }
            OperationKind::Resource => {
                Ok(serde_json::to_value(self.read_resource(identifier).await?)?)
            }
        }
    }

    pub async fn call_tool(
        &self,
        name: &str,
        args: &Value,
    ) -> Result<CallToolResult, DispatchError> {
        let Some(tool) = self.tools.get(name) else {
            tracing::error!(tool = name, "ERROR: unknown tool");
            return Err(DispatchError::UnknownTool(name.to_string()));
        };

        tracing::info!(tool = name, "Executing tool");
        match tool.invoke(args, self.client.as_ref()).await {
            Ok(result) => {
                tracing::info!(tool = name, "Tool completed successfully");
                Ok(result)
            }
            Err(DispatchError::Validation(err)) => {
                for issue in &err.issues {
                    tracing::warn!(
                        tool = name,
                        field = %issue.path,
                        "VALIDATION ERROR: {}",
                        issue.message
                    );
                }
                Ok(CallToolResult::error(format_validation_error(name, &err)))
            }
            Err(err) => {
                tracing::error!(tool = name, error = %err, "ERROR in tool");
                Err(err)
            }
        }
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, DispatchError> {
        let resource = self.resources.resolve(uri).inspect_err(|err| {
            tracing::error!(uri, error = %err, "ERROR: no resource matches");
        })?;

        let name = resource.kind.name();
        tracing::info!(resource = name, uri, "Fetching resource");
        match resource.read(uri, self.client.as_ref()).await {
            Ok(result) => {
                tracing::info!(resource = name, "Resource fetched successfully");
                Ok(result)
            }
            Err(err) => {
                tracing::error!(resource = name, error = %err, "ERROR in resource");
                Err(err)
            }
        }
    }
}

/// Human-readable validation report: banner, one bullet per violated field,
/// remediation hint.
pub fn format_validation_error(tool: &str, err: &ValidationError) -> String {
    let mut lines = vec![format!("❌ Validation Error in {tool}:"), String::new()];
    lines.extend(err.issues.iter().map(|issue| {
        if issue.path.is_empty() {
            format!("  - {}", issue.message)
        } else {
            format!("  - {}: {}", issue.path, issue.message)
        }
    }));
    lines.push(String::new());
    lines.push("Please check your input parameters and try again.".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeJules;
    use crate::core::error::{ClientError, RouteError};
    use crate::core::validation::FieldIssue;
    use serde_json::json;

    fn gateway(client: FakeJules) -> (Gateway, Arc<FakeJules>) {
        let client = Arc::new(client);
        (Gateway::new(client.clone()).unwrap(), client)
    }

    #[test]
    fn formats_one_bullet_per_issue() {
        let err = ValidationError {
            issues: vec![
                FieldIssue { path: "prompt".into(), message: "Prompt cannot be empty".into() },
                FieldIssue {
                    path: String::new(),
                    message: "Expected object, received array".into(),
                },
            ],
        };
        assert_eq!(
            format_validation_error("jules_create_session", &err),
            "❌ Validation Error in jules_create_session:\n\
             \n  - prompt: Prompt cannot be empty\
             \n  - Expected object, received array\
             \n\nPlease check your input parameters and try again."
        );
    }

    #[actix_web::test]
    async fn validation_faults_become_error_results() {
        let (gateway, client) = gateway(FakeJules::default());
        let result = gateway
            .call_tool(
                "jules_create_session",
                &json!({"prompt": "", "source": "bad", "title": "t".repeat(201)}),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        let text = &result.content[0].text;
        assert!(text.starts_with("❌ Validation Error in jules_create_session:"));
        assert!(text.contains("  - prompt: Prompt cannot be empty"));
        assert!(text.contains(
            "  - source: Invalid source format. Expected: sources/github/owner/repo"
        ));
        assert!(text.contains("  - title: Title is too long (max 200 characters)"));
        assert!(client.calls().is_empty());
    }

    #[actix_web::test]
    async fn client_faults_propagate() {
        let (gateway, _) = gateway(FakeJules::failing());
        let err = gateway
            .call_tool("jules_list_sessions", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Client(ClientError::Api { .. })));
    }

    #[actix_web::test]
    async fn unknown_tool_is_a_propagated_fault() {
        let (gateway, _) = gateway(FakeJules::default());
        let err = gateway.call_tool("jules_delete_everything", &json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Tool jules_delete_everything not found");
    }

    #[actix_web::test]
    async fn execute_resolves_tools_and_resources() {
        let (gateway, client) = gateway(FakeJules::replying(json!({"sources": []})));

        let tool = gateway
            .execute(OperationKind::Tool, "jules_list_sources", json!({"pageSize": 10}))
            .await
            .unwrap();
        assert_eq!(tool["isError"], false);
        assert_eq!(tool["content"][0]["type"], "text");

        let resource = gateway
            .execute(OperationKind::Resource, "jules://sources", Value::Null)
            .await
            .unwrap();
        assert_eq!(resource["contents"][0]["uri"], "jules://sources");
        assert_eq!(resource["contents"][0]["mimeType"], "application/json");

        assert_eq!(client.calls().len(), 2);
    }

    #[actix_web::test]
    async fn unmatched_resource_uri_is_a_routing_fault() {
        let (gateway, client) = gateway(FakeJules::default());
        let err = gateway.read_resource("jules://sessions/abc123").await.unwrap_err();
        assert!(matches!(err, DispatchError::Routing(RouteError::InvalidFormat { .. })));
        assert!(client.calls().is_empty());
    }
}
