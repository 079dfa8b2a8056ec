/// Resources Module
///
/// Read-only, URI-addressable views over the Jules API. Each resource is a
/// `ResourceKind` variant bound to a parsed `UriTemplate`; the registry is
/// built once at startup and resolves concrete URIs by template match.

pub mod template;

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashSet;

use crate::client::{JulesApi, ListActivitiesParams, PageParams, session_name};
use crate::core::error::{ConfigError, DispatchError, RouteError};
use crate::schemas::SESSION_SEGMENT_PATTERN;
use template::UriTemplate;

pub const MIME_JSON: &str = "application/json";

/// Page size requested when listing a session's activities as a resource.
pub const ACTIVITIES_PAGE_SIZE: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    SessionActivities,
    Sources,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::SessionActivities, ResourceKind::Sources];

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::SessionActivities => "session_activities",
            ResourceKind::Sources => "sources",
        }
    }

    pub fn uri_template(self) -> &'static str {
        match self {
            ResourceKind::SessionActivities => "jules://sessions/{id}/activities",
            ResourceKind::Sources => "jules://sources",
        }
    }

    /// Character class each captured placeholder must satisfy.
    pub fn param_pattern(self) -> Option<(&'static str, &'static str)> {
        match self {
            ResourceKind::SessionActivities => Some(("id", SESSION_SEGMENT_PATTERN)),
            ResourceKind::Sources => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ResourceKind::SessionActivities => "Most recent activities of a Jules session",
            ResourceKind::Sources => "All sources connected to Jules",
        }
    }
}

/// One entry of a `resources/read` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
}

impl ReadResourceResult {
    fn json(uri: &str, data: &Value) -> Result<Self, DispatchError> {
        Ok(Self {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: MIME_JSON.to_string(),
                text: serde_json::to_string_pretty(data)?,
            }],
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    pub kind: ResourceKind,
    pub template: UriTemplate,
    param_check: Option<(&'static str, Regex)>,
}

impl ResourceDefinition {
    /// Reads the resource at `uri`. Fails with a routing error if `uri` does
    /// not fit this resource's template.
    pub async fn read(
        &self,
        uri: &str,
        client: &dyn JulesApi,
    ) -> Result<ReadResourceResult, DispatchError> {
        let params = self
            .template
            .match_uri(uri)
            .ok_or_else(|| RouteError::InvalidFormat { uri: uri.to_string() })?;
        if let Some((name, re)) = &self.param_check {
            if !params.get(*name).is_some_and(|value| re.is_match(value)) {
                return Err(RouteError::InvalidFormat { uri: uri.to_string() }.into());
            }
        }

        let data = match self.kind {
            ResourceKind::SessionActivities => {
                let id = params
                    .get("id")
                    .ok_or_else(|| RouteError::InvalidFormat { uri: uri.to_string() })?;
                client
                    .list_activities(ListActivitiesParams {
                        session_id: session_name(id),
                        page: PageParams {
                            page_size: Some(ACTIVITIES_PAGE_SIZE),
                            page_token: None,
                        },
                    })
                    .await?
            }
            ResourceKind::Sources => client.list_sources(PageParams::default()).await?,
        };

        ReadResourceResult::json(uri, &data)
    }

    /// Listing entry for `resources/list` (static URIs) or
    /// `resources/templates/list` (templated URIs).
    pub fn describe(&self) -> Value {
        let mut entry = json!({
            "name": self.kind.name(),
            "description": self.kind.description(),
            "mimeType": MIME_JSON,
        });
        let key = if self.template.is_static() { "uri" } else { "uriTemplate" };
        entry[key] = json!(self.template.as_str());
        entry
    }
}

pub struct ResourceRegistry {
    resources: Vec<ResourceDefinition>,
}

impl ResourceRegistry {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_kinds(&ResourceKind::ALL)
    }

    /// Builds the registry, rejecting duplicate names or templates.
    pub fn from_kinds(kinds: &[ResourceKind]) -> Result<Self, ConfigError> {
        let mut names = HashSet::new();
        let mut templates = HashSet::new();
        let mut resources = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            if !names.insert(kind.name()) || !templates.insert(kind.uri_template()) {
                return Err(ConfigError::DuplicateResource(kind.name().to_string()));
            }
            let param_check = match kind.param_pattern() {
                Some((name, pattern)) => {
                    let re = Regex::new(pattern).map_err(|e| ConfigError::Template {
                        template: kind.uri_template().to_string(),
                        reason: e.to_string(),
                    })?;
                    Some((name, re))
                }
                None => None,
            };
            resources.push(ResourceDefinition {
                kind,
                template: UriTemplate::parse(kind.uri_template())?,
                param_check,
            });
        }
        Ok(Self { resources })
    }

    /// Finds the resource whose template matches `uri`.
    pub fn resolve(&self, uri: &str) -> Result<&ResourceDefinition, RouteError> {
        self.resources
            .iter()
            .find(|r| r.template.match_uri(uri).is_some())
            .ok_or_else(|| RouteError::InvalidFormat { uri: uri.to_string() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }
}
