/// Error Types
///
/// One enum per layer of the request pipeline. Validation faults are the only
/// ones recovered locally (see `core::dispatch`); everything else propagates
/// to the protocol layer or, at startup, stops the process.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

pub use crate::core::validation::ValidationError;

/// Startup configuration faults. The server must not begin serving if any of
/// these is raised.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing {0} env var")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },

    #[error("Invalid schema for field '{field}': {reason}")]
    Schema { field: String, reason: String },

    #[error("Invalid URI template '{template}': {reason}")]
    Template { template: String, reason: String },

    #[error("Tool '{0}' registered more than once")]
    DuplicateTool(String),

    #[error("Resource '{0}' registered more than once")]
    DuplicateResource(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// A concrete URI that does not fit any registered resource template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Invalid URI format: {uri}")]
    InvalidFormat { uri: String },
}

/// Failures reported by the remote Jules API collaborator.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request to Jules API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Jules API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid JSON from Jules API: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Everything a tool or resource handler can fail with.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Tool {0} not found")]
    UnknownTool(String),

    #[error(transparent)]
    Routing(#[from] RouteError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Faults raised while turning dispatch output into an HTTP response.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ResponseError for TransportError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Internal server error",
            "message": self.to_string(),
        }))
    }
}
