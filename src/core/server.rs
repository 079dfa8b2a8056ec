/// MCP Server Implementation
///
/// This module contains the HTTP side of the server:
/// - JSON-RPC 2.0 request/response structures
/// - MCP method routing onto the dispatch gateway
/// - The stateless streamable-HTTP endpoint (`/mcp` and `/`)
/// - HTTP server setup with Actix Web
///
/// No session identifier is minted or expected; every POST is handled on its
/// own and may run concurrently with any other.

use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer, ResponseError, web,
    http::{Method, header},
    middleware::{Compress, DefaultHeaders, Logger},
};
use bytes::Bytes;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::dispatch::{Gateway, OperationKind};
use crate::core::error::{DispatchError, TransportError};
use crate::core::transport::{self, EVENT_STREAM, JSON, OriginPolicy};

/// Protocol revisions this server understands, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;
const SERVER_ERROR: i32 = -32000;

/// Application state shared across all worker threads.
///
/// Immutable after startup; contains server metadata used in MCP responses
/// and the transport policy applied to every request.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server name as reported in MCP initialize responses
    pub server_name: String,
    /// Server version string as reported in MCP initialize responses
    pub server_version: String,
    /// Origins allowed to reach the MCP endpoint
    pub origins: OriginPolicy,
    /// Answer with plain JSON even when the client accepts an event stream
    pub json_response: bool,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            server_name: settings.server_name.clone(),
            server_version: settings.server_version.clone(),
            origins: OriginPolicy::new(settings.allowed_origins.clone()),
            json_response: settings.json_response,
        }
    }
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// A missing id marks a notification, which gets no response.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    /// JSON-RPC version identifier, must be "2.0"
    jsonrpc: String,
    /// Request ID for correlating responses. None indicates a notification.
    #[serde(default)]
    id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    method: String,
    /// Method-specific parameters as JSON value
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Responses must include jsonrpc "2.0", the request id, and either a result
/// or an error. The error field is only present when an error occurred.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    /// JSON-RPC version identifier, always "2.0"
    jsonrpc: &'static str,
    /// Request ID from the original request
    id: Option<Value>,
    /// Response result, present when request succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error information, present when request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug)]
pub struct MCPError {
    /// JSON-RPC error code (e.g., -32601 for method not found)
    code: i32,
    /// Human-readable error message
    message: String,
    /// Optional additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl MCPResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(MCPError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Maps a propagated dispatch fault onto a JSON-RPC error. Caller mistakes
    /// keep their message; collaborator and internal faults only say
    /// "Internal error" (the detail is in the log).
    fn from_dispatch_error(id: Option<Value>, err: &DispatchError) -> Self {
        match err {
            DispatchError::UnknownTool(_)
            | DispatchError::Routing(_)
            | DispatchError::Validation(_) => Self::failure(id, INVALID_PARAMS, err.to_string()),
            DispatchError::Client(_) | DispatchError::Serialization(_) => {
                Self::failure(id, INTERNAL_ERROR, "Internal error")
            }
        }
    }
}

/// Health check endpoint handler.
///
/// Returns a simple JSON response indicating the server is running.
/// Used by load balancers and monitoring systems to verify server availability.
async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": state.server_name
    }))
}

/// Streamable HTTP endpoint, mounted on both `/mcp` and `/`.
///
/// Origin gate first: a rejected origin gets a bare 403. Everything else gets
/// CORS headers, including error responses.
async fn mcp_endpoint(
    req: HttpRequest,
    body: Bytes,
    state: web::Data<AppState>,
    gateway: web::Data<Gateway>,
) -> HttpResponse {
    let origin = match state.origins.authorize(req.headers()) {
        Ok(origin) => origin,
        Err(origin) => {
            tracing::warn!(origin = %origin, "Rejected request from forbidden origin");
            return transport::forbidden_origin();
        }
    };

    tracing::info!("[{}] {}", req.method(), req.uri());

    let mut response = if req.method() == Method::OPTIONS {
        HttpResponse::NoContent().finish()
    } else {
        match serve(&req, body, state.into_inner(), gateway.into_inner()).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "ERROR in handler");
                err.error_response()
            }
        }
    };
    transport::apply_cors(&mut response, &origin);
    response
}

async fn serve(
    req: &HttpRequest,
    body: Bytes,
    state: Arc<AppState>,
    gateway: Arc<Gateway>,
) -> Result<HttpResponse, TransportError> {
    let requested = req.headers().get(header::ACCEPT).and_then(|v| v.to_str().ok());
    let accept = transport::normalize_accept(requested);
    if requested != Some(accept.as_str()) {
        tracing::debug!(accept = %accept, "Modified Accept header");
    }

    if req.method() != Method::POST {
        // Stateless mode: there is no standalone server-to-client stream to open.
        return Ok(HttpResponse::MethodNotAllowed()
            .insert_header((header::ALLOW, "POST, OPTIONS"))
            .json(MCPResponse::failure(None, SERVER_ERROR, "Method not allowed.")));
    }

    handle_post(body, &accept, state, gateway).await
}

/// Decodes one JSON-RPC message or a batch, dispatches it and encodes the
/// replies as JSON or as a single SSE event.
async fn handle_post(
    body: Bytes,
    accept: &str,
    state: Arc<AppState>,
    gateway: Arc<Gateway>,
) -> Result<HttpResponse, TransportError> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Parse error");
            return Ok(HttpResponse::BadRequest()
                .json(MCPResponse::failure(None, PARSE_ERROR, format!("Parse error: {e}"))));
        }
    };

    let (messages, batch) = match payload {
        Value::Array(items) => (items, true),
        other => (vec![other], false),
    };
    if messages.is_empty() {
        return Ok(HttpResponse::BadRequest()
            .json(MCPResponse::failure(None, INVALID_REQUEST, "Invalid Request: empty batch")));
    }

    if !messages.iter().any(expects_reply) {
        dispatch_all(&state, &gateway, messages).await?;
        return Ok(HttpResponse::Accepted().finish());
    }

    if !state.json_response && transport::accepts(accept, EVENT_STREAM) {
        // Headers go out before dispatch runs; a failure past this point can
        // only be logged.
        let stream = futures_util::stream::once(async move {
            sse_event(&state, &gateway, messages, batch).await.inspect_err(|err| {
                tracing::error!(error = %err, "ERROR after response started, aborting stream");
            })
        });
        return Ok(HttpResponse::Ok()
            .content_type(EVENT_STREAM)
            .insert_header((header::CACHE_CONTROL, "no-cache"))
            // Disable nginx buffering for real-time streaming
            .insert_header(("x-accel-buffering", "no"))
            .streaming(stream));
    }

    let responses = dispatch_all(&state, &gateway, messages).await?;
    Ok(HttpResponse::Ok()
        .content_type(JSON)
        .body(encode(&responses, batch)?))
}

async fn sse_event(
    state: &AppState,
    gateway: &Gateway,
    messages: Vec<Value>,
    batch: bool,
) -> Result<Bytes, TransportError> {
    let responses = dispatch_all(state, gateway, messages).await?;
    let data = encode(&responses, batch)?;
    let mut frame = Vec::with_capacity(data.len() + 24);
    frame.extend_from_slice(b"event: message\ndata: ");
    frame.extend_from_slice(&data);
    frame.extend_from_slice(b"\n\n");
    Ok(Bytes::from(frame))
}

fn encode(responses: &[MCPResponse], batch: bool) -> Result<Vec<u8>, TransportError> {
    match responses {
        [single] if !batch => Ok(serde_json::to_vec(single)?),
        _ => Ok(serde_json::to_vec(responses)?),
    }
}

/// False for notifications and for client responses.
fn expects_reply(message: &Value) -> bool {
    let has_id = message.get("id").is_some_and(|id| !id.is_null());
    match message.get("method") {
        Some(_) => has_id,
        None => message.get("result").is_none() && message.get("error").is_none(),
    }
}

/// Runs every message of a POST concurrently, keeping reply order.
async fn dispatch_all(
    state: &AppState,
    gateway: &Gateway,
    messages: Vec<Value>,
) -> Result<Vec<MCPResponse>, TransportError> {
    let replies = join_all(messages.into_iter().map(|m| handle_message(state, gateway, m))).await;
    Ok(replies.into_iter().collect::<Result<Vec<_>, _>>()?.into_iter().flatten().collect())
}

/// Handles one decoded JSON-RPC message. Returns `None` for notifications
/// and for client responses, which need no reply.
async fn handle_message(
    state: &AppState,
    gateway: &Gateway,
    message: Value,
) -> Result<Option<MCPResponse>, TransportError> {
    if !expects_reply(&message) {
        tracing::debug!(method = ?message.get("method"), "Notification received");
        return Ok(None);
    }

    let raw_id = message.get("id").cloned();
    let req: MCPRequest = match serde_json::from_value(message) {
        Ok(req) => req,
        Err(e) => {
            return Ok(Some(MCPResponse::failure(
                raw_id,
                INVALID_REQUEST,
                format!("Invalid Request: {e}"),
            )));
        }
    };
    let id = req.id;

    if req.jsonrpc != "2.0" {
        return Ok(Some(MCPResponse::failure(
            id,
            INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        )));
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(state, id, req.params.as_ref()),
        "ping" => MCPResponse::success(id, json!({})),
        "tools/list" => handle_tools_list(gateway, id),
        "tools/call" => handle_tools_call(gateway, id, req.params).await?,
        "resources/list" => handle_resources_list(gateway, id, true),
        "resources/templates/list" => handle_resources_list(gateway, id, false),
        "resources/read" => handle_resources_read(gateway, id, req.params).await?,
        _ => MCPResponse::failure(
            id,
            METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };
    Ok(Some(response))
}

/// Handle MCP initialize method.
///
/// Echoes the client's protocol version when supported, otherwise offers the
/// newest one this server speaks.
fn handle_initialize(state: &AppState, id: Option<Value>, params: Option<&Value>) -> MCPResponse {
    let requested = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str);
    let version = requested
        .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]);

    MCPResponse::success(
        id,
        json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false }
            },
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version
            }
        }),
    )
}

/// Handle MCP tools/list method.
fn handle_tools_list(gateway: &Gateway, id: Option<Value>) -> MCPResponse {
    let tools: Vec<Value> = gateway.tools().iter().map(|tool| tool.describe()).collect();
    MCPResponse::success(id, json!({ "tools": tools }))
}

/// Handle MCP tools/call method.
///
/// Validation faults come back from the gateway as an `isError` result; any
/// other fault becomes a JSON-RPC error.
async fn handle_tools_call(
    gateway: &Gateway,
    id: Option<Value>,
    params: Option<Value>,
) -> Result<MCPResponse, TransportError> {
    let Some(name) = params.as_ref().and_then(|p| p.get("name")).and_then(Value::as_str) else {
        return Ok(MCPResponse::failure(id, INVALID_PARAMS, "Invalid params: missing tool name"));
    };
    let arguments = params
        .as_ref()
        .and_then(|p| p.get("arguments"))
        .cloned()
        .unwrap_or(Value::Null);

    Ok(match gateway.execute(OperationKind::Tool, name, arguments).await {
        Ok(result) => MCPResponse::success(id, result),
        Err(err) => MCPResponse::from_dispatch_error(id, &err),
    })
}

/// Handle MCP resources/list (static URIs) and resources/templates/list
/// (templated URIs).
fn handle_resources_list(gateway: &Gateway, id: Option<Value>, fixed: bool) -> MCPResponse {
    let entries: Vec<Value> = gateway
        .resources()
        .iter()
        .filter(|r| r.template.is_static() == fixed)
        .map(|r| r.describe())
        .collect();
    let key = if fixed { "resources" } else { "resourceTemplates" };
    MCPResponse::success(id, json!({ key: entries }))
}

/// Handle MCP resources/read method.
async fn handle_resources_read(
    gateway: &Gateway,
    id: Option<Value>,
    params: Option<Value>,
) -> Result<MCPResponse, TransportError> {
    let Some(uri) = params.as_ref().and_then(|p| p.get("uri")).and_then(Value::as_str) else {
        return Ok(MCPResponse::failure(id, INVALID_PARAMS, "Invalid params: missing uri"));
    };

    Ok(match gateway.execute(OperationKind::Resource, uri, Value::Null).await {
        Ok(result) => MCPResponse::success(id, result),
        Err(err) => MCPResponse::from_dispatch_error(id, &err),
    })
}

/// Route table, shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/mcp", web::route().to(mcp_endpoint))
        .route("/", web::route().to(mcp_endpoint));
}

/// Run the MCP server in HTTP mode.
///
/// # Configuration
/// The server is configured with:
/// - Worker threads: from settings (CPU count, max 16, by default)
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Disconnect timeout: 2 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(settings: Settings, gateway: Arc<Gateway>) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = settings.bind_addr();
    let app_state = web::Data::new(AppState::from_settings(&settings));
    let gateway = web::Data::from(gateway);

    tracing::info!(
        name = %settings.server_name,
        version = %settings.server_version,
        workers = settings.workers,
        origins = ?settings.allowed_origins,
        "MCP Server Starting (HTTP mode)"
    );
    tracing::info!("Server on http://{bind_addr} (Streamable HTTP: /mcp)");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(gateway.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            // Format: %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure)
    })
    .workers(settings.workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}
