/// Transport Session Helpers
///
/// Header-level rules applied to every request on the MCP endpoint before it
/// reaches the JSON-RPC layer: the origin allow-list, CORS response headers,
/// and Accept normalization.

use actix_web::HttpResponse;
use actix_web::http::header::{self, HeaderMap};

pub const JSON: &str = "application/json";
pub const EVENT_STREAM: &str = "text/event-stream";

/// Origin value used when the request carries no `Origin` header.
pub const NULL_ORIGIN: &str = "null";

/// Allow-listed origins, immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    /// Returns the request's origin if it is allowed. Only an absent header
    /// is treated as `"null"`; a header that is not valid UTF-8 is rejected.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<String, String> {
        let origin = match headers.get(header::ORIGIN) {
            None => NULL_ORIGIN.to_string(),
            Some(value) => match value.to_str() {
                Ok(origin) => origin.to_string(),
                Err(_) => return Err(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            },
        };
        if self.allowed.iter().any(|allowed| *allowed == origin) {
            Ok(origin)
        } else {
            Err(origin)
        }
    }
}

/// Plain 403 for a rejected origin. Deliberately carries no CORS headers.
pub fn forbidden_origin() -> HttpResponse {
    HttpResponse::Forbidden()
        .content_type("text/plain; charset=utf-8")
        .body("Forbidden Origin")
}

/// Adds the CORS headers granted to an allowed origin.
pub fn apply_cors(response: &mut HttpResponse, origin: &str) {
    let headers = response.headers_mut();
    let pairs = [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, origin),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Accept"),
        (header::VARY, "Origin"),
    ];
    for (name, value) in pairs {
        if let Ok(value) = header::HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    }
}

/// Effective Accept value: always lists both the JSON and the event-stream
/// encodings, appending whichever is missing to the client's own preference.
pub fn normalize_accept(accept: Option<&str>) -> String {
    let accept = accept.map(str::trim).filter(|a| !a.is_empty());
    let Some(accept) = accept else {
        return format!("{JSON},{EVENT_STREAM}");
    };

    let mut normalized = accept.to_string();
    for media in [JSON, EVENT_STREAM] {
        if !accepts(&normalized, media) {
            normalized.push(',');
            normalized.push_str(media);
        }
    }
    normalized
}

/// True when a comma-separated Accept value lists `media` (parameters such as
/// `;q=0.9` are ignored).
pub fn accepts(accept: &str, media: &str) -> bool {
    accept.split(',').any(|part| {
        part.split(';')
            .next()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case(media))
    })
}
