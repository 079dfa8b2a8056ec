/// Configuration
///
/// Settings are read once at startup from environment variables (after an
/// optional `.env` file has been loaded by `main`). `from_lookup` takes the
/// variable source as a closure so tests never touch the process environment.
///
/// Environment Variables:
/// - JULES_API_KEY: Jules API credential (required)
/// - JULES_API_BASE_URL: API root (default: https://jules.googleapis.com/v1alpha)
/// - JULES_HTTP_TIMEOUT_SECS: Timeout for Jules API calls (default: 60)
/// - ALLOWED_ORIGINS: Comma-separated Origin allow-list (default: "null,http://localhost")
/// - HOST: Bind address (default: "127.0.0.1")
/// - PORT: Port number (default: 3323)
/// - WORKER_THREADS: HTTP worker count (default: CPU count, max 16)
/// - MCP_JSON_RESPONSE: Answer POSTs with plain JSON instead of SSE (default: true)
/// - SERVER_NAME: Name reported in initialize (default: "jules-mcp")
/// - SERVER_VERSION: Version reported in initialize (default: crate version)

use std::time::Duration;

use crate::client::DEFAULT_BASE_URL;
use crate::core::error::ConfigError;

pub const DEFAULT_ALLOWED_ORIGINS: &str = "null,http://localhost";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3323;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub json_response: bool,
    pub server_name: String,
    pub server_version: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var("JULES_API_KEY").ok_or(ConfigError::MissingVar("JULES_API_KEY"))?;

        let api_base_url = var("JULES_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let api_timeout = match var("JULES_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("JULES_HTTP_TIMEOUT_SECS", &raw)?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let allowed_origins = parse_origins(
            &var("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
        );

        let port = match var("PORT") {
            Some(raw) => parse_number("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        // Defaults to CPU count but capped at 16 to avoid excessive context switching
        let workers = match var("WORKER_THREADS") {
            Some(raw) => parse_number::<usize>("WORKER_THREADS", &raw)?.max(1),
            None => num_cpus::get().clamp(1, 16),
        };

        let json_response = match var("MCP_JSON_RESPONSE") {
            Some(raw) => parse_bool("MCP_JSON_RESPONSE", &raw)?,
            None => true,
        };

        Ok(Self {
            api_key,
            api_base_url,
            api_timeout,
            allowed_origins,
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            workers,
            json_response,
            server_name: var("SERVER_NAME").unwrap_or_else(|| "jules-mcp".to_string()),
            server_version: var("SERVER_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidVar {
        name,
        reason: format!("'{raw}': {e}"),
    })
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            name,
            reason: format!("'{raw}' is not a boolean"),
        }),
    }
}
