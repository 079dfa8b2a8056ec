/// Jules MCP Server Entry Point
///
/// Loads `.env`, sets up logging, reads settings from the environment (see
/// `core::config`), wires the Jules API client into the dispatch gateway and
/// serves MCP over streamable HTTP.
///
/// Logs go to stderr. `RUST_LOG` controls the filter (default: "info") and
/// `LOG_FORMAT=json` switches to JSON lines.

mod client;
mod core;
mod resources;
mod schemas;
mod tools;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::client::{JulesApi, JulesClient};
use crate::core::config::Settings;
use crate::core::dispatch::Gateway;
use crate::core::server;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let client: Arc<dyn JulesApi> =
        match JulesClient::new(&settings.api_key, &settings.api_base_url, settings.api_timeout) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                tracing::error!("Failed to build Jules API client: {e}");
                std::process::exit(1);
            }
        };

    let gateway = match Gateway::new(client) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            tracing::error!("Failed to register tools and resources: {e}");
            std::process::exit(1);
        }
    };

    server::run_server_http(settings, gateway).await
}
