/// Core Server Framework Module
///
/// This module contains the core server implementation including:
/// - config.rs: Settings loaded from the environment
/// - error.rs: Error types for every layer
/// - validation.rs: Declarative argument schemas and the validator
/// - dispatch.rs: Gateway between the protocol layer and tools/resources
/// - transport.rs: Origin gate, CORS and Accept handling
/// - server.rs: JSON-RPC endpoint and HTTP server setup

pub mod config;
pub mod dispatch;
pub mod error;
pub mod server;
pub mod transport;
pub mod validation;
