//! Shared library modules providing error types, JSON-RPC helpers, and telemetry initialization.

pub mod errors;
pub mod jsonrpc;
pub mod telemetry;
