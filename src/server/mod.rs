//! Server side: configuration, session management, HTTP surface, and runtime.
pub mod config;
pub mod http;
pub mod runtime;
pub mod session;
