//! Library crate root re-exporting server, client, and tool modules.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod cli;
pub mod client;
pub mod server;
pub mod tools;
