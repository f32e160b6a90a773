//! Admin command channel: protocol, TCP listener and client.

/// Client used by the admin console and tests.
pub mod client;
/// Command parsing and response rendering.
pub mod protocol;
/// Single-worker listener and command execution.
pub mod server;

pub use client::AdminClient;
pub use protocol::{Command, Response};
pub use server::{AdminEvent, AdminHandle, AdminServer, AdminService, ServerState};
