//! Realtime session client for the Gemini Live voice-agent backend.
//!
//! This crate owns one bidirectional audio/control stream: connection
//! lifecycle with bounded reconnection, outbound microphone framing,
//! inbound speech and tool-call handling, and a small observable state
//! machine (idle -> connecting -> open -> talking/thinking ->
//! closed/error). Audio devices and tool execution live behind injected
//! traits; there is no platform audio or UI code here.

pub mod audio;
pub mod backoff;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
mod session;
pub mod state;
pub mod tools;
pub mod transport;

pub use client::SessionClient;
pub use config::SessionConfig;
pub use context::ContextSnapshot;
pub use error::SessionError;
pub use event::{MessagePayload, SessionEvent};
pub use state::SessionState;
