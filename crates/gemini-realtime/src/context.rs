//! Connect-time snapshot of app state used to ground the agent.

use std::sync::Arc;

/// Everything the system-instruction generator may draw on.
///
/// The caller captures this once when `connect()` is invoked; it is
/// never refreshed mid-session, so the agent's view of events, friends
/// and local time is frozen for the session's lifetime.
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    pub user_name: String,
    pub assistant_name: String,
    pub language: String,
    pub events_summary: String,
    pub friends_summary: String,
    pub local_time: String,
    pub tz_offset_minutes: i32,
}

/// Generator that turns a snapshot into the opaque system-context
/// string sent with the session setup. Called exactly once per
/// connection.
pub type InstructionFn = Arc<dyn Fn(&ContextSnapshot) -> String + Send + Sync>;
