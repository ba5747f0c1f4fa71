//! Session lifecycle states and the guards derived from them.

use std::fmt;

/// Observable lifecycle state of the session client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session exists.
    Idle,
    /// Transport handshake in flight.
    Connecting,
    /// Session live, no active speech.
    Open,
    /// The server is streaming speech audio.
    Talking,
    /// A tool-call batch is being processed.
    Thinking,
    /// A recoverable failure occurred; a reconnect may be scheduled.
    Error,
    /// Session ended, either intentionally or after giving up retrying.
    Closed,
}

impl SessionState {
    /// States in which a session exists and `connect()` must be a no-op.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::Open | Self::Talking | Self::Thinking
        )
    }

    /// States in which captured microphone frames are forwarded to the
    /// transport. Everywhere else frames are dropped, never queued.
    pub fn accepts_audio(self) -> bool {
        matches!(self, Self::Open | Self::Talking | Self::Thinking)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Talking => "talking",
            Self::Thinking => "thinking",
            Self::Error => "error",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
