//! Session error taxonomy.

use std::time::Duration;

/// Errors surfaced through the session event channel.
///
/// The variants map directly onto the retry policy: transient
/// connectivity failures are retried with backoff, everything else
/// terminates the session.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// Microphone or speaker acquisition failed. Never retried; the UI
    /// should prompt the user (e.g. for microphone permission).
    #[error("audio device unavailable: {0}")]
    AudioDevice(String),
    /// The server did not complete the setup handshake in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
    /// Transport-level failure while connecting or streaming.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server closed the connection.
    #[error("connection closed by server")]
    TransportClosed,
    /// All reconnection attempts have been used up.
    #[error("gave up reconnecting after {0} attempts")]
    RetriesExhausted(u32),
    /// A malformed or unexpected frame was received.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl SessionError {
    /// Whether this is a transient connectivity condition worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::HandshakeTimeout(_) | Self::Transport(_) | Self::TransportClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connectivity_errors_are_transient() {
        assert!(SessionError::HandshakeTimeout(Duration::from_secs(10)).is_transient());
        assert!(SessionError::Transport("reset".to_string()).is_transient());
        assert!(SessionError::TransportClosed.is_transient());

        assert!(!SessionError::AudioDevice("permission denied".to_string()).is_transient());
        assert!(!SessionError::RetriesExhausted(5).is_transient());
        assert!(!SessionError::Protocol("bad frame".to_string()).is_transient());
    }
}
