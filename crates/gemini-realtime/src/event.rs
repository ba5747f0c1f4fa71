//! Typed events delivered to session subscribers.

use crate::{error::SessionError, state::SessionState};

/// Events published on the session broadcast channel.
///
/// Dropping the receiver returned by `SessionClient::subscribe`
/// unsubscribes the listener. Public client methods never return
/// errors; [`SessionEvent::Error`] is the single place failures are
/// surfaced for user-visible messaging.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session moved to a new lifecycle state.
    StateChange(SessionState),
    /// A decoded, non-audio payload from the server.
    Message(MessagePayload),
    /// A failure the UI should present.
    Error(SessionError),
}

/// Non-audio server payloads relayed to subscribers.
#[derive(Debug, Clone)]
pub enum MessagePayload {
    /// Live transcription of the user's speech.
    InputTranscription { text: String },
    /// Transcription of the agent's spoken output.
    OutputTranscription { text: String },
    /// A text part of a model turn.
    ModelText { text: String },
    /// The server finished its conversational turn.
    TurnComplete,
    /// The server abandoned its output (user barge-in).
    Interrupted,
}
