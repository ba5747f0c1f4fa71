//! Public handle for driving a voice-agent session.

use crate::{
    audio::AudioDuplex,
    config::SessionConfig,
    context::{ContextSnapshot, InstructionFn},
    event::SessionEvent,
    session::{FIRST_INTERACTION_GREETING, SessionCommand, SessionRuntime},
    state::SessionState,
    tools::ToolDispatcher,
    transport::{Connector, WsConnector},
};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 64;
const COMMAND_CAPACITY: usize = 16;

struct Live {
    task: Option<JoinHandle<()>>,
    commands: Option<mpsc::Sender<SessionCommand>>,
}

/// Handle to at most one live session at a time.
///
/// All methods are infallible by design: failures surface as
/// [`SessionEvent`]s so callers react in one place. The handle is cheap
/// to share behind an `Arc` and every method takes `&self`.
pub struct SessionClient {
    config: SessionConfig,
    connector: Arc<dyn Connector>,
    audio: Arc<dyn AudioDuplex>,
    dispatcher: Arc<dyn ToolDispatcher>,
    instruction: InstructionFn,
    events: broadcast::Sender<SessionEvent>,
    state_tx: watch::Sender<SessionState>,
    volume_tx: watch::Sender<f32>,
    live: Mutex<Live>,
}

impl SessionClient {
    /// Builds a client over explicit transport, audio and tool seams.
    pub fn new(
        config: SessionConfig,
        connector: Arc<dyn Connector>,
        audio: Arc<dyn AudioDuplex>,
        dispatcher: Arc<dyn ToolDispatcher>,
        instruction: InstructionFn,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            connector,
            audio,
            dispatcher,
            instruction,
            events,
            state_tx: watch::Sender::new(SessionState::Idle),
            volume_tx: watch::Sender::new(0.0),
            live: Mutex::new(Live {
                task: None,
                commands: None,
            }),
        }
    }

    /// Builds a client speaking websocket to the configured endpoint.
    pub fn with_websocket(
        config: SessionConfig,
        audio: Arc<dyn AudioDuplex>,
        dispatcher: Arc<dyn ToolDispatcher>,
        instruction: InstructionFn,
    ) -> Self {
        let connector = Arc::new(WsConnector::new(config.clone()));
        Self::new(config, connector, audio, dispatcher, instruction)
    }

    /// Starts a session with the given voice and context snapshot.
    ///
    /// A no-op while a session is already live. A session waiting out
    /// a reconnect delay still counts as live; it returns to
    /// `Connecting` on its own rather than being replaced. The snapshot
    /// is frozen for the whole session; reconnects within the session
    /// reuse it. On a first interaction the agent opens with a canned
    /// greeting.
    pub async fn connect(
        &self,
        voice_profile: &str,
        is_first_interaction: bool,
        snapshot: ContextSnapshot,
    ) {
        let mut live = self.live.lock().await;
        if let Some(task) = &live.task {
            if !task.is_finished() {
                debug!("connect ignored, session already live");
                return;
            }
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let greeting = is_first_interaction.then(|| FIRST_INTERACTION_GREETING.to_string());
        let runtime = SessionRuntime {
            config: self.config.clone(),
            connector: self.connector.clone(),
            audio: self.audio.clone(),
            dispatcher: self.dispatcher.clone(),
            instruction: self.instruction.clone(),
            events: self.events.clone(),
            state: self.state_tx.clone(),
            volume: self.volume_tx.clone(),
            voice_profile: voice_profile.to_string(),
            snapshot,
        };
        live.task = Some(tokio::spawn(runtime.run(cmd_rx, greeting)));
        live.commands = Some(cmd_tx);
    }

    /// Requests teardown of the live session, if any.
    ///
    /// Safe to call repeatedly: cleanup runs once, on the session task.
    /// Without a live session this only pins the state to `Closed`.
    pub async fn disconnect(&self) {
        let mut live = self.live.lock().await;
        if let Some(commands) = live.commands.take() {
            // The runtime may already be gone; then state is Closed.
            let _ = commands.send(SessionCommand::Disconnect).await;
            return;
        }
        let state = *self.state_tx.borrow();
        if !state.is_live() && state != SessionState::Closed {
            let changed = self.state_tx.send_if_modified(|current| {
                if *current == SessionState::Closed {
                    false
                } else {
                    *current = SessionState::Closed;
                    true
                }
            });
            if changed {
                let _ = self
                    .events
                    .send(SessionEvent::StateChange(SessionState::Closed));
            }
        }
    }

    /// Sends a text turn into the live session. Dropped with a warning
    /// when no session is live.
    pub async fn send_text(&self, text: &str) {
        let live = self.live.lock().await;
        match &live.commands {
            Some(commands) => {
                if commands
                    .send(SessionCommand::SendText(text.to_string()))
                    .await
                    .is_err()
                {
                    warn!("text dropped, session is shutting down");
                }
            }
            None => warn!("text dropped, no live session"),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Watch channel following every state transition.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Latest capture level (normalized RMS).
    pub fn volume(&self) -> f32 {
        *self.volume_tx.borrow()
    }

    /// Watch channel with the latest capture level, for volume
    /// visualizations.
    pub fn watch_volume(&self) -> watch::Receiver<f32> {
        self.volume_tx.subscribe()
    }

    /// Subscribes to session events. Dropping the receiver
    /// unsubscribes; a lagging subscriber loses oldest events first.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether a session is currently connecting or connected.
    pub fn is_live(&self) -> bool {
        self.state().is_live()
    }
}
