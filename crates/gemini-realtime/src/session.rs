//! The session runtime: a single actor owning the connection
//! lifecycle, the state machine and all protocol handling.
//!
//! All state transitions happen on this task, so they are naturally
//! linearized: a transition (including its side effects) completes
//! before the next inbound frame, command or timer is examined.

use crate::{
    audio::{self, AudioDuplex, AudioFrame, AudioStreams, CapturedFrame},
    config::SessionConfig,
    context::{ContextSnapshot, InstructionFn},
    error::SessionError,
    event::{MessagePayload, SessionEvent},
    state::SessionState,
    tools::{self, ToolDispatcher},
    transport::{Connection, Connector, InboundFrame},
};
use gemini_realtime_types::client::{
    Blob, ClientContent, ClientMessage, Content, GenerationConfig, RealtimeInput,
    ResponseModality, Setup, SpeechConfig, ToolResponse,
};
use gemini_realtime_types::server::ServerMessage;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Canned opening line sent the first time the user ever talks to the
/// agent.
pub(crate) const FIRST_INTERACTION_GREETING: &str = "Hi! I'm your calendar assistant. \
     Tell me about your plans and I'll keep your schedule in order.";

/// Commands accepted by a running session actor.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    SendText(String),
    Disconnect,
}

pub(crate) struct SessionRuntime {
    pub(crate) config: SessionConfig,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) audio: Arc<dyn AudioDuplex>,
    pub(crate) dispatcher: Arc<dyn ToolDispatcher>,
    pub(crate) instruction: InstructionFn,
    pub(crate) events: broadcast::Sender<SessionEvent>,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) volume: watch::Sender<f32>,
    pub(crate) voice_profile: String,
    pub(crate) snapshot: ContextSnapshot,
}

/// Why a single connection ended without an error.
enum ConnectionExit {
    /// `disconnect()` was requested (or every handle was dropped).
    Disconnected,
}

impl SessionRuntime {
    /// Drives the session to completion: acquire audio, connect, stream,
    /// reconnect on transient failures, and tear everything down exactly
    /// once. The snapshot was captured at `connect()` time and stays
    /// frozen for the whole run.
    pub(crate) async fn run(
        self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut greeting: Option<String>,
    ) {
        let system_instruction = (self.instruction)(&self.snapshot);

        self.set_state(SessionState::Connecting);
        let mut streams = match self.audio.start().await {
            Ok(streams) => streams,
            Err(e) => {
                // Device acquisition failure is not a network condition:
                // surface it and stop without scheduling retries.
                self.emit_error(e);
                self.set_state(SessionState::Closed);
                return;
            }
        };

        let mut attempts: u32 = 0;
        loop {
            self.set_state(SessionState::Connecting);
            let exit = self
                .run_connection(&mut commands, &mut streams, &mut greeting, &system_instruction)
                .await;
            match exit {
                Ok(ConnectionExit::Disconnected) => break,
                Err(e) if e.is_transient() => {
                    self.set_state(SessionState::Error);
                    attempts += 1;
                    if attempts > self.config.backoff.max_attempts {
                        self.emit_error(SessionError::RetriesExhausted(
                            self.config.backoff.max_attempts,
                        ));
                        break;
                    }
                    let delay = self.config.backoff.delay_for(attempts);
                    warn!(error = %e, attempt = attempts, ?delay, "connection lost, scheduling reconnect");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = wait_for_disconnect(&mut commands) => break,
                    }
                }
                Err(e) => {
                    self.emit_error(e);
                    break;
                }
            }
        }

        self.audio.stop().await;
        self.set_state(SessionState::Closed);
        info!("session torn down");
    }

    /// One connection attempt plus its streaming loop. `Ok` means the
    /// caller asked to disconnect; transient `Err`s are retried by
    /// [`run`].
    async fn run_connection(
        &self,
        commands: &mut mpsc::Receiver<SessionCommand>,
        streams: &mut AudioStreams,
        greeting: &mut Option<String>,
        system_instruction: &str,
    ) -> Result<ConnectionExit, SessionError> {
        // One timer covers the whole connect phase: transport open,
        // setup send and the setup ack. Disconnect interrupts any of
        // those steps.
        let connection = tokio::select! {
            established = timeout(
                self.config.connect_timeout,
                self.establish(&mut streams.captured, system_instruction),
            ) => established
                .map_err(|_| SessionError::HandshakeTimeout(self.config.connect_timeout))??,
            _ = wait_for_disconnect(commands) => return Ok(ConnectionExit::Disconnected),
        };
        let Connection {
            outbound,
            mut inbound,
        } = connection;

        self.set_state(SessionState::Open);
        info!(model = %self.config.model, voice = %self.voice_profile, "session open");

        if let Some(text) = greeting.take() {
            send(&outbound, client_text(&text)).await?;
        }

        loop {
            tokio::select! {
                biased;
                cmd = commands.recv() => match cmd {
                    Some(SessionCommand::SendText(text)) => {
                        send(&outbound, client_text(&text)).await?;
                    }
                    Some(SessionCommand::Disconnect) | None => {
                        return Ok(ConnectionExit::Disconnected);
                    }
                },
                frame = inbound.recv() => match frame {
                    Some(InboundFrame::Text(text)) => {
                        self.handle_server_text(&text, &streams.playback, &outbound)
                            .await?;
                    }
                    Some(InboundFrame::Closed { reason }) => {
                        warn!(?reason, "connection closed by server");
                        return Err(SessionError::TransportClosed);
                    }
                    None => return Err(SessionError::TransportClosed),
                },
                captured = streams.captured.recv() => match captured {
                    Some(captured) => self.forward_audio(captured, &outbound),
                    None => {
                        return Err(SessionError::AudioDevice(
                            "capture stream ended".to_string(),
                        ));
                    }
                },
                Some(_) = streams.drained.recv() => {
                    if *self.state.borrow() == SessionState::Talking {
                        self.set_state(SessionState::Open);
                    }
                }
            }
        }
    }

    /// Opens the transport and completes the setup handshake.
    async fn establish(
        &self,
        captured: &mut mpsc::Receiver<CapturedFrame>,
        system_instruction: &str,
    ) -> Result<Connection, SessionError> {
        let mut connection = self.connector.connect().await?;
        send(&connection.outbound, self.setup_message(system_instruction)).await?;
        self.await_setup_complete(&mut connection.inbound, captured)
            .await?;
        Ok(connection)
    }

    /// Waits for the server to acknowledge the setup message.
    ///
    /// Microphone frames arriving before the session is open are
    /// dropped here (their level is still surfaced), never queued
    /// against a socket that may never finish its handshake.
    async fn await_setup_complete(
        &self,
        inbound: &mut mpsc::Receiver<InboundFrame>,
        captured: &mut mpsc::Receiver<CapturedFrame>,
    ) -> Result<(), SessionError> {
        loop {
            tokio::select! {
                biased;
                Some(frame) = captured.recv() => {
                    self.volume.send_replace(frame.rms);
                }
                frame = inbound.recv() => match frame {
                    Some(InboundFrame::Text(text)) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) if msg.setup_complete.is_some() => return Ok(()),
                            Ok(_) => warn!("unexpected message during setup"),
                            Err(e) => warn!(error = %e, "dropping unparseable frame during setup"),
                        }
                    }
                    Some(InboundFrame::Closed { reason }) => {
                        warn!(?reason, "connection closed during setup");
                        return Err(SessionError::TransportClosed);
                    }
                    None => return Err(SessionError::TransportClosed),
                },
            }
        }
    }

    /// Decodes one server frame and applies it: speech to the playback
    /// sink, tool calls to the dispatcher, control signals to
    /// subscribers. Malformed frames are logged and dropped without
    /// tearing the session down.
    async fn handle_server_text(
        &self,
        text: &str,
        playback: &mpsc::Sender<AudioFrame>,
        outbound: &mpsc::Sender<ClientMessage>,
    ) -> Result<(), SessionError> {
        let msg: ServerMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "dropping malformed server message");
                return Ok(());
            }
        };

        if let Some(content) = msg.server_content {
            if let Some(transcription) = content.input_transcription {
                self.emit_message(MessagePayload::InputTranscription {
                    text: transcription.text,
                });
            }
            if let Some(transcription) = content.output_transcription {
                self.emit_message(MessagePayload::OutputTranscription {
                    text: transcription.text,
                });
            }
            if let Some(model_turn) = content.model_turn {
                for part in model_turn.parts {
                    if let Some(blob) = part.inline_data {
                        let samples = audio::decode_pcm_base64(&blob.data);
                        if samples.is_empty() {
                            continue;
                        }
                        self.set_state(SessionState::Talking);
                        if playback.send(AudioFrame::playback(samples)).await.is_err() {
                            return Err(SessionError::AudioDevice(
                                "playback sink closed".to_string(),
                            ));
                        }
                    }
                    if let Some(text) = part.text {
                        self.emit_message(MessagePayload::ModelText { text });
                    }
                }
            }
            if content.interrupted == Some(true) {
                self.emit_message(MessagePayload::Interrupted);
                self.set_state(SessionState::Open);
            }
            if content.turn_complete == Some(true) {
                self.emit_message(MessagePayload::TurnComplete);
                self.set_state(SessionState::Open);
            }
        }

        if let Some(tool_call) = msg.tool_call {
            self.set_state(SessionState::Thinking);
            let responses =
                tools::run_batch(self.dispatcher.as_ref(), tool_call.function_calls).await;
            let reply = ClientMessage::ToolResponse(ToolResponse {
                function_responses: responses,
            });
            // Best effort: if the transport went away while a tool ran,
            // the results are discarded along with the session.
            if outbound.send(reply).await.is_err() {
                warn!("session closed before tool responses could be sent");
            }
        }

        Ok(())
    }

    /// Fire-and-forget audio path: capture never awaits the network and
    /// frames are dropped, not queued, whenever the session cannot take
    /// them.
    fn forward_audio(&self, captured: CapturedFrame, outbound: &mpsc::Sender<ClientMessage>) {
        self.volume.send_replace(captured.rms);
        if !self.state.borrow().accepts_audio() {
            return;
        }
        let msg = ClientMessage::RealtimeInput(RealtimeInput {
            audio: Blob {
                mime_type: captured.frame.mime_type(),
                data: audio::encode_pcm_base64(&captured.frame.samples),
            },
        });
        if outbound.try_send(msg).is_err() {
            debug!("outbound transport busy, dropping audio frame");
        }
    }

    fn setup_message(&self, system_instruction: &str) -> ClientMessage {
        ClientMessage::Setup(Setup {
            model: self.config.model.clone(),
            generation_config: GenerationConfig {
                response_modalities: vec![ResponseModality::Audio],
                speech_config: Some(SpeechConfig::voice(&self.voice_profile)),
            },
            system_instruction: Some(Content::system_text(system_instruction)),
            tools: self.config.tools.clone(),
        })
    }

    fn set_state(&self, next: SessionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            debug!(state = %next, "session state changed");
            let _ = self.events.send(SessionEvent::StateChange(next));
        }
    }

    fn emit_message(&self, payload: MessagePayload) {
        let _ = self.events.send(SessionEvent::Message(payload));
    }

    fn emit_error(&self, err: SessionError) {
        error!(error = %err, "session error");
        let _ = self.events.send(SessionEvent::Error(err));
    }
}

/// Resolves when disconnect is requested or every handle is gone,
/// discarding anything else sent while no connection is open.
async fn wait_for_disconnect(commands: &mut mpsc::Receiver<SessionCommand>) {
    loop {
        match commands.recv().await {
            Some(SessionCommand::Disconnect) | None => return,
            Some(SessionCommand::SendText(_)) => {
                debug!("dropping text sent before the session is open");
            }
        }
    }
}

fn client_text(text: &str) -> ClientMessage {
    ClientMessage::ClientContent(ClientContent {
        turns: vec![Content::user_text(text)],
        turn_complete: true,
    })
}

async fn send(
    outbound: &mpsc::Sender<ClientMessage>,
    msg: ClientMessage,
) -> Result<(), SessionError> {
    outbound
        .send(msg)
        .await
        .map_err(|_| SessionError::TransportClosed)
}
