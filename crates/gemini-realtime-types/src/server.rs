//! Messages received from the Gemini Live endpoint.
//!
//! Unknown sections are ignored during deserialization so protocol
//! additions on the server side never break the client.

use serde::Deserialize;
use serde_json::Value;

/// Envelope for every server -> client frame.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    /// Present once, acknowledging the `setup` message.
    pub setup_complete: Option<Value>,
    pub server_content: Option<ServerContent>,
    pub tool_call: Option<ToolCall>,
}

/// Incremental content generated by the model.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    pub model_turn: Option<ModelTurn>,
    pub input_transcription: Option<Transcription>,
    pub output_transcription: Option<Transcription>,
    pub turn_complete: Option<bool>,
    /// Set when the model abandons its own output (user barge-in).
    pub interrupted: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct ModelTurn {
    #[serde(default)]
    pub parts: Vec<ServerPart>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ServerPart {
    pub text: Option<String>,
    pub inline_data: Option<ServerBlob>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ServerBlob {
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Deserialize, Debug)]
pub struct Transcription {
    pub text: String,
}

/// A batch of capability invocations requested by the backend.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
}

/// One requested invocation. The `id` must be echoed back in the
/// matching response so the backend can correlate it.
#[derive(Deserialize, Debug, Clone)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}
