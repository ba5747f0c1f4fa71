//! Tool-call dispatch and response batching.

use async_trait::async_trait;
use gemini_realtime_types::{client::FunctionResponse, server::FunctionCall};
use serde_json::{Value, json};
use tracing::{info, warn};

/// A client-side capability the backend may invoke mid-conversation.
///
/// The calendar app registers a single capability (`manageCalendar`);
/// the session client never interprets the arguments, it only relays
/// them and the string result.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    /// Executes the named capability and returns a human-readable
    /// result string to relay back into the session.
    async fn execute(&self, name: &str, args: Value) -> anyhow::Result<String>;
}

/// Runs every call in order and collects one response per call id.
///
/// Dispatcher failures are converted into error strings so a failed
/// tool never crashes the session or leaves the backend's turn hanging.
pub async fn run_batch(
    dispatcher: &dyn ToolDispatcher,
    calls: Vec<FunctionCall>,
) -> Vec<FunctionResponse> {
    let mut responses = Vec::with_capacity(calls.len());
    for call in calls {
        info!(id = %call.id, name = %call.name, "dispatching tool call");
        let result = match dispatcher.execute(&call.name, call.args).await {
            Ok(result) => result,
            Err(e) => {
                warn!(id = %call.id, name = %call.name, error = %e, "tool dispatch failed");
                format!("Error executing {}: {}", call.name, e)
            }
        };
        responses.push(FunctionResponse {
            id: call.id,
            name: call.name,
            response: json!({ "result": result }),
        });
    }
    responses
}
