//! Tool (function-calling) declarations advertised to the backend at setup.

use serde::Serialize;
use serde_json::{Value, json};

/// A group of function declarations exposed to the model.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// A single callable capability. `parameters` is an opaque JSON schema;
/// the session client passes it through without interpreting it.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Builds the `manageCalendar` declaration used by the calendar
/// assistant. The category enum comes from the caller's current
/// category set, so it tracks whatever the user has configured.
pub fn manage_calendar(categories: &[String]) -> Tool {
    Tool {
        function_declarations: vec![FunctionDeclaration {
            name: "manageCalendar".to_string(),
            description:
                "Create, update, delete or move a calendar event on behalf of the user."
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "actionType": {
                        "type": "string",
                        "enum": ["create", "update", "delete", "move"]
                    },
                    "eventId": {"type": "string"},
                    "eventData": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "start": {"type": "string"},
                            "end": {"type": "string"},
                            "category": {"type": "string", "enum": categories}
                        }
                    }
                },
                "required": ["actionType"]
            }),
        }],
    }
}
