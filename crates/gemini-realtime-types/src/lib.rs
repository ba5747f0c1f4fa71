//! Wire-protocol types for the Gemini Live (`BidiGenerateContent`) websocket API.
//!
//! Every frame on the wire is a JSON object with camelCase keys. Client
//! frames are externally tagged by their payload kind (`setup`,
//! `realtimeInput`, `clientContent`, `toolResponse`); server frames carry
//! optional sections (`setupComplete`, `serverContent`, `toolCall`).
//! Tool schemas are opaque JSON passed through to the backend untouched.

pub mod client;
pub mod server;
pub mod tool;
