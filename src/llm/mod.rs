//! Chat completions client and reply parsing.

pub mod client;
pub mod json;

pub use client::{ChatBackend, OpenAiClient};
pub use json::parse_json_object;
