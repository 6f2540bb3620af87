//! Data models for the chat-completions backend.
//!
//! - `chat`: role-tagged messages, sampling options, and the request, response
//!   and streaming chunk bodies of an OpenAI-compatible `/chat/completions` API.

// Author: kelexine (https://github.com/kelexine)

pub mod chat;

pub use chat::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    GenerationOptions, Role,
};
