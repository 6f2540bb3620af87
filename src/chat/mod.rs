// Chat orchestration module
// Author: kelexine (https://github.com/kelexine)

pub mod models;
mod service;

pub use models::{ChatReply, ChatRequest, ReplyOrigin, SessionStats};
pub use service::ChatService;
