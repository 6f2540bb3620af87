//! Axum-based HTTP front-end for ecochat.
//!
//! A web chat UI talks to this API: it posts one turn at a time to
//! `/v1/chat` and reads the session counters and emissions dashboard data
//! from the other endpoints.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual endpoints (chat, session, emissions, health, metrics).
//! - `middleware`: Request ID tracking and request metrics.
//! - `routes`: The router and shared application state.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::{ChatApiRequest, ChatApiResponse, HealthResponse, SessionResponse};
pub use routes::{create_router, AppState};
