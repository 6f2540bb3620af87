// ecochat - Carbon-aware chat front-end with a persistent response cache
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod chat;
pub mod cli;
pub mod config;
pub mod emissions;
pub mod error;
pub mod inference;
pub mod metrics;
pub mod models;
pub mod server;
pub mod utils;
