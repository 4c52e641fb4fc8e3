//! Amazon Bedrock model backend speaking the Converse API.
//!
//! Authenticates with a Bedrock API key sent as a bearer token.

mod client;
mod config;
mod converse;

pub use client::BedrockClient;
pub use config::{
    BedrockConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL_ID, DEFAULT_REGION, DEFAULT_TEMPERATURE,
};
pub use converse::{ConverseRequest, ConverseResponse};
