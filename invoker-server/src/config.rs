use std::net::SocketAddr;

use clap::Parser;
use invoker_agent::DEFAULT_MAX_STEPS;
use invoker_bedrock::{
    BedrockConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL_ID, DEFAULT_REGION, DEFAULT_TEMPERATURE,
};
use invoker_core::InvokerError;
use secrecy::SecretString;

pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "invoker-server",
    version,
    about = "Serves a tool-calling agent over HTTP"
)]
pub struct ServerConfig {
    #[arg(long, env = "INVOKER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Filter used when `RUST_LOG` is unset.
    #[arg(long, env = "INVOKER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "INVOKER_LOG_JSON")]
    pub log_json: bool,

    /// Maximum request body size in bytes.
    #[arg(long, env = "INVOKER_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
    pub body_limit: usize,

    #[arg(long, env = "BEDROCK_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    #[arg(long, env = "BEDROCK_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    #[arg(long, env = "BEDROCK_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    #[arg(long, env = "BEDROCK_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(long, env = "AWS_BEARER_TOKEN_BEDROCK", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "INVOKER_MAX_STEPS", default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: usize,

    #[arg(long, env = "INVOKER_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// Zone used by `current_time` when the model passes none.
    #[arg(long, env = "DEFAULT_TIMEZONE", default_value = "UTC")]
    pub default_timezone: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, InvokerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|err| {
                InvokerError::InvalidConfig(format!(
                    "invalid bind address {}:{}: {err}",
                    self.host, self.port
                ))
            })
    }

    pub fn bedrock_config(&self) -> BedrockConfig {
        let mut config = BedrockConfig::new(&self.model_id, &self.region)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint);
        }
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(SecretString::new(api_key.clone()));
        }
        config
    }
}
