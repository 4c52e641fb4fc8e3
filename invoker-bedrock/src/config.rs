use std::time::Duration;

use invoker_core::InvokerError;
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Clone, Debug)]
pub struct BedrockConfig {
    pub model_id: String,
    pub region: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: Option<SecretString>,
    /// Overrides `https://bedrock-runtime.{region}.amazonaws.com`.
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_ID, DEFAULT_REGION)
    }
}

impl BedrockConfig {
    pub fn new(model_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            region: region.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key: None,
            endpoint: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Reads `BEDROCK_MODEL_ID`, `AWS_REGION`, `BEDROCK_TEMPERATURE`,
    /// `BEDROCK_MAX_TOKENS`, `AWS_BEARER_TOKEN_BEDROCK` and `BEDROCK_ENDPOINT`,
    /// keeping defaults for anything unset.
    pub fn from_env() -> Result<Self, InvokerError> {
        let mut config = Self::default();
        if let Ok(model_id) = std::env::var("BEDROCK_MODEL_ID") {
            config.model_id = model_id;
        }
        if let Ok(region) = std::env::var("AWS_REGION") {
            config.region = region;
        }
        if let Ok(raw) = std::env::var("BEDROCK_TEMPERATURE") {
            config.temperature = raw.parse().map_err(|_| {
                InvokerError::InvalidConfig(format!("BEDROCK_TEMPERATURE is not a number: {raw}"))
            })?;
        }
        if let Ok(raw) = std::env::var("BEDROCK_MAX_TOKENS") {
            config.max_tokens = raw.parse().map_err(|_| {
                InvokerError::InvalidConfig(format!("BEDROCK_MAX_TOKENS is not an integer: {raw}"))
            })?;
        }
        if let Ok(key) = std::env::var("AWS_BEARER_TOKEN_BEDROCK") {
            config.api_key = Some(SecretString::new(key));
        }
        if let Ok(endpoint) = std::env::var("BEDROCK_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), InvokerError> {
        if self.model_id.trim().is_empty() {
            return Err(InvokerError::InvalidConfig(
                "model id must not be empty".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(InvokerError::InvalidConfig(
                "region must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(InvokerError::InvalidConfig(format!(
                "temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(InvokerError::InvalidConfig(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        // Only a custom endpoint (proxy, local mock) may run without a key.
        let has_key = self
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty());
        if self.endpoint.is_none() && !has_key {
            return Err(InvokerError::InvalidConfig(
                "AWS_BEARER_TOKEN_BEDROCK is required when no Bedrock endpoint override is set"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }
}
