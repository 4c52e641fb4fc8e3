use async_trait::async_trait;
use invoker_core::{InvokerError, LlmRequest, LlmResponse, ToolCallingLlm};
use reqwest::Client;
use secrecy::ExposeSecret;
use url::Url;

use crate::converse::{error_message, ConverseRequest, ConverseResponse};
use crate::BedrockConfig;

#[derive(Clone)]
pub struct BedrockClient {
    config: BedrockConfig,
    http: Client,
}

impl std::fmt::Debug for BedrockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockClient")
            .field("model_id", &self.config.model_id)
            .field("region", &self.config.region)
            .field("endpoint", &self.config.endpoint_url())
            .finish()
    }
}

impl BedrockClient {
    pub fn new(config: BedrockConfig) -> Result<Self, InvokerError> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| InvokerError::LlmProvider(err.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BedrockConfig {
        &self.config
    }

    fn converse_url(&self, model_id: &str) -> Result<Url, InvokerError> {
        let endpoint = self.config.endpoint_url();
        let mut url = Url::parse(&endpoint).map_err(|err| {
            InvokerError::InvalidConfig(format!("invalid Bedrock endpoint '{endpoint}': {err}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                InvokerError::InvalidConfig(format!("Bedrock endpoint cannot be a base: {endpoint}"))
            })?
            .pop_if_empty()
            .extend(["model", model_id, "converse"]);
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error) -> InvokerError {
        if err.is_timeout() {
            tracing::warn!(timeout = ?self.config.timeout, "converse request timed out");
            InvokerError::Timeout(self.config.timeout)
        } else {
            InvokerError::LlmProvider(err.to_string())
        }
    }

    async fn converse(&self, request: LlmRequest) -> Result<LlmResponse, InvokerError> {
        let model_id = if request.model.is_empty() {
            self.config.model_id.as_str()
        } else {
            request.model.as_str()
        };
        let url = self.converse_url(model_id)?;
        let body = ConverseRequest::from_llm(&request, &self.config);

        tracing::debug!(
            model_id,
            messages = body.messages.len(),
            tools = body.tool_config.as_ref().map_or(0, |config| config.tools.len()),
            "sending converse request"
        );

        let mut builder = self.http.post(url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InvokerError::LlmProvider(format!(
                "{status}: {}",
                error_message(&body)
            )));
        }

        let parsed: ConverseResponse = response
            .json()
            .await
            .map_err(|err| self.transport_error(err))?;
        parsed.into_llm_response()
    }
}

#[async_trait]
impl ToolCallingLlm for BedrockClient {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, InvokerError> {
        self.converse(request).await
    }
}
