//! reqwest-backed generation client.
//!
//! Speaks a minimal JSON envelope against a configurable endpoint; the
//! wizard never sees anything vendor-specific beyond this file.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GenerationConfig;
use crate::error::WizardError;
use crate::generation::{ChunkStream, GenerationClient, GenerationRequest, GenerationResponse};
use crate::wizard::types::GroundingSource;

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    use_search: bool,
}

#[derive(Deserialize)]
struct ApiSource {
    uri: String,
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    text: String,
    #[serde(default)]
    sources: Vec<ApiSource>,
}

/// HTTP generation client configured from [`GenerationConfig`].
pub struct HttpGenerationClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

impl HttpGenerationClient {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, stream: bool) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if stream {
            format!("{}/v1/generate?stream=true", base)
        } else {
            format!("{}/v1/generate", base)
        }
    }

    async fn post(&self, request: &GenerationRequest, stream: bool) -> Result<reqwest::Response, WizardError> {
        let body = ApiRequest {
            model: &self.config.model,
            prompt: &request.prompt,
            response_schema: request.schema.as_ref(),
            use_search: request.grounded_search,
        };
        let response = self
            .http
            .post(self.endpoint(stream))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| WizardError::Generation(e.to_string()))?;
        if !response.status().is_success() {
            return Err(WizardError::Generation(format!(
                "endpoint returned {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, WizardError> {
        let response = self.post(&request, false).await?;
        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| WizardError::Generation(e.to_string()))?;
        Ok(GenerationResponse {
            text: parsed.text,
            sources: parsed
                .sources
                .into_iter()
                .map(|s| GroundingSource {
                    uri: s.uri,
                    title: s.title,
                })
                .collect(),
        })
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<ChunkStream, WizardError> {
        let response = self.post(&request, true).await?;
        let chunks = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(|e| WizardError::Generation(e.to_string()))
        });
        Ok(Box::pin(chunks))
    }
}
