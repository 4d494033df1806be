//! Generation client boundary.
//!
//! The workflow depends only on this contract, never on a vendor's request
//! or response shape: a prompt (optionally with a structured-output schema
//! and a grounded-search flag) in, raw text plus optional grounding sources
//! out. Streaming delivers an ordered, append-only sequence of text chunks.

pub mod http;
pub mod prompts;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;

use crate::error::WizardError;
use crate::wizard::types::GroundingSource;

pub use http::HttpGenerationClient;

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Structured-output schema the model should conform to.
    pub schema: Option<Value>,
    /// Ask the provider to ground the answer with web/maps search.
    pub grounded_search: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            schema: None,
            grounded_search: false,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_search(mut self) -> Self {
        self.grounded_search = true;
        self
    }
}

/// Raw model output.
#[derive(Debug, Clone, Default)]
pub struct GenerationResponse {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

/// Ordered, append-only stream of incremental text chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, WizardError>> + Send>>;

/// Abstract generation boundary.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// One-shot generation.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, WizardError>;

    /// Streaming generation. The default delivers the one-shot result as a
    /// single chunk; clients with real streaming override this.
    async fn generate_stream(&self, request: GenerationRequest) -> Result<ChunkStream, WizardError> {
        let response = self.generate(request).await?;
        Ok(Box::pin(futures::stream::once(async move {
            Ok(response.text)
        })))
    }
}
