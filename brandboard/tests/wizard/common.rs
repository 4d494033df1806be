//! Common test utilities for wizard tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use brandboard::error::WizardError;
use brandboard::generation::{GenerationClient, GenerationRequest, GenerationResponse};
use brandboard::images::{ImageClient, ImageKind};
use brandboard::wizard::{CompanyCandidate, CompanyForm, MatchType, PartKind};

// ============================================================================
// Scripted generation client
// ============================================================================

/// Generation client that replays scripted responses in order and records
/// every prompt it receives.
#[derive(Default)]
pub struct MockGenerationClient {
    responses: Mutex<VecDeque<Result<GenerationResponse, WizardError>>>,
    requests: Mutex<Vec<String>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: &str) {
        self.responses.lock().unwrap().push_back(Ok(GenerationResponse {
            text: text.to_string(),
            sources: Vec::new(),
        }));
    }

    pub fn push_error(&self, error: WizardError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, WizardError> {
        self.requests.lock().unwrap().push(request.prompt.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(WizardError::Generation("script exhausted".to_string())))
    }
}

// ============================================================================
// Scripted image client
// ============================================================================

/// Image client that returns a fixed payload and records every call.
#[derive(Default)]
pub struct MockImageClient {
    calls: Mutex<Vec<(ImageKind, String)>>,
}

impl MockImageClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(ImageKind, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageClient for MockImageClient {
    async fn generate_image(
        &self,
        prompt: &str,
        kind: ImageKind,
    ) -> Result<Vec<u8>, WizardError> {
        self.calls.lock().unwrap().push((kind, prompt.to_string()));
        Ok(vec![0xFF, 0xD8, 0xFF])
    }
}

// ============================================================================
// Sample builders
// ============================================================================

pub fn sample_form() -> CompanyForm {
    CompanyForm {
        name: "Padaria Sol".to_string(),
        city: "Campinas".to_string(),
    }
}

pub fn candidate(id: &str, name: &str, match_type: MatchType) -> CompanyCandidate {
    CompanyCandidate {
        id: id.to_string(),
        company_name: name.to_string(),
        address: "Campinas".to_string(),
        website_url: String::new(),
        description: String::new(),
        match_type,
    }
}

/// Fenced search response with a single exact-in-city match.
pub fn exact_candidate_response() -> String {
    r#"Encontrei a empresa:
```json
[{"id": "1", "companyName": "Padaria Sol", "address": "Rua das Flores, 123 - Campinas",
  "websiteUrl": "https://padariasol.com.br", "description": "Padaria artesanal",
  "matchType": "EXACT_IN_CITY"}]
```"#
        .to_string()
}

/// Fenced search response requiring manual disambiguation.
pub fn two_candidate_response() -> String {
    r#"```json
[{"id": "1", "companyName": "Padaria Sol", "address": "Campinas", "matchType": "EXACT_IN_CITY"},
 {"id": "2", "companyName": "Padaria do Sol", "address": "Valinhos",
  "matchType": "CORRECT_NAME_OTHER_CITY"}]
```"#
        .to_string()
}

/// Labeled-line full-company-info response.
pub fn company_info_response(name: &str) -> String {
    format!(
        "Nome da Empresa: {}\n\
         Descrição: Padaria artesanal de fermentação natural\n\
         Endereço: Rua das Flores, 123 - Campinas\n\
         Site: https://padariasol.com.br\n\
         Resumo de Avaliações: Nota média 4,8\n\
         Clientes elogiam o atendimento e os pães\n\
         Redes Sociais: instagram.com/padariasol\n\
         Estatísticas do Instagram: 12 mil seguidores",
        name
    )
}

/// Fenced idea-concept response.
pub fn concept_response() -> String {
    r#"```json
{"companyName": "Verde Vivo", "description": "Assinatura de plantas para apartamentos"}
```"#
        .to_string()
}

/// Raw topic data for a part, every declared topic populated.
pub fn part_data(kind: PartKind) -> Map<String, Value> {
    let mut data = Map::new();
    for topic in kind.topics() {
        let value = if topic.key == "personas" {
            json!([{"name": "Ana", "imagePrompt": "retrato de Ana, 32 anos, urbana"}])
        } else {
            json!(format!("{} gerado", topic.label))
        };
        data.insert(topic.key.to_string(), value);
    }
    data
}

/// Fenced part-generation response for a part.
pub fn part_response(kind: PartKind) -> String {
    format!("```json\n{}\n```", Value::Object(part_data(kind)))
}
