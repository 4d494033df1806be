//! Async orchestration around the wizard state machine.
//!
//! `WizardSession` owns the controller behind a mutex and performs every
//! side effect: generation calls, response parsing, image adjuncts and
//! persistence. The protocol for each stage-advancing operation is the
//! same: take the controller transition first (an out-of-stage call fails
//! with `InvalidStage` before any request is issued), then run the async
//! remainder; a fatal failure there resets the wizard to mode selection.
//!
//! Cascade refinement is fire-and-forget: `approve` spawns the request and
//! returns immediately. The job carries the controller epoch it was issued
//! under, and the merge is dropped when the epoch has moved on.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, WizardError};
use crate::generation::{prompts, GenerationClient, GenerationRequest};
use crate::images::{
    archetype_illustration, persona_portraits, style_photos, ImageClient, ImageKind,
};
use crate::parser::{
    extract_json, parse_company_info, parse_fenced, strip_thinking_lines, THINKING_MARKER,
};
use crate::storage::{self, IdentityProvider, ProjectDraft, ProjectStore, StoredProject};
use crate::wizard::controller::{CandidateResolution, WizardController};
use crate::wizard::types::{
    CompanyCandidate, CompanyForm, DeepAnalysis, IdeaForm, PartKind, ValidationData, WizardMode,
    WizardStage,
};

/// Options for confirming the validated company identity.
#[derive(Debug, Clone, Default)]
pub struct ConfirmOptions {
    /// Run the grounded deep analysis before part generation.
    pub run_deep_analysis: bool,
    /// Reference (URL or path) to an uploaded logo to analyze.
    pub logo_reference: Option<String>,
}

/// Images produced alongside the brandboard. All best-effort.
#[derive(Debug, Clone, Default)]
pub struct SessionArtifacts {
    pub archetype_illustration: Option<Vec<u8>>,
    pub style_photos: Vec<Vec<u8>>,
    pub persona_portraits: Vec<(String, Option<Vec<u8>>)>,
    pub generated_logo: Option<Vec<u8>>,
}

/// Expected shape of the idea-concept response.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConceptPayload {
    company_name: String,
    #[serde(default)]
    description: String,
}

/// One wizard run: controller state plus the clients that feed it.
pub struct WizardSession {
    state: Arc<Mutex<WizardController>>,
    client: Arc<dyn GenerationClient>,
    image_client: Option<Arc<dyn ImageClient>>,
    /// Thinking lines surfaced by streamed responses, oldest first.
    progress: Mutex<Vec<String>>,
    artifacts: Mutex<SessionArtifacts>,
}

impl WizardSession {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            state: Arc::new(Mutex::new(WizardController::new())),
            client,
            image_client: None,
            progress: Mutex::new(Vec::new()),
            artifacts: Mutex::new(SessionArtifacts::default()),
        }
    }

    pub fn with_images(mut self, images: Arc<dyn ImageClient>) -> Self {
        self.image_client = Some(images);
        self
    }

    fn state(&self) -> MutexGuard<'_, WizardController> {
        self.state.lock().unwrap()
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn stage(&self) -> WizardStage {
        self.state().stage()
    }

    pub fn candidates(&self) -> Vec<CompanyCandidate> {
        self.state().candidates().to_vec()
    }

    pub fn validation(&self) -> Option<ValidationData> {
        self.state().validation().cloned()
    }

    pub fn current_part(&self) -> Option<(PartKind, Map<String, Value>)> {
        self.state()
            .current_part()
            .map(|(kind, data)| (kind, data.clone()))
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error().map(str::to_string)
    }

    /// Thinking lines collected so far, newest first.
    pub fn progress(&self) -> Vec<String> {
        self.progress.lock().unwrap().iter().rev().cloned().collect()
    }

    pub fn artifacts(&self) -> SessionArtifacts {
        self.artifacts.lock().unwrap().clone()
    }

    // ------------------------------------------------------------------
    // Entry
    // ------------------------------------------------------------------

    pub fn begin(&self) -> Result<()> {
        self.state().begin()
    }

    pub fn choose_mode(&self, mode: WizardMode) -> Result<()> {
        self.state().choose_mode(mode)
    }

    // ------------------------------------------------------------------
    // Validation flow
    // ------------------------------------------------------------------

    /// Search for an existing company and resolve its candidates. When the
    /// search yields one exact match the full profile is fetched in the
    /// same call; otherwise the stage ends at SelectingCandidate.
    pub async fn submit_company_form(&self, form: CompanyForm) -> Result<()> {
        self.state().begin_validation()?;
        self.checked(self.run_company_search(form)).await
    }

    async fn run_company_search(&self, form: CompanyForm) -> Result<()> {
        info!(company = %form.name, city = %form.city, "searching for company");
        let request = GenerationRequest::new(prompts::company_search(&form)).with_search();
        let response = self.client.generate(request).await?;
        let body = self.record_thinking(&response.text);
        let candidates: Vec<CompanyCandidate> = parse_fenced(&body)?;
        let resolution = self.state().resolve_candidates(candidates)?;
        match resolution {
            CandidateResolution::AutoSelected(candidate) => {
                self.fetch_company_info(candidate).await
            }
            CandidateResolution::Choose => Ok(()),
        }
    }

    /// Manual disambiguation after a multi-candidate search.
    pub async fn select_candidate(&self, id: &str) -> Result<()> {
        let candidate = self.state().pick_candidate(id)?;
        self.checked(self.fetch_company_info(candidate)).await
    }

    async fn fetch_company_info(&self, candidate: CompanyCandidate) -> Result<()> {
        info!(company = %candidate.company_name, "fetching full company profile");
        let request = GenerationRequest::new(prompts::full_company_info(&candidate)).with_search();
        let response = self.client.generate(request).await?;
        let body = self.record_thinking(&response.text);
        let parsed = parse_company_info(&body)?;

        let mut data = ValidationData::new(parsed.name);
        data.description = parsed.description;
        data.address = if parsed.address.is_empty() {
            candidate.address
        } else {
            parsed.address
        };
        data.website = if parsed.website.is_empty() {
            candidate.website_url
        } else {
            parsed.website
        };
        data.reputation = parsed.reviews_summary;
        data.social_links = parsed.social_links;
        data.instagram_stats = parsed.instagram_stats;
        self.state().set_validation_data(data)
    }

    /// Expand a new-business idea into an initial brand concept.
    pub async fn submit_idea_form(&self, form: IdeaForm) -> Result<()> {
        self.state().begin_validation()?;
        self.checked(self.run_concept(form)).await
    }

    async fn run_concept(&self, form: IdeaForm) -> Result<()> {
        info!(idea = %form.name, "expanding idea into a concept");
        let request = GenerationRequest::new(prompts::idea_concept(&form));
        let response = self.client.generate(request).await?;
        let body = self.record_thinking(&response.text);
        let concept: ConceptPayload = parse_fenced(&body)?;
        let mut data = ValidationData::new(concept.company_name);
        data.description = concept.description;
        self.state().set_concept(data)
    }

    // ------------------------------------------------------------------
    // Confirmation screens
    // ------------------------------------------------------------------

    /// Confirm the validated identity. Optionally analyzes an uploaded logo
    /// (best-effort) and runs the grounded deep analysis before part
    /// generation starts.
    pub async fn confirm_validation(&self, options: ConfirmOptions) -> Result<()> {
        self.state().confirm_validation(options.run_deep_analysis)?;
        self.checked(self.run_post_validation(options)).await
    }

    async fn run_post_validation(&self, options: ConfirmOptions) -> Result<()> {
        if let Some(reference) = &options.logo_reference {
            self.analyze_logo(reference).await;
        }
        if options.run_deep_analysis {
            self.run_deep_analysis().await
        } else {
            self.generate_part(PartKind::Core).await
        }
    }

    async fn analyze_logo(&self, reference: &str) {
        let Some(name) = self.validation().map(|v| v.company_name) else {
            return;
        };
        let request = GenerationRequest::new(prompts::logo_analysis(&name, reference));
        match self.client.generate(request).await {
            Ok(response) => {
                let body = self.record_thinking(&response.text);
                if let Err(e) = self.state().set_logo_analysis(reference, body) {
                    warn!(error = %e, "could not attach logo analysis");
                }
            }
            Err(e) => warn!(error = %e, "logo analysis failed"),
        }
    }

    async fn run_deep_analysis(&self) -> Result<()> {
        let Some(validation) = self.validation() else {
            return Err(WizardError::Generation(
                "no validated company for deep analysis".to_string(),
            ));
        };
        info!(company = %validation.company_name, "running deep analysis");
        let request = GenerationRequest::new(prompts::deep_analysis(&validation)).with_search();
        let response = self.client.generate(request).await?;
        let text = self.record_thinking(&response.text);
        self.state().set_deep_analysis(DeepAnalysis {
            text,
            sources: response.sources,
        })
    }

    pub async fn confirm_analysis(&self) -> Result<()> {
        self.state().confirm_analysis()?;
        self.checked(self.generate_part(PartKind::Core)).await
    }

    pub async fn confirm_concept(&self) -> Result<()> {
        self.state().confirm_concept()?;
        self.checked(self.generate_part(PartKind::Core)).await
    }

    // ------------------------------------------------------------------
    // Part generation and review
    // ------------------------------------------------------------------

    async fn generate_part(&self, kind: PartKind) -> Result<()> {
        info!(part = kind.number(), title = kind.title(), "generating part");
        let context = self.brand_context();
        let request = GenerationRequest::new(prompts::part_generation(kind, &context))
            .with_schema(prompts::part_schema(kind));
        let mut stream = self.client.generate_stream(request).await?;

        let mut body = String::new();
        let mut pending = String::new();
        while let Some(chunk) = stream.next().await {
            pending.push_str(&chunk?);
            while let Some(pos) = pending.find('\n') {
                let line: String = pending.drain(..=pos).collect();
                self.consume_line(&line, &mut body);
            }
        }
        self.consume_line(&pending, &mut body);

        let data: Map<String, Value> = parse_fenced(&body)?;
        self.state().push_part(data)?;
        Ok(())
    }

    /// Confirm the reviewed part, run its image adjunct and generate the
    /// next part (or assemble the final board after part 4).
    pub async fn confirm_part(&self) -> Result<()> {
        let next = self.state().confirm_part()?;
        self.checked(self.run_after_confirm(next)).await
    }

    async fn run_after_confirm(&self, next: Option<PartKind>) -> Result<()> {
        let confirmed = {
            let state = self.state();
            state.brandboard().parts.last().map(|p| (p.kind, p.data.clone()))
        };
        if let (Some(client), Some((kind, data))) = (self.image_client.as_ref(), confirmed) {
            match kind {
                PartKind::Core => {
                    let image = archetype_illustration(client.as_ref(), &data).await;
                    self.artifacts.lock().unwrap().archetype_illustration = image;
                }
                PartKind::Voice => {}
                PartKind::Visual => {
                    let photos = style_photos(client.as_ref(), &data).await;
                    self.artifacts.lock().unwrap().style_photos = photos;
                }
                PartKind::Channel => {
                    let portraits = persona_portraits(client.as_ref(), &data).await;
                    self.artifacts.lock().unwrap().persona_portraits = portraits;
                }
            }
        }
        match next {
            Some(kind) => self.generate_part(kind).await,
            None => {
                self.generate_logo().await;
                self.state().finish()
            }
        }
    }

    async fn generate_logo(&self) {
        let Some(client) = self.image_client.as_ref() else {
            return;
        };
        let prompt = {
            let state = self.state();
            let Some(validation) = state.validation() else {
                return;
            };
            let visual = state
                .brandboard()
                .part(PartKind::Visual)
                .map(|p| Value::Object(p.data.clone()))
                .unwrap_or(Value::Null);
            format!(
                "{}marca \"{}\". Direção visual: {}",
                ImageKind::Logo.style_prefix(),
                validation.company_name,
                visual
            )
        };
        match client.generate_image(&prompt, ImageKind::Logo).await {
            Ok(bytes) => self.artifacts.lock().unwrap().generated_logo = Some(bytes),
            Err(e) => warn!(error = %e, "logo generation failed"),
        }
    }

    pub fn go_back(&self) -> Result<()> {
        self.state().go_back()
    }

    // ------------------------------------------------------------------
    // Topic-level review
    // ------------------------------------------------------------------

    /// Toggle approval of a topic. On the false→true transition with
    /// downstream unapproved topics, a cascade refinement is spawned; the
    /// returned handle resolves when its merge (or discard) is done.
    pub fn approve(&self, key: &str) -> Result<Option<JoinHandle<()>>> {
        let Some(job) = self.state().approve(key)? else {
            return Ok(None);
        };
        let state = Arc::clone(&self.state);
        let client = Arc::clone(&self.client);
        let handle = tokio::spawn(async move {
            let request = GenerationRequest::new(prompts::refinement(&job));
            let response = match client.generate(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(topic = %job.approved_key, error = %e, "refinement request failed");
                    return;
                }
            };
            let values: Map<String, Value> = match parse_fenced(&response.text) {
                Ok(values) => values,
                Err(e) => {
                    warn!(topic = %job.approved_key, error = %e, "refinement output unusable");
                    return;
                }
            };
            if !state.lock().unwrap().merge_refinement(job.epoch, values) {
                debug!(topic = %job.approved_key, "refinement result discarded");
            }
        });
        Ok(Some(handle))
    }

    pub fn approve_all(&self) -> Result<()> {
        self.state().approve_all()
    }

    pub fn update_topic(&self, key: &str, value: Value) -> Result<()> {
        self.state().update_topic(key, value)
    }

    pub fn set_comment(&self, key: &str, text: impl Into<String>) -> Result<()> {
        self.state().set_comment(key, text)
    }

    /// Rewrite one topic according to its comment. Failure here leaves the
    /// wizard where it is; only the topic keeps its old value.
    pub async fn regenerate(&self, key: &str) -> Result<()> {
        let job = self.state().regenerate_request(key)?;
        let request = GenerationRequest::new(prompts::regenerate(&job));
        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| WizardError::RefinementFailed(e.to_string()))?;
        let body = self.record_thinking(&response.text);
        let value =
            extract_json(&body).unwrap_or_else(|_| Value::String(body.trim().to_string()));
        self.state().replace_topic(key, value)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Save the finished brandboard. Requires FinalDisplay and an
    /// authenticated identity.
    pub async fn save_project(
        &self,
        identity: &dyn IdentityProvider,
        store: &dyn ProjectStore,
    ) -> Result<StoredProject> {
        let draft = {
            let state = self.state();
            if state.stage() != WizardStage::FinalDisplay {
                return Err(WizardError::InvalidStage {
                    stage: state.stage(),
                    action: "save_project",
                });
            }
            let validation = state.validation().cloned().ok_or_else(|| {
                WizardError::PersistenceFailed("no validated company".to_string())
            })?;
            let artifacts = self.artifacts.lock().unwrap();
            ProjectDraft {
                company_name: validation.company_name.clone(),
                validation_data: validation,
                brandboard_data: state.brandboard().clone(),
                generated_logo: artifacts.generated_logo.clone(),
                photography_images: artifacts.style_photos.clone(),
            }
        };
        storage::save_project(identity, store, draft).await
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Run the async remainder of a stage-advancing operation. A fatal
    /// error resets the wizard to mode selection; anything else propagates
    /// untouched.
    async fn checked<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        match op.await {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_fatal_to_attempt() {
                    warn!(error = %e, "attempt failed, resetting to mode selection");
                    self.state().fail_to_safe(&e);
                }
                Err(e)
            }
        }
    }

    /// Validated identity plus accumulated parts, for part prompts.
    fn brand_context(&self) -> Value {
        let state = self.state();
        let mut context = Map::new();
        if let Some(validation) = state.validation() {
            if let Ok(value) = serde_json::to_value(validation) {
                context.insert("company".to_string(), value);
            }
        }
        context.insert("brandboard".to_string(), state.brandboard().context_value());
        Value::Object(context)
    }

    /// Strip thinking lines from a complete response, recording them as
    /// progress, and return the remaining body.
    fn record_thinking(&self, text: &str) -> String {
        let (body, thoughts) = strip_thinking_lines(text);
        if !thoughts.is_empty() {
            self.progress.lock().unwrap().extend(thoughts);
        }
        body
    }

    /// Route one streamed line: thinking lines become progress as they
    /// arrive, everything else accumulates into the body.
    fn consume_line(&self, line: &str, body: &mut String) {
        match line.trim_start().strip_prefix(THINKING_MARKER) {
            Some(rest) => {
                let thought = rest.trim().to_string();
                debug!(thought = %thought, "model progress");
                self.progress.lock().unwrap().push(thought);
            }
            None => body.push_str(line),
        }
    }
}
