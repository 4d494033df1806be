//! The wizard state machine.
//!
//! `WizardController` is pure, synchronous session state: stage, mode,
//! candidates, validated company identity, accumulated brandboard parts and
//! per-part approval. All I/O (generation calls, parsing, image adjuncts)
//! lives in [`super::session::WizardSession`], which drives the controller
//! and applies results back.
//!
//! # Transitions
//!
//! | Current stage       | Action                  | Next stage                 |
//! |---------------------|-------------------------|----------------------------|
//! | Home                | begin()                 | ChooseMode                 |
//! | ChooseMode          | choose_mode(mode)       | FormInput                  |
//! | FormInput           | begin_validation()      | Validating                 |
//! | Validating          | resolve_candidates()    | SelectingCandidate or stay |
//! | SelectingCandidate  | pick_candidate(id)      | Validating                 |
//! | Validating          | set_validation_data()   | ConfirmValidation          |
//! | Validating          | set_concept()           | ConfirmConcept             |
//! | ConfirmValidation   | confirm_validation()    | Generating                 |
//! | Generating          | set_deep_analysis()     | ConfirmAnalysis            |
//! | ConfirmAnalysis     | confirm_analysis()      | Generating                 |
//! | ConfirmConcept      | confirm_concept()       | Generating                 |
//! | Generating          | push_part()             | ConfirmStep                |
//! | ConfirmStep         | confirm_part()          | Generating                 |
//! | Generating          | finish()                | FinalDisplay               |
//! | ConfirmStep         | go_back()               | ConfirmStep or entry stage |
//! | any                 | fail_to_safe(err)       | ChooseMode                 |
//!
//! Every stage-advancing action demands the stage it starts from, so a
//! duplicate submission while a generation is outstanding fails with
//! `InvalidStage` instead of issuing a second request. An epoch counter
//! increments on every transition; async results carry the epoch they were
//! issued under and are dropped on mismatch.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::WizardError;
use crate::wizard::approval::{ApprovalState, RefinementJob, RegenerateJob};
use crate::wizard::types::{
    BrandboardData, CompanyCandidate, DeepAnalysis, MatchType, PartKind, ValidationData,
    WizardMode, WizardStage,
};

/// Outcome of candidate resolution for an existing-company search.
#[derive(Debug, Clone)]
pub enum CandidateResolution {
    /// A single exact-in-city match: skip disambiguation.
    AutoSelected(CompanyCandidate),
    /// Multiple (or inexact) matches: the stage moved to
    /// SelectingCandidate and the list is held for manual selection.
    Choose,
}

/// Confirmation stage that maps to a given number of populated parts.
///
/// The current part number is always `parts.len()`; this is the single
/// place that turns a part count into a stage. Do not recompute it ad hoc.
pub fn confirm_stage_for_parts(count: usize) -> Option<WizardStage> {
    match count {
        1..=4 => Some(WizardStage::ConfirmStep),
        _ => None,
    }
}

/// Wizard session state. See the module docs for the transition table.
#[derive(Debug)]
pub struct WizardController {
    stage: WizardStage,
    mode: Option<WizardMode>,
    candidates: Vec<CompanyCandidate>,
    validation: Option<ValidationData>,
    brandboard: BrandboardData,
    review: ApprovalState,
    /// Confirmation screen that launched part-1 generation; back from
    /// part 1 returns here.
    entry_stage: WizardStage,
    epoch: u64,
    last_error: Option<String>,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self {
            stage: WizardStage::Home,
            mode: None,
            candidates: Vec::new(),
            validation: None,
            brandboard: BrandboardData::default(),
            review: ApprovalState::default(),
            entry_stage: WizardStage::ConfirmValidation,
            epoch: 0,
            last_error: None,
        }
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn mode(&self) -> Option<WizardMode> {
        self.mode
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn candidates(&self) -> &[CompanyCandidate] {
        &self.candidates
    }

    pub fn validation(&self) -> Option<&ValidationData> {
        self.validation.as_ref()
    }

    pub fn brandboard(&self) -> &BrandboardData {
        &self.brandboard
    }

    pub fn review(&self) -> &ApprovalState {
        &self.review
    }

    /// User-facing message recorded by the last safe reset.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Kind and data of the part currently on screen, when in ConfirmStep.
    pub fn current_part(&self) -> Option<(PartKind, &Map<String, Value>)> {
        if self.stage != WizardStage::ConfirmStep {
            return None;
        }
        self.brandboard.parts.last().map(|p| (p.kind, &p.data))
    }

    fn transition(&mut self, to: WizardStage) {
        debug!(from = ?self.stage, to = ?to, epoch = self.epoch + 1, "stage transition");
        self.stage = to;
        self.epoch += 1;
    }

    fn require(&self, expected: WizardStage, action: &'static str) -> Result<(), WizardError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(WizardError::InvalidStage {
                stage: self.stage,
                action,
            })
        }
    }

    // ------------------------------------------------------------------
    // Entry and form flow
    // ------------------------------------------------------------------

    pub fn begin(&mut self) -> Result<(), WizardError> {
        self.require(WizardStage::Home, "begin")?;
        self.transition(WizardStage::ChooseMode);
        Ok(())
    }

    pub fn choose_mode(&mut self, mode: WizardMode) -> Result<(), WizardError> {
        self.require(WizardStage::ChooseMode, "choose_mode")?;
        self.mode = Some(mode);
        self.last_error = None;
        self.transition(WizardStage::FormInput);
        Ok(())
    }

    pub fn begin_validation(&mut self) -> Result<(), WizardError> {
        self.require(WizardStage::FormInput, "begin_validation")?;
        self.transition(WizardStage::Validating);
        Ok(())
    }

    /// Apply the candidate search result.
    ///
    /// Zero candidates fail with `CompanyNotFound`. A single exact-in-city
    /// candidate auto-advances (the caller fetches its full info next).
    /// Anything else moves to SelectingCandidate for manual disambiguation.
    pub fn resolve_candidates(
        &mut self,
        mut candidates: Vec<CompanyCandidate>,
    ) -> Result<CandidateResolution, WizardError> {
        self.require(WizardStage::Validating, "resolve_candidates")?;
        if candidates.is_empty() {
            return Err(WizardError::CompanyNotFound);
        }
        if candidates.len() == 1 && candidates[0].match_type == MatchType::ExactInCity {
            return Ok(CandidateResolution::AutoSelected(candidates.remove(0)));
        }
        self.candidates = candidates;
        self.transition(WizardStage::SelectingCandidate);
        Ok(CandidateResolution::Choose)
    }

    pub fn pick_candidate(&mut self, id: &str) -> Result<CompanyCandidate, WizardError> {
        self.require(WizardStage::SelectingCandidate, "pick_candidate")?;
        let candidate = self
            .candidates
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(WizardError::CompanyNotFound)?;
        self.candidates.clear();
        self.transition(WizardStage::Validating);
        Ok(candidate)
    }

    /// Install the validated company identity (existing-company mode).
    pub fn set_validation_data(&mut self, data: ValidationData) -> Result<(), WizardError> {
        self.require(WizardStage::Validating, "set_validation_data")?;
        if data.company_name.trim().is_empty() {
            return Err(WizardError::CompanyNotFound);
        }
        self.validation = Some(data);
        self.transition(WizardStage::ConfirmValidation);
        Ok(())
    }

    /// Install the generated idea concept (new-idea mode).
    pub fn set_concept(&mut self, data: ValidationData) -> Result<(), WizardError> {
        self.require(WizardStage::Validating, "set_concept")?;
        if data.company_name.trim().is_empty() {
            return Err(WizardError::ExtractionFailed);
        }
        self.validation = Some(data);
        self.transition(WizardStage::ConfirmConcept);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Confirmation screens into generation
    // ------------------------------------------------------------------

    pub fn confirm_validation(&mut self, with_deep_analysis: bool) -> Result<(), WizardError> {
        self.require(WizardStage::ConfirmValidation, "confirm_validation")?;
        if !with_deep_analysis {
            self.entry_stage = WizardStage::ConfirmValidation;
        }
        self.transition(WizardStage::Generating);
        Ok(())
    }

    /// Attach the uploaded-logo reference and its analysis to the validated
    /// identity. Legal while confirming or generating, where the analysis
    /// runs.
    pub fn set_logo_analysis(
        &mut self,
        reference: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), WizardError> {
        if !matches!(
            self.stage,
            WizardStage::Generating | WizardStage::ConfirmValidation
        ) {
            return Err(WizardError::InvalidStage {
                stage: self.stage,
                action: "set_logo_analysis",
            });
        }
        if let Some(validation) = self.validation.as_mut() {
            validation.logo_url = Some(reference.into());
            validation.logo_analysis = Some(text.into());
        }
        Ok(())
    }

    /// Deep analysis only exists in existing-company mode.
    pub fn set_deep_analysis(&mut self, analysis: DeepAnalysis) -> Result<(), WizardError> {
        self.require(WizardStage::Generating, "set_deep_analysis")?;
        if self.mode != Some(WizardMode::ExistingCompany) {
            return Err(WizardError::InvalidStage {
                stage: self.stage,
                action: "set_deep_analysis",
            });
        }
        let validation = self.validation.as_mut().ok_or(WizardError::InvalidStage {
            stage: WizardStage::Generating,
            action: "set_deep_analysis",
        })?;
        validation.deep_analysis = Some(analysis);
        self.transition(WizardStage::ConfirmAnalysis);
        Ok(())
    }

    pub fn confirm_analysis(&mut self) -> Result<(), WizardError> {
        self.require(WizardStage::ConfirmAnalysis, "confirm_analysis")?;
        self.entry_stage = WizardStage::ConfirmAnalysis;
        self.transition(WizardStage::Generating);
        Ok(())
    }

    pub fn confirm_concept(&mut self) -> Result<(), WizardError> {
        self.require(WizardStage::ConfirmConcept, "confirm_concept")?;
        self.entry_stage = WizardStage::ConfirmConcept;
        self.transition(WizardStage::Generating);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Part generation and review
    // ------------------------------------------------------------------

    /// Install a freshly generated part and move to its review screen.
    /// Approval state resets because the displayed part changed.
    pub fn push_part(&mut self, data: Map<String, Value>) -> Result<PartKind, WizardError> {
        self.require(WizardStage::Generating, "push_part")?;
        let kind = self.brandboard.push(data).ok_or(WizardError::InvalidStage {
            stage: WizardStage::Generating,
            action: "push_part",
        })?;
        self.review.reset();
        let stage = confirm_stage_for_parts(self.brandboard.part_count())
            .expect("push keeps part count in 1..=4");
        self.transition(stage);
        Ok(kind)
    }

    /// Confirm the reviewed part. Fails with the outstanding topic labels
    /// while any present topic is unapproved. On success the stage moves to
    /// Generating and the next part kind is returned, or None when part 4
    /// was confirmed and only final assembly remains.
    pub fn confirm_part(&mut self) -> Result<Option<PartKind>, WizardError> {
        self.require(WizardStage::ConfirmStep, "confirm_part")?;
        let (kind, data) = self
            .current_part()
            .ok_or(WizardError::InvalidStage {
                stage: WizardStage::ConfirmStep,
                action: "confirm_part",
            })?;
        let pending = self.review.pending_topics(kind, data);
        if !pending.is_empty() {
            return Err(WizardError::TopicsPending {
                labels: pending.iter().map(|t| t.label.to_string()).collect(),
            });
        }
        self.transition(WizardStage::Generating);
        Ok(self.brandboard.next_kind())
    }

    /// All four parts confirmed and final assembly done.
    pub fn finish(&mut self) -> Result<(), WizardError> {
        self.require(WizardStage::Generating, "finish")?;
        if self.brandboard.part_count() != PartKind::ALL.len() {
            return Err(WizardError::InvalidStage {
                stage: WizardStage::Generating,
                action: "finish",
            });
        }
        self.transition(WizardStage::FinalDisplay);
        Ok(())
    }

    /// Remove the newest part and step back to the previous review screen,
    /// or to the confirmation screen that preceded part 1.
    pub fn go_back(&mut self) -> Result<(), WizardError> {
        self.require(WizardStage::ConfirmStep, "go_back")?;
        self.brandboard.pop();
        self.review.reset();
        match confirm_stage_for_parts(self.brandboard.part_count()) {
            Some(stage) => self.transition(stage),
            None => self.transition(self.entry_stage),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Topic-level review operations
    // ------------------------------------------------------------------

    /// Manual edit of a topic's working value on the current part.
    pub fn update_topic(&mut self, key: &str, value: Value) -> Result<(), WizardError> {
        self.require(WizardStage::ConfirmStep, "update_topic")?;
        let part = self.brandboard.parts.last_mut().ok_or(WizardError::InvalidStage {
            stage: WizardStage::ConfirmStep,
            action: "update_topic",
        })?;
        part.data.insert(key.to_string(), value);
        Ok(())
    }

    /// Toggle approval of a topic. On the false→true transition, returns a
    /// refinement job for the downstream unapproved topics when any exist.
    /// Topics absent from the data are ignored.
    pub fn approve(&mut self, key: &str) -> Result<Option<RefinementJob>, WizardError> {
        self.require(WizardStage::ConfirmStep, "approve")?;
        let (kind, data) = match self.current_part() {
            Some((kind, data)) if data.contains_key(key) => (kind, data.clone()),
            _ => return Ok(None),
        };
        if !self.review.toggle(key) {
            return Ok(None);
        }
        let targets = self.review.cascade_targets(kind, &data, key);
        if targets.is_empty() {
            return Ok(None);
        }
        Ok(Some(RefinementJob {
            epoch: self.epoch,
            part: kind,
            context: self.refinement_context(),
            approved_key: key.to_string(),
            approved_value: data.get(key).cloned().unwrap_or(Value::Null),
            targets,
        }))
    }

    /// Approve every present topic without triggering refinement.
    pub fn approve_all(&mut self) -> Result<(), WizardError> {
        self.require(WizardStage::ConfirmStep, "approve_all")?;
        if let Some((kind, data)) = self.current_part() {
            let data = data.clone();
            self.review.approve_all(kind, &data);
        }
        Ok(())
    }

    pub fn set_comment(&mut self, key: &str, text: impl Into<String>) -> Result<(), WizardError> {
        self.require(WizardStage::ConfirmStep, "set_comment")?;
        self.review.set_comment(key, text);
        Ok(())
    }

    /// Build the rewrite request for a topic. Requires a non-empty comment.
    pub fn regenerate_request(&mut self, key: &str) -> Result<RegenerateJob, WizardError> {
        self.require(WizardStage::ConfirmStep, "regenerate")?;
        let comment = self
            .review
            .comment(key)
            .map(str::to_string)
            .ok_or_else(|| WizardError::CommentRequired(key.to_string()))?;
        let (kind, data) = self.current_part().ok_or(WizardError::InvalidStage {
            stage: WizardStage::ConfirmStep,
            action: "regenerate",
        })?;
        Ok(RegenerateJob {
            part: kind,
            key: key.to_string(),
            current: data.get(key).cloned().unwrap_or(Value::Null),
            comment,
        })
    }

    /// Install a rewritten value for a topic (regenerate success path).
    pub fn replace_topic(&mut self, key: &str, value: Value) -> Result<(), WizardError> {
        self.update_topic(key, value)
    }

    /// Full accumulated brand context for refinement prompts: the validated
    /// company identity plus every generated part, current edits included.
    fn refinement_context(&self) -> Value {
        let mut context = Map::new();
        if let Some(validation) = &self.validation {
            if let Ok(value) = serde_json::to_value(validation) {
                context.insert("company".to_string(), value);
            }
        }
        context.insert("brandboard".to_string(), self.brandboard.context_value());
        Value::Object(context)
    }

    /// Merge resolved refinement values into the current part.
    ///
    /// Applies only when the wizard is still reviewing the same part under
    /// the same epoch; a stale result is dropped and `false` returned. Only
    /// the targeted topics are written, so concurrent manual edits to other
    /// topics survive (last-write-wins inside the target set).
    pub fn merge_refinement(&mut self, epoch: u64, values: Map<String, Value>) -> bool {
        if self.stage != WizardStage::ConfirmStep || epoch != self.epoch {
            debug!(job_epoch = epoch, current = self.epoch, "discarding stale refinement");
            return false;
        }
        let Some(part) = self.brandboard.parts.last_mut() else {
            return false;
        };
        for (key, value) in values {
            if part.kind.topic(&key).is_some() {
                part.data.insert(key, value);
            }
        }
        true
    }

    /// Known-safe reset after a failed stage-advancing generation: record
    /// the message, discard the attempt's accumulated data, return to mode
    /// selection. The epoch bump invalidates any still-outstanding async
    /// results.
    pub fn fail_to_safe(&mut self, error: &WizardError) {
        self.last_error = Some(error.to_string());
        self.mode = None;
        self.candidates.clear();
        self.validation = None;
        self.brandboard = BrandboardData::default();
        self.review.reset();
        self.transition(WizardStage::ChooseMode);
    }
}
