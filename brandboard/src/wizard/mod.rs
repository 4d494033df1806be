//! The brandboard wizard: state machine, approval protocol and the async
//! session that drives them.

pub mod approval;
pub mod controller;
pub mod session;
pub mod types;

pub use approval::{ApprovalState, RefinementJob, RegenerateJob};
pub use controller::{confirm_stage_for_parts, CandidateResolution, WizardController};
pub use session::{ConfirmOptions, SessionArtifacts, WizardSession};
pub use types::{
    BrandPart, BrandboardData, CompanyCandidate, CompanyForm, DeepAnalysis, GroundingSource,
    IdeaForm, MatchType, PartKind, Topic, ValidationData, WizardMode, WizardStage,
};
