//! Error types for the brandboard wizard core.

use thiserror::Error;

use crate::wizard::types::WizardStage;

/// Error taxonomy for wizard operations.
///
/// The fatal variants (`CompanyNotFound`, `ExtractionFailed`,
/// `MalformedModelOutput`, `Generation`) abort the current stage and reset
/// the wizard to mode selection. `RefinementFailed` and
/// `ImageGenerationFailed` are logged and never surface to the user.
/// `AuthFailed` / `PersistenceFailed` surface a message without disturbing
/// in-progress wizard state.
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("No matching company found")]
    CompanyNotFound,

    #[error("Could not extract the required fields from the model response")]
    ExtractionFailed,

    #[error("Model returned malformed output: {preview}")]
    MalformedModelOutput { preview: String },

    #[error("Refinement request failed: {0}")]
    RefinementFailed(String),

    #[error("Image generation failed: {0}")]
    ImageGenerationFailed(String),

    #[error("Not authenticated")]
    AuthFailed,

    #[error("Failed to persist project: {0}")]
    PersistenceFailed(String),

    #[error("Generation request failed: {0}")]
    Generation(String),

    #[error("Action '{action}' is not allowed in stage {stage:?}")]
    InvalidStage {
        stage: WizardStage,
        action: &'static str,
    },

    #[error("Topics still pending approval: {}", labels.join(", "))]
    TopicsPending { labels: Vec<String> },

    #[error("A comment is required to regenerate '{0}'")]
    CommentRequired(String),
}

impl WizardError {
    /// Whether this error aborts the current attempt and resets the wizard
    /// to mode selection.
    pub fn is_fatal_to_attempt(&self) -> bool {
        matches!(
            self,
            WizardError::CompanyNotFound
                | WizardError::ExtractionFailed
                | WizardError::MalformedModelOutput { .. }
                | WizardError::Generation(_)
        )
    }
}

/// Result type alias using WizardError.
pub type Result<T> = std::result::Result<T, WizardError>;
