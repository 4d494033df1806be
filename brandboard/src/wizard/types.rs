//! Data model for the brandboard wizard.
//!
//! Everything here is plain session state owned by the controller: wizard
//! stages, form inputs, company candidates, the validated company identity,
//! and the accumulated brandboard parts. Nothing persists until an explicit
//! save goes through the storage boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Stages and modes
// ============================================================================

/// Wizard stage. Exactly one is active at a time; transitions happen only
/// through [`WizardController`](super::controller::WizardController) methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStage {
    Home,
    ChooseMode,
    FormInput,
    Validating,
    SelectingCandidate,
    ConfirmValidation,
    ConfirmConcept,
    Generating,
    ConfirmAnalysis,
    ConfirmStep,
    FinalDisplay,
}

/// How the wizard was entered: a brand-new idea or an existing company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    NewIdea,
    ExistingCompany,
}

// ============================================================================
// Form inputs
// ============================================================================

/// Existing-company form: the search key for candidate resolution.
#[derive(Debug, Clone, Default)]
pub struct CompanyForm {
    pub name: String,
    pub city: String,
}

/// New-idea form.
#[derive(Debug, Clone, Default)]
pub struct IdeaForm {
    pub name: String,
    pub description: String,
    pub target_audience: String,
}

// ============================================================================
// Candidate resolution
// ============================================================================

/// How closely a search result matched the requested company.
///
/// Drives auto-accept vs. disambiguation: a single `ExactInCity` candidate
/// advances without showing the selection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    #[serde(rename = "EXACT_IN_CITY")]
    ExactInCity,
    #[serde(rename = "CORRECT_NAME_OTHER_CITY")]
    CorrectNameOtherCity,
    #[serde(rename = "SUGGESTION")]
    Suggestion,
}

/// Ephemeral search result awaiting disambiguation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCandidate {
    pub id: String,
    pub company_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub description: String,
    pub match_type: MatchType,
}

// ============================================================================
// Validated company identity
// ============================================================================

/// Citation attached to a grounded generation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// Deep-analysis result: free text plus the web sources it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepAnalysis {
    pub text: String,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}

/// Company identity bundle, created once a candidate or idea concept is
/// resolved. `company_name` is the identity key and must never become empty
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationData {
    pub company_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub website: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    #[serde(default)]
    pub social_links: String,

    /// Reputation / reviews summary.
    #[serde(default)]
    pub reputation: String,

    #[serde(default)]
    pub instagram_stats: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_analysis: Option<DeepAnalysis>,

    /// Analysis of an uploaded logo, when the user provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_analysis: Option<String>,
}

impl ValidationData {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            description: String::new(),
            address: String::new(),
            website: String::new(),
            logo_url: None,
            social_links: String::new(),
            reputation: String::new(),
            instagram_stats: String::new(),
            deep_analysis: None,
            logo_analysis: None,
        }
    }
}

// ============================================================================
// Brandboard parts and topics
// ============================================================================

/// A named, independently approvable unit of generated content within a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub key: &'static str,
    pub label: &'static str,
}

const CORE_TOPICS: &[Topic] = &[
    Topic { key: "mission", label: "Missão" },
    Topic { key: "vision", label: "Visão" },
    Topic { key: "values", label: "Valores" },
    Topic { key: "positioning", label: "Posicionamento" },
    Topic { key: "archetype", label: "Arquétipo" },
];

const VOICE_TOPICS: &[Topic] = &[
    Topic { key: "toneOfVoice", label: "Tom de Voz" },
    Topic { key: "personality", label: "Personalidade" },
    Topic { key: "keywords", label: "Palavras-chave" },
    Topic { key: "tagline", label: "Slogan" },
];

const VISUAL_TOPICS: &[Topic] = &[
    Topic { key: "colorPalette", label: "Paleta de Cores" },
    Topic { key: "typography", label: "Tipografia" },
    Topic { key: "visualElements", label: "Elementos Visuais" },
    Topic { key: "photographyStyle", label: "Estilo de Fotografia" },
];

const CHANNEL_TOPICS: &[Topic] = &[
    Topic { key: "channels", label: "Canais" },
    Topic { key: "contentPillars", label: "Pilares de Conteúdo" },
    Topic { key: "personas", label: "Personas" },
    Topic { key: "postingCadence", label: "Frequência de Postagem" },
];

/// One of the four fixed generation stages of the brandboard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Core,
    Voice,
    Visual,
    Channel,
}

impl PartKind {
    pub const ALL: [PartKind; 4] = [
        PartKind::Core,
        PartKind::Voice,
        PartKind::Visual,
        PartKind::Channel,
    ];

    /// 1-based part number.
    pub fn number(self) -> usize {
        match self {
            PartKind::Core => 1,
            PartKind::Voice => 2,
            PartKind::Visual => 3,
            PartKind::Channel => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PartKind::Core => "Essência da Marca",
            PartKind::Voice => "Voz da Marca",
            PartKind::Visual => "Identidade Visual",
            PartKind::Channel => "Estratégia de Canais",
        }
    }

    /// Approvable topics declared for this part, in approval order.
    ///
    /// Approval is directional: approving an earlier topic may refine later
    /// ones, never the reverse.
    pub fn topics(self) -> &'static [Topic] {
        match self {
            PartKind::Core => CORE_TOPICS,
            PartKind::Voice => VOICE_TOPICS,
            PartKind::Visual => VISUAL_TOPICS,
            PartKind::Channel => CHANNEL_TOPICS,
        }
    }

    pub fn topic(self, key: &str) -> Option<Topic> {
        self.topics().iter().copied().find(|t| t.key == key)
    }
}

/// One generated chunk of the brandboard. Topic values are kept as loose
/// JSON so approval can key off topic presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandPart {
    pub kind: PartKind,
    pub data: Map<String, Value>,
}

/// Ordered collection of generated parts. A part exists only after its
/// generation stage completes, and the current part number is always
/// derived from `parts.len()` and never stored separately.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandboardData {
    pub parts: Vec<BrandPart>,
}

impl BrandboardData {
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Kind of the next part to generate, or None when all four exist.
    pub fn next_kind(&self) -> Option<PartKind> {
        PartKind::ALL.get(self.parts.len()).copied()
    }

    /// Kind of the most recently generated part.
    pub fn current_kind(&self) -> Option<PartKind> {
        self.parts.last().map(|p| p.kind)
    }

    /// Append the next part in fixed order. Returns the kind it was stored
    /// as, or None when the board is already complete.
    pub fn push(&mut self, data: Map<String, Value>) -> Option<PartKind> {
        let kind = self.next_kind()?;
        self.parts.push(BrandPart { kind, data });
        Some(kind)
    }

    pub fn pop(&mut self) -> Option<BrandPart> {
        self.parts.pop()
    }

    pub fn part(&self, kind: PartKind) -> Option<&BrandPart> {
        self.parts.iter().find(|p| p.kind == kind)
    }

    /// Full accumulated context as a JSON object keyed by part name. The
    /// last part's in-progress edits are included because parts are mutated
    /// in place.
    pub fn context_value(&self) -> Value {
        let mut out = Map::new();
        for part in &self.parts {
            let name = match part.kind {
                PartKind::Core => "core",
                PartKind::Voice => "voice",
                PartKind::Visual => "visual",
                PartKind::Channel => "channel",
            };
            out.insert(name.to_string(), Value::Object(part.data.clone()));
        }
        Value::Object(out)
    }
}
