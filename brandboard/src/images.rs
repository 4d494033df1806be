//! Image generation adjuncts.
//!
//! Three image side effects attach to workflow milestones: an archetype
//! illustration after part 1 is confirmed, up to three style photos after
//! part 3, and one portrait per persona after part 4. Every failure is
//! caught independently and degrades to "no image"; the workflow never
//! aborts because of an image.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::WizardError;

/// Upper bound on style photos generated after the visual part.
pub const STYLE_PHOTO_CAP: usize = 3;

/// Selects the fixed style-prefix template applied to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Logo,
    Moodboard,
    Persona,
    Archetype,
}

impl ImageKind {
    pub fn style_prefix(self) -> &'static str {
        match self {
            ImageKind::Logo => "Logotipo vetorial minimalista, fundo branco, alta resolução: ",
            ImageKind::Moodboard => {
                "Fotografia editorial de moodboard, luz natural, composição limpa: "
            }
            ImageKind::Persona => "Retrato fotográfico realista, enquadramento de busto, luz suave: ",
            ImageKind::Archetype => {
                "Ilustração conceitual de arquétipo de marca, estilo editorial: "
            }
        }
    }
}

/// Image asset boundary. The prompt already carries the kind's style
/// prefix; the kind is passed through so backends can pick per-kind
/// parameters. Returns raw image bytes.
#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate_image(&self, prompt: &str, kind: ImageKind) -> Result<Vec<u8>, WizardError>;
}

fn topic_text(data: &Map<String, Value>, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Archetype illustration for the confirmed core part.
pub async fn archetype_illustration(
    client: &dyn ImageClient,
    core: &Map<String, Value>,
) -> Option<Vec<u8>> {
    let archetype = topic_text(core, "archetype");
    if archetype.is_empty() {
        return None;
    }
    let prompt = format!(
        "{}arquétipo da marca: {}",
        ImageKind::Archetype.style_prefix(),
        archetype
    );
    match client.generate_image(&prompt, ImageKind::Archetype).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(error = %e, "archetype illustration failed");
            None
        }
    }
}

/// Up to [`STYLE_PHOTO_CAP`] style photos for the confirmed visual part.
/// Failed photos are logged and skipped individually.
pub async fn style_photos(
    client: &dyn ImageClient,
    visual: &Map<String, Value>,
) -> Vec<Vec<u8>> {
    let style = topic_text(visual, "photographyStyle");
    let palette = topic_text(visual, "colorPalette");
    let mut photos = Vec::new();
    for n in 1..=STYLE_PHOTO_CAP {
        let prompt = format!(
            "{}cena {} no estilo fotográfico da marca: {}. Paleta: {}",
            ImageKind::Moodboard.style_prefix(),
            n,
            style,
            palette
        );
        match client.generate_image(&prompt, ImageKind::Moodboard).await {
            Ok(bytes) => photos.push(bytes),
            Err(e) => warn!(photo = n, error = %e, "style photo failed"),
        }
    }
    photos
}

/// One portrait per persona in the confirmed channel part. Personas whose
/// portrait fails keep a `None` placeholder.
pub async fn persona_portraits(
    client: &dyn ImageClient,
    channel: &Map<String, Value>,
) -> Vec<(String, Option<Vec<u8>>)> {
    let Some(Value::Array(personas)) = channel.get("personas") else {
        return Vec::new();
    };
    let mut portraits = Vec::new();
    for persona in personas {
        let name = persona
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("persona")
            .to_string();
        let subject = persona
            .get("imagePrompt")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| persona.to_string());
        let prompt = format!("{}{}", ImageKind::Persona.style_prefix(), subject);
        let image = match client.generate_image(&prompt, ImageKind::Persona).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(persona = %name, error = %e, "persona portrait failed");
                None
            }
        };
        portraits.push((name, image));
    }
    portraits
}
