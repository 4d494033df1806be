//! Line-oriented extraction of the free-text "full company info" response.
//!
//! The model answers with labeled lines (`Endereço: Rua X, 123`), sometimes
//! bulleted, in any casing. Reviews, social links and Instagram stats come
//! back as blocks spanning until the next recognized label. A literal
//! "Não encontrado" means the model looked and found nothing.

use regex::Regex;

use crate::error::WizardError;

/// Sentence the model uses for a field it could not find.
const NOT_FOUND: &str = "não encontrado";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Description,
    Address,
    Website,
    Reviews,
    SocialLinks,
    InstagramStats,
}

/// Label pattern fragments, matched case-insensitively after an optional
/// bullet marker. Multi-line fields capture until the next recognized
/// label or end of text.
const FIELDS: &[(Field, &str, bool)] = &[
    (Field::Name, r"Nome da Empresa", false),
    (Field::Description, r"Descrição", false),
    (Field::Address, r"Endereço", false),
    (Field::Website, r"(?:Website|Site)", false),
    (Field::Reviews, r"Resumo de Avaliações", true),
    (Field::SocialLinks, r"Redes Sociais", true),
    (Field::InstagramStats, r"Estatísticas do Instagram", true),
];

/// Structured result of the full-company-info extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyInfo {
    pub name: String,
    pub description: String,
    pub address: String,
    pub website: String,
    pub reviews_summary: String,
    pub social_links: String,
    pub instagram_stats: String,
}

fn normalize(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.to_lowercase() == NOT_FOUND {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Parse the free-text company info response.
///
/// A missing or not-found company name with a usable description means the
/// search resolved nothing canonical (`CompanyNotFound`); missing name and
/// description together means the text is unusable (`ExtractionFailed`).
pub fn parse_company_info(text: &str) -> Result<CompanyInfo, WizardError> {
    let patterns: Vec<(Field, Regex, bool)> = FIELDS
        .iter()
        .map(|(field, label, multiline)| {
            let pattern = format!(r"(?i)^[\s\-\*•]*(?:{})\s*:\s*(.*)$", label);
            (
                *field,
                Regex::new(&pattern).expect("field label patterns are static"),
                *multiline,
            )
        })
        .collect();

    let lines: Vec<&str> = text.lines().collect();

    // First pass: which line starts which field, plus the inline remainder.
    let mut markers: Vec<(usize, Field, bool, String)> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        for (field, regex, multiline) in &patterns {
            if let Some(captures) = regex.captures(line) {
                let inline = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                markers.push((idx, *field, *multiline, inline.to_string()));
                break;
            }
        }
    }

    let mut info = CompanyInfo::default();
    for (pos, (line_idx, field, multiline, inline)) in markers.iter().enumerate() {
        let value = if *multiline {
            // Span from the label to the next recognized label or EOF.
            let end = markers
                .get(pos + 1)
                .map(|(next_idx, ..)| *next_idx)
                .unwrap_or(lines.len());
            let mut span = vec![inline.as_str()];
            span.extend(&lines[line_idx + 1..end]);
            normalize(span.join("\n").trim())
        } else {
            normalize(inline)
        };

        let slot = match field {
            Field::Name => &mut info.name,
            Field::Description => &mut info.description,
            Field::Address => &mut info.address,
            Field::Website => &mut info.website,
            Field::Reviews => &mut info.reviews_summary,
            Field::SocialLinks => &mut info.social_links,
            Field::InstagramStats => &mut info.instagram_stats,
        };
        if slot.is_empty() {
            *slot = value;
        }
    }

    if info.name.is_empty() && info.description.is_empty() {
        return Err(WizardError::ExtractionFailed);
    }
    if info.name.is_empty() {
        return Err(WizardError::CompanyNotFound);
    }
    Ok(info)
}
