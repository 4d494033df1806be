//! Parsing tests against realistic model responses

use brandboard::error::WizardError;
use brandboard::parser::{parse_company_info, parse_fenced, strip_thinking_lines};
use brandboard::wizard::{CompanyCandidate, MatchType};

use super::common::{company_info_response, exact_candidate_response, two_candidate_response};

#[test]
fn test_candidate_array_with_surrounding_prose() {
    let candidates: Vec<CompanyCandidate> =
        parse_fenced(&exact_candidate_response()).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].company_name, "Padaria Sol");
    assert_eq!(candidates[0].match_type, MatchType::ExactInCity);
}

#[test]
fn test_candidate_array_with_missing_optional_fields() {
    let candidates: Vec<CompanyCandidate> = parse_fenced(&two_candidate_response()).unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(candidates[0].website_url.is_empty());
    assert_eq!(candidates[1].match_type, MatchType::CorrectNameOtherCity);
}

#[test]
fn test_company_info_full_response() {
    let info = parse_company_info(&company_info_response("Padaria Sol")).unwrap();
    assert_eq!(info.name, "Padaria Sol");
    assert_eq!(info.website, "https://padariasol.com.br");
    // multi-line field spans until the next label
    assert!(info.reviews_summary.contains("Nota média 4,8"));
    assert!(info.reviews_summary.contains("atendimento"));
    assert_eq!(info.instagram_stats, "12 mil seguidores");
}

#[test]
fn test_company_info_with_thinking_lines() {
    let raw = format!(
        "[pensando] pesquisando a empresa\n{}\n[pensando] finalizando",
        company_info_response("Padaria Sol")
    );
    let (body, thoughts) = strip_thinking_lines(&raw);
    assert_eq!(thoughts, vec!["pesquisando a empresa", "finalizando"]);
    let info = parse_company_info(&body).unwrap();
    assert_eq!(info.name, "Padaria Sol");
}

#[test]
fn test_not_found_name_maps_to_company_not_found() {
    let raw = "Nome da Empresa: Não encontrado\nDescrição: uma padaria qualquer";
    let err = parse_company_info(raw).unwrap_err();
    assert!(matches!(err, WizardError::CompanyNotFound));
}

#[test]
fn test_unusable_text_is_extraction_failure() {
    let err = parse_company_info("O modelo divagou sem nenhum rótulo.").unwrap_err();
    assert!(matches!(err, WizardError::ExtractionFailed));
}

#[test]
fn test_malformed_candidates_keep_a_preview() {
    let err = parse_fenced::<Vec<CompanyCandidate>>("```json\nnada estruturado aqui")
        .unwrap_err();
    let WizardError::MalformedModelOutput { preview } = err else {
        panic!("expected MalformedModelOutput");
    };
    assert!(preview.contains("nada"));
}
