//! Stage transition and guard tests for the wizard controller

use serde_json::{json, Map};

use brandboard::error::WizardError;
use brandboard::wizard::{
    CandidateResolution, MatchType, PartKind, ValidationData, WizardController, WizardMode,
    WizardStage,
};

use super::common::{candidate, part_data};

fn controller_at_validating(mode: WizardMode) -> WizardController {
    let mut controller = WizardController::new();
    controller.begin().unwrap();
    controller.choose_mode(mode).unwrap();
    controller.begin_validation().unwrap();
    controller
}

fn controller_at_first_part() -> WizardController {
    let mut controller = controller_at_validating(WizardMode::ExistingCompany);
    controller
        .set_validation_data(ValidationData::new("Padaria Sol"))
        .unwrap();
    controller.confirm_validation(false).unwrap();
    controller.push_part(part_data(PartKind::Core)).unwrap();
    controller
}

// ============================================================================
// Validation flow
// ============================================================================

#[test]
fn test_happy_path_reaches_final_display() {
    let mut controller = controller_at_first_part();
    for expected_next in [Some(PartKind::Voice), Some(PartKind::Visual), Some(PartKind::Channel)] {
        controller.approve_all().unwrap();
        let next = controller.confirm_part().unwrap();
        assert_eq!(next, expected_next);
        controller.push_part(part_data(next.unwrap())).unwrap();
    }
    controller.approve_all().unwrap();
    assert_eq!(controller.confirm_part().unwrap(), None);
    controller.finish().unwrap();
    assert_eq!(controller.stage(), WizardStage::FinalDisplay);
}

#[test]
fn test_duplicate_submission_is_rejected() {
    let mut controller = controller_at_validating(WizardMode::ExistingCompany);
    let err = controller.begin_validation().unwrap_err();
    assert!(matches!(
        err,
        WizardError::InvalidStage {
            stage: WizardStage::Validating,
            action: "begin_validation"
        }
    ));
}

#[test]
fn test_empty_candidate_list_is_company_not_found() {
    let mut controller = controller_at_validating(WizardMode::ExistingCompany);
    let err = controller.resolve_candidates(Vec::new()).unwrap_err();
    assert!(matches!(err, WizardError::CompanyNotFound));
}

#[test]
fn test_single_exact_candidate_skips_selection() {
    let mut controller = controller_at_validating(WizardMode::ExistingCompany);
    let resolution = controller
        .resolve_candidates(vec![candidate("1", "Padaria Sol", MatchType::ExactInCity)])
        .unwrap();
    assert!(matches!(resolution, CandidateResolution::AutoSelected(c) if c.id == "1"));
    assert_eq!(controller.stage(), WizardStage::Validating);
}

#[test]
fn test_multiple_candidates_require_selection() {
    let mut controller = controller_at_validating(WizardMode::ExistingCompany);
    let resolution = controller
        .resolve_candidates(vec![
            candidate("1", "Padaria Sol", MatchType::ExactInCity),
            candidate("2", "Padaria do Sol", MatchType::CorrectNameOtherCity),
        ])
        .unwrap();
    assert!(matches!(resolution, CandidateResolution::Choose));
    assert_eq!(controller.stage(), WizardStage::SelectingCandidate);

    let err = controller.pick_candidate("99").unwrap_err();
    assert!(matches!(err, WizardError::CompanyNotFound));

    let picked = controller.pick_candidate("2").unwrap();
    assert_eq!(picked.company_name, "Padaria do Sol");
    assert_eq!(controller.stage(), WizardStage::Validating);
    assert!(controller.candidates().is_empty());
}

#[test]
fn test_deep_analysis_rejected_in_new_idea_mode() {
    let mut controller = controller_at_validating(WizardMode::NewIdea);
    controller
        .set_concept(ValidationData::new("Verde Vivo"))
        .unwrap();
    controller.confirm_concept().unwrap();
    let err = controller
        .set_deep_analysis(brandboard::wizard::DeepAnalysis {
            text: "análise".to_string(),
            sources: Vec::new(),
        })
        .unwrap_err();
    assert!(matches!(err, WizardError::InvalidStage { .. }));
}

// ============================================================================
// Part review
// ============================================================================

#[test]
fn test_confirm_blocked_while_topics_pending() {
    let mut controller = controller_at_first_part();
    controller.approve("mission").unwrap();
    let err = controller.confirm_part().unwrap_err();
    let WizardError::TopicsPending { labels } = err else {
        panic!("expected TopicsPending");
    };
    assert!(labels.contains(&"Visão".to_string()));
    assert!(!labels.contains(&"Missão".to_string()));
}

#[test]
fn test_go_back_from_first_part_returns_to_entry() {
    let mut controller = controller_at_first_part();
    controller.go_back().unwrap();
    assert_eq!(controller.stage(), WizardStage::ConfirmValidation);
    assert_eq!(controller.brandboard().part_count(), 0);
}

#[test]
fn test_go_back_from_second_part_returns_to_first() {
    let mut controller = controller_at_first_part();
    controller.approve_all().unwrap();
    controller.confirm_part().unwrap();
    controller.push_part(part_data(PartKind::Voice)).unwrap();

    controller.go_back().unwrap();
    assert_eq!(controller.stage(), WizardStage::ConfirmStep);
    assert_eq!(controller.brandboard().current_kind(), Some(PartKind::Core));
    // approvals of the re-displayed part start over
    assert!(!controller.review().is_approved("mission"));
}

#[test]
fn test_approve_emits_forward_refinement_job() {
    let mut controller = controller_at_first_part();
    let job = controller.approve("mission").unwrap().expect("job expected");
    assert_eq!(job.approved_key, "mission");
    assert!(job.targets.contains_key("vision"));
    assert!(job.targets.contains_key("archetype"));
    assert!(!job.targets.contains_key("mission"));

    // approving the last topic has nothing downstream
    assert!(controller.approve("archetype").unwrap().is_none());
}

#[test]
fn test_approve_unknown_topic_is_a_noop() {
    let mut controller = controller_at_first_part();
    assert!(controller.approve("inexistente").unwrap().is_none());
    assert!(!controller.review().is_approved("inexistente"));
}

#[test]
fn test_regenerate_requires_comment() {
    let mut controller = controller_at_first_part();
    let err = controller.regenerate_request("mission").unwrap_err();
    assert!(matches!(err, WizardError::CommentRequired(_)));

    controller.set_comment("mission", "mais ousada").unwrap();
    let job = controller.regenerate_request("mission").unwrap();
    assert_eq!(job.comment, "mais ousada");
    assert_eq!(job.part, PartKind::Core);
}

// ============================================================================
// Refinement merge and epochs
// ============================================================================

#[test]
fn test_merge_applies_only_declared_topics() {
    let mut controller = controller_at_first_part();
    let job = controller.approve("mission").unwrap().unwrap();

    let mut values = Map::new();
    values.insert("vision".to_string(), json!("visão refinada"));
    values.insert("intruso".to_string(), json!("nunca"));
    assert!(controller.merge_refinement(job.epoch, values));

    let (_, data) = controller.current_part().unwrap();
    assert_eq!(data.get("vision"), Some(&json!("visão refinada")));
    assert!(data.get("intruso").is_none());
}

#[test]
fn test_merge_dropped_after_part_changes() {
    let mut controller = controller_at_first_part();
    let job = controller.approve("mission").unwrap().unwrap();

    controller.approve_all().unwrap();
    controller.confirm_part().unwrap();
    controller.push_part(part_data(PartKind::Voice)).unwrap();

    let mut values = Map::new();
    values.insert("vision".to_string(), json!("tarde demais"));
    assert!(!controller.merge_refinement(job.epoch, values));
    let (kind, data) = controller.current_part().unwrap();
    assert_eq!(kind, PartKind::Voice);
    assert!(data.get("vision").is_none());
}

#[test]
fn test_merge_dropped_after_go_back() {
    let mut controller = controller_at_first_part();
    let job = controller.approve("mission").unwrap().unwrap();
    controller.go_back().unwrap();

    let mut values = Map::new();
    values.insert("vision".to_string(), json!("descartado"));
    assert!(!controller.merge_refinement(job.epoch, values));
}

// ============================================================================
// Safe reset
// ============================================================================

#[test]
fn test_fail_to_safe_discards_the_attempt() {
    let mut controller = controller_at_first_part();
    controller.fail_to_safe(&WizardError::Generation("timeout".to_string()));

    assert_eq!(controller.stage(), WizardStage::ChooseMode);
    assert!(controller.mode().is_none());
    assert!(controller.validation().is_none());
    assert_eq!(controller.brandboard().part_count(), 0);
    assert!(controller.last_error().unwrap().contains("timeout"));

    // the wizard is usable again from mode selection
    controller.choose_mode(WizardMode::NewIdea).unwrap();
    assert!(controller.last_error().is_none());
}
