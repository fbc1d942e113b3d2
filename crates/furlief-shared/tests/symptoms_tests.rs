//! Tests for the symptom checker thresholds.

use furlief_shared::symptoms::{
    assess_symptoms, classify_symptoms, parse_selection, SeverityWeight, SymptomId, SymptomTier,
    CATALOG,
};
use std::collections::BTreeSet;

fn select(ids: &[SymptomId]) -> BTreeSet<SymptomId> {
    ids.iter().copied().collect()
}

#[test]
fn test_empty_selection_is_low() {
    assert_eq!(classify_symptoms(&BTreeSet::new()), SymptomTier::Low);
}

#[test]
fn test_any_severe_symptom_is_high() {
    for symptom in CATALOG.iter().filter(|s| s.severity == SeverityWeight::Severe) {
        assert_eq!(classify_symptoms(&select(&[symptom.id])), SymptomTier::High, "{}", symptom.id);
        assert_eq!(
            classify_symptoms(&select(&[symptom.id, SymptomId::Eyes])),
            SymptomTier::High
        );
    }
}

#[test]
fn test_single_non_severe_symptom_is_low() {
    assert_eq!(classify_symptoms(&select(&[SymptomId::Scratching])), SymptomTier::Low);
    assert_eq!(classify_symptoms(&select(&[SymptomId::Sneezing])), SymptomTier::Low);
}

#[test]
fn test_two_mild_symptoms_are_moderate_by_total_count() {
    // No severe, fewer than two moderate: only the total >= 2 rule applies
    let selected = select(&[SymptomId::Eyes, SymptomId::Sneezing]);
    assert_eq!(classify_symptoms(&selected), SymptomTier::Moderate);

    let mixed = select(&[SymptomId::Eyes, SymptomId::Licking]);
    assert_eq!(classify_symptoms(&mixed), SymptomTier::Moderate);
}

#[test]
fn test_two_moderate_symptoms_are_moderate() {
    let selected = select(&[SymptomId::Scratching, SymptomId::Redness]);
    assert_eq!(classify_symptoms(&selected), SymptomTier::Moderate);
}

#[test]
fn test_four_non_severe_symptoms_are_high() {
    let selected = select(&[
        SymptomId::Scratching,
        SymptomId::Redness,
        SymptomId::Licking,
        SymptomId::Eyes,
    ]);
    assert_eq!(classify_symptoms(&selected), SymptomTier::High);

    let three = select(&[SymptomId::Scratching, SymptomId::Redness, SymptomId::Licking]);
    assert_eq!(classify_symptoms(&three), SymptomTier::Moderate);
}

#[test]
fn test_classification_is_idempotent() {
    let selected = select(&[SymptomId::Eyes, SymptomId::Redness]);
    let before = selected.clone();
    assert_eq!(classify_symptoms(&selected), classify_symptoms(&selected));
    assert_eq!(selected, before);
}

#[test]
fn test_unknown_ids_do_not_count() {
    let selected = parse_selection(["eyes", "whiskers", "tail"]);
    assert_eq!(selected.len(), 1);
    assert_eq!(classify_symptoms(&selected), SymptomTier::Low);
}

#[test]
fn test_assessment_card() {
    let assessment = assess_symptoms(&select(&[SymptomId::Hotspots, SymptomId::Eyes]));
    assert_eq!(assessment.tier, SymptomTier::High);
    assert_eq!(assessment.selected_count, 2);
    assert_eq!(assessment.headline, "High likelihood of allergies");
    assert!(assessment.advice.contains("veterinarian"));

    let low = assess_symptoms(&BTreeSet::new());
    assert_eq!(low.headline, "Low likelihood of allergies");
    assert_eq!(low.selected_count, 0);
}

#[test]
fn test_symptom_ids_serialize_as_catalog_ids() {
    let json = serde_json::to_string(&select(&[SymptomId::Hairloss, SymptomId::Ears])).unwrap();
    assert_eq!(json, r#"["hairloss","ears"]"#);
    let parsed: BTreeSet<SymptomId> = serde_json::from_str(r#"["hotspots"]"#).unwrap();
    assert!(parsed.contains(&SymptomId::Hotspots));
}
