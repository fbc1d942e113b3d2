//! Tests for quiz classification and result cards.

use furlief_shared::quiz::{
    classify_quiz, evaluate, result_message, Answer, LifeImpact, MonthlySpend, Progress,
    QuizAnswers, QuizAttempt, QuizError, ScratchFrequency, SeverityTier, SkinSign, SkinSigns,
    Treatment, NONE_OF_THE_ABOVE,
};

fn raw(entries: &[&[&str]]) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|entry| entry.iter().map(|s| s.to_string()).collect())
        .collect()
}

fn answers(entries: &[&[&str]]) -> QuizAnswers {
    QuizAnswers::from_raw(&raw(entries))
}

#[test]
fn test_frequent_scratching_with_two_signs_is_high() {
    for frequency in ["Frequently (daily)", "Constantly (multiple times per day)"] {
        let a = answers(&[
            &[frequency],
            &["Red, irritated skin", "Recurring ear infections"],
            &["Nothing yet"],
            &["Less than $50"],
            &["No noticeable impact"],
        ]);
        assert_eq!(classify_quiz(&a), SeverityTier::High, "{}", frequency);
    }
}

#[test]
fn test_expensive_meds_with_severe_impact_is_high_regardless_of_symptoms() {
    let a = answers(&[
        &["Rarely or never"],
        &[NONE_OF_THE_ABOVE],
        &["Prescription medications (like Apoquel)"],
        &["More than $200"],
        &["Severe impact on overall wellbeing"],
    ]);
    assert_eq!(classify_quiz(&a), SeverityTier::High);

    let a = answers(&[&[], &[], &[], &["$100-$200"], &["Significant distress affecting daily activities"]]);
    assert_eq!(classify_quiz(&a), SeverityTier::High);
}

#[test]
fn test_all_mild_answers_are_low() {
    let a = answers(&[
        &["Rarely or never"],
        &[NONE_OF_THE_ABOVE],
        &["My dog doesn't have allergies"],
        &["Less than $50"],
        &["No noticeable impact"],
    ]);
    assert_eq!(classify_quiz(&a), SeverityTier::Low);
}

#[test]
fn test_occasional_scratching_is_moderate() {
    let a = answers(&[
        &["Occasionally (a few times a week)"],
        &[],
        &["Nothing yet"],
        &["$50-$100"],
        &["Mild discomfort but generally happy"],
    ]);
    assert_eq!(classify_quiz(&a), SeverityTier::Moderate);
}

#[test]
fn test_single_sign_is_moderate() {
    let a = answers(&[&["Rarely or never"], &["Paw licking or chewing"]]);
    assert_eq!(classify_quiz(&a), SeverityTier::Moderate);
}

#[test]
fn test_moderate_impact_is_moderate() {
    let a = answers(&[&[], &[], &[], &[], &["Moderate impact on activities and sleep"]]);
    assert_eq!(classify_quiz(&a), SeverityTier::Moderate);
}

#[test]
fn test_frequent_scratching_with_one_sign_is_only_moderate() {
    let a = answers(&[&["Frequently (daily)"], &["Hair loss or bald patches"]]);
    assert_eq!(classify_quiz(&a), SeverityTier::Moderate);
}

#[test]
fn test_frequent_scratching_alone_is_low() {
    // Neither high rule completes and no moderate predicate references q0=Frequently
    let a = answers(&[&["Frequently (daily)"], &[NONE_OF_THE_ABOVE]]);
    assert_eq!(classify_quiz(&a), SeverityTier::Low);
}

#[test]
fn test_expensive_meds_without_severe_impact_is_not_high() {
    let a = answers(&[&[], &[], &[], &["More than $200"], &["Mild discomfort but generally happy"]]);
    assert_eq!(classify_quiz(&a), SeverityTier::Low);
}

#[test]
fn test_short_and_empty_input_never_fails() {
    assert_eq!(classify_quiz(&QuizAnswers::from_raw(&[])), SeverityTier::Low);
    assert_eq!(classify_quiz(&answers(&[&[]])), SeverityTier::Low);
    assert_eq!(
        classify_quiz(&answers(&[&["Occasionally (a few times a week)"]])),
        SeverityTier::Moderate
    );
}

#[test]
fn test_unknown_labels_match_nothing() {
    let a = answers(&[&["Every second"], &["Glowing fur", "Purple spots"], &[], &["$1000"], &["Bad"]]);
    assert_eq!(a.answered(), 0);
    assert_eq!(classify_quiz(&a), SeverityTier::Low);
}

#[test]
fn test_sentinel_does_not_count_as_a_sign() {
    let a = answers(&[&["Constantly (multiple times per day)"], &["Red, irritated skin", NONE_OF_THE_ABOVE]]);
    assert_eq!(a.skin_signs.count(), 0);
    assert_eq!(classify_quiz(&a), SeverityTier::Low);
}

#[test]
fn test_classification_is_idempotent() {
    let a = answers(&[
        &["Frequently (daily)"],
        &["Red, irritated skin", "Hair loss or bald patches"],
        &["Nothing yet"],
        &["More than $200"],
        &["Severe impact on overall wellbeing"],
    ]);
    let before = a.clone();
    let first = classify_quiz(&a);
    let second = classify_quiz(&a);
    assert_eq!(first, second);
    assert_eq!(a, before);
}

#[test]
fn test_result_message_branches() {
    let savings = result_message(SeverityTier::High, Some(MonthlySpend::Over200));
    assert!(savings.message.contains("up to 70%"));

    let savings_mid = result_message(SeverityTier::High, Some(MonthlySpend::From100To200));
    assert!(savings_mid.message.contains("up to 70%"));

    let generic = result_message(SeverityTier::High, Some(MonthlySpend::Under50));
    assert!(!generic.message.contains("70%"));
    assert_eq!(generic.title, "High Likelihood of Benefit");

    let unanswered = result_message(SeverityTier::High, None);
    assert_eq!(unanswered, generic);

    let moderate = result_message(SeverityTier::Moderate, Some(MonthlySpend::Over200));
    assert_eq!(moderate.title, "Moderate Likelihood of Benefit");

    let low = result_message(SeverityTier::Low, None);
    assert_eq!(low.title, "Educational Information");

    for result in [savings, generic, moderate, low] {
        assert!(result.action.starts_with("Join our waitlist"));
    }
}

#[test]
fn test_evaluate_uses_spend_answer() {
    let a = answers(&[&[], &[], &[], &["More than $200"], &["Severe impact on overall wellbeing"]]);
    let (tier, result) = evaluate(&a);
    assert_eq!(tier, SeverityTier::High);
    assert!(result.message.contains("up to 70%"));
}

#[test]
fn test_answers_deserialize_from_raw_json() {
    let a: QuizAnswers = serde_json::from_str(
        r#"[["Frequently (daily)"],["Red, irritated skin","Paw licking or chewing"],["Nothing yet"]]"#,
    )
    .unwrap();
    assert_eq!(a.scratching, Some(ScratchFrequency::Frequently));
    assert_eq!(a.skin_signs.count(), 2);
    assert_eq!(a.treatment, Some(Treatment::NothingYet));
    assert!(a.spend.is_none());

    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(5));
    assert_eq!(json[3], serde_json::json!([]));
}

#[test]
fn test_attempt_walks_questions_in_order() {
    let mut attempt = QuizAttempt::new();
    assert_eq!(attempt.current_question(), Some(0));

    assert_eq!(
        attempt.answer(Answer::Scratching(ScratchFrequency::Constantly)),
        Ok(Progress::Next(1))
    );

    // Live evaluation on a partial attempt
    assert_eq!(classify_quiz(attempt.answers()), SeverityTier::Low);

    let err = attempt.answer(Answer::Spend(MonthlySpend::Over200)).unwrap_err();
    assert_eq!(err, QuizError::OutOfOrder { expected: 1, got: 3 });

    let mut signs = SkinSigns::new();
    signs.toggle(SkinSign::HairLoss);
    signs.toggle(SkinSign::EarInfections);
    attempt.answer(Answer::SkinSigns(signs)).unwrap();
    attempt.answer(Answer::Treatment(Treatment::Topical)).unwrap();
    attempt.answer(Answer::Spend(MonthlySpend::Under50)).unwrap();
    assert_eq!(
        attempt.answer(Answer::Impact(LifeImpact::Mild)),
        Ok(Progress::Complete)
    );
    assert!(attempt.is_complete());
    assert_eq!(
        attempt.answer(Answer::Impact(LifeImpact::Severe)),
        Err(QuizError::AlreadyComplete)
    );

    let finished = attempt.finish().unwrap();
    assert_eq!(finished.answered(), 5);
    assert_eq!(classify_quiz(&finished), SeverityTier::High);
}

#[test]
fn test_unfinished_attempt_cannot_finish() {
    let mut attempt = QuizAttempt::new();
    attempt
        .answer(Answer::Scratching(ScratchFrequency::RarelyOrNever))
        .unwrap();
    assert_eq!(attempt.finish(), Err(QuizError::Incomplete { answered: 1 }));
}
