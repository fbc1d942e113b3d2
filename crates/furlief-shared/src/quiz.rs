//! Dog allergy quiz: question catalog, answer model and tier classifier.
//!
//! Every question has a closed set of options. Option text only matters at the
//! edges: raw answers (`[["Frequently (daily)"], [...], ...]`) are parsed into
//! enums once, and the classifier matches on the enums.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of questions in the quiz
pub const QUESTION_COUNT: usize = 5;

/// Sentinel option of the skin sign checklist
pub const NONE_OF_THE_ABOVE: &str = "None of the above";

/// Raw answer form: one entry per question, each a list of option labels
pub type RawAnswers = Vec<Vec<String>>;

macro_rules! quiz_options {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            /// All options in display order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Option text as shown to the respondent
            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }

            /// Parse an option from its label
            pub fn from_label(label: &str) -> Option<Self> {
                let label = label.trim();
                Self::ALL.iter().copied().find(|option| option.label() == label)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

quiz_options! {
    /// Question 1: how often the dog scratches, licks or bites
    pub enum ScratchFrequency {
        RarelyOrNever => "Rarely or never",
        Occasionally => "Occasionally (a few times a week)",
        Frequently => "Frequently (daily)",
        Constantly => "Constantly (multiple times per day)",
    }
}

quiz_options! {
    /// Question 2: visible signs (multi-select, sentinel handled by [`SkinSigns`])
    pub enum SkinSign {
        RedIrritatedSkin => "Red, irritated skin",
        HairLoss => "Hair loss or bald patches",
        EarInfections => "Recurring ear infections",
        PawLicking => "Paw licking or chewing",
        FaceRubbing => "Rubbing face against furniture or carpet",
    }
}

quiz_options! {
    /// Question 3: treatments tried so far (not scored)
    pub enum Treatment {
        Prescription => "Prescription medications (like Apoquel)",
        OverTheCounter => "Over-the-counter allergy remedies",
        DietChange => "Special diet or food changes",
        Topical => "Medicated shampoos or topical treatments",
        NothingYet => "Nothing yet",
        NoAllergies => "My dog doesn't have allergies",
    }
}

quiz_options! {
    /// Question 4: monthly spend on prescription allergy medication
    pub enum MonthlySpend {
        Under50 => "Less than $50",
        From50To100 => "$50-$100",
        From100To200 => "$100-$200",
        Over200 => "More than $200",
        NoPrescription => "I don't currently use prescription medication",
    }
}

quiz_options! {
    /// Question 5: impact on quality of life
    pub enum LifeImpact {
        NoImpact => "No noticeable impact",
        Mild => "Mild discomfort but generally happy",
        Moderate => "Moderate impact on activities and sleep",
        Significant => "Significant distress affecting daily activities",
        Severe => "Severe impact on overall wellbeing",
    }
}

impl MonthlySpend {
    /// Brackets of $100 or more per month
    pub fn is_expensive(self) -> bool {
        matches!(self, MonthlySpend::From100To200 | MonthlySpend::Over200)
    }

    /// Brackets whose label mentions "$200"
    pub fn mentions_200(self) -> bool {
        self.label().contains("$200")
    }
}

/// Answer to the skin sign checklist.
///
/// "None of the above" is mutually exclusive with every other option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkinSigns {
    signs: BTreeSet<SkinSign>,
    none_of_the_above: bool,
}

impl SkinSigns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checklist answered with the sentinel
    pub fn none_of_the_above() -> Self {
        Self {
            signs: BTreeSet::new(),
            none_of_the_above: true,
        }
    }

    pub fn from_signs(signs: impl IntoIterator<Item = SkinSign>) -> Self {
        Self {
            signs: signs.into_iter().collect(),
            none_of_the_above: false,
        }
    }

    /// Select a sign, clearing the sentinel
    pub fn select(&mut self, sign: SkinSign) {
        self.none_of_the_above = false;
        self.signs.insert(sign);
    }

    /// Toggle a sign the way the checklist UI does: re-selecting deselects it.
    /// Either way the sentinel is cleared.
    pub fn toggle(&mut self, sign: SkinSign) {
        self.none_of_the_above = false;
        if !self.signs.remove(&sign) {
            self.signs.insert(sign);
        }
    }

    /// Select the sentinel, clearing every sign
    pub fn select_none_of_the_above(&mut self) {
        self.signs.clear();
        self.none_of_the_above = true;
    }

    /// Number of selected signs, sentinel excluded
    pub fn count(&self) -> usize {
        self.signs.len()
    }

    pub fn contains(&self, sign: SkinSign) -> bool {
        self.signs.contains(&sign)
    }

    pub fn is_none_of_the_above(&self) -> bool {
        self.none_of_the_above
    }

    /// Nothing selected, not even the sentinel
    pub fn is_unanswered(&self) -> bool {
        self.signs.is_empty() && !self.none_of_the_above
    }

    pub fn labels(&self) -> Vec<&'static str> {
        if self.none_of_the_above {
            return vec![NONE_OF_THE_ABOVE];
        }
        self.signs.iter().map(|sign| sign.label()).collect()
    }

    /// Replay raw labels in order; the last of sentinel/sign wins
    fn from_raw(labels: &[String]) -> Self {
        let mut selection = Self::new();
        for label in labels {
            if label.trim() == NONE_OF_THE_ABOVE {
                selection.select_none_of_the_above();
            } else if let Some(sign) = SkinSign::from_label(label) {
                selection.select(sign);
            }
        }
        selection
    }
}

/// A completed (or partially completed) set of quiz answers.
///
/// Unanswered questions are `None` / an unanswered checklist; the classifier
/// treats them as matching nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAnswers", into = "RawAnswers")]
pub struct QuizAnswers {
    pub scratching: Option<ScratchFrequency>,
    pub skin_signs: SkinSigns,
    pub treatment: Option<Treatment>,
    pub spend: Option<MonthlySpend>,
    pub impact: Option<LifeImpact>,
}

impl QuizAnswers {
    /// Parse raw answers leniently. Short input, empty entries and unknown
    /// labels all become "unanswered".
    pub fn from_raw(raw: &[Vec<String>]) -> Self {
        let entry = |index: usize| raw.get(index).map(Vec::as_slice).unwrap_or(&[]);

        Self {
            scratching: first_label(entry(0), ScratchFrequency::from_label),
            skin_signs: SkinSigns::from_raw(entry(1)),
            treatment: first_label(entry(2), Treatment::from_label),
            spend: first_label(entry(3), MonthlySpend::from_label),
            impact: first_label(entry(4), LifeImpact::from_label),
        }
    }

    /// Raw form, always exactly five entries
    pub fn to_raw(&self) -> RawAnswers {
        fn single<T: Copy>(value: Option<T>, label: fn(T) -> &'static str) -> Vec<String> {
            value.map(|v| vec![label(v).to_string()]).unwrap_or_default()
        }

        vec![
            single(self.scratching, ScratchFrequency::label),
            self.skin_signs.labels().into_iter().map(str::to_string).collect(),
            single(self.treatment, Treatment::label),
            single(self.spend, MonthlySpend::label),
            single(self.impact, LifeImpact::label),
        ]
    }

    /// Number of questions with an answer
    pub fn answered(&self) -> usize {
        [
            self.scratching.is_some(),
            !self.skin_signs.is_unanswered(),
            self.treatment.is_some(),
            self.spend.is_some(),
            self.impact.is_some(),
        ]
        .iter()
        .filter(|answered| **answered)
        .count()
    }
}

fn first_label<T>(labels: &[String], parse: fn(&str) -> Option<T>) -> Option<T> {
    labels.iter().find_map(|label| parse(label))
}

impl From<RawAnswers> for QuizAnswers {
    fn from(raw: RawAnswers) -> Self {
        QuizAnswers::from_raw(&raw)
    }
}

impl From<QuizAnswers> for RawAnswers {
    fn from(answers: QuizAnswers) -> Self {
        answers.to_raw()
    }
}

/// Likelihood that the dog would benefit from treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityTier {
    Low,
    Moderate,
    High,
}

impl SeverityTier {
    pub const ALL: [SeverityTier; 3] = [SeverityTier::Low, SeverityTier::Moderate, SeverityTier::High];

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityTier::Low => "Low",
            SeverityTier::Moderate => "Moderate",
            SeverityTier::High => "High",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityTier {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeverityTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuizError::UnknownTier(s.to_string()))
    }
}

/// Classify quiz answers. First matching rule wins.
pub fn classify_quiz(answers: &QuizAnswers) -> SeverityTier {
    let frequent_scratching = matches!(
        answers.scratching,
        Some(ScratchFrequency::Frequently | ScratchFrequency::Constantly)
    );
    let several_signs = answers.skin_signs.count() >= 2;
    let expensive_meds = answers.spend.is_some_and(MonthlySpend::is_expensive);
    let severe_impact = matches!(
        answers.impact,
        Some(LifeImpact::Significant | LifeImpact::Severe)
    );

    if (frequent_scratching && several_signs) || (expensive_meds && severe_impact) {
        return SeverityTier::High;
    }

    let occasional_scratching = answers.scratching == Some(ScratchFrequency::Occasionally);
    let single_sign = answers.skin_signs.count() == 1;
    let moderate_impact = answers.impact == Some(LifeImpact::Moderate);

    if occasional_scratching || single_sign || moderate_impact {
        return SeverityTier::Moderate;
    }

    SeverityTier::Low
}

/// Result card shown after the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub title: &'static str,
    pub message: &'static str,
    pub action: &'static str,
}

/// Pick the result card for a tier and the spend bracket answer
pub fn result_message(tier: SeverityTier, spend: Option<MonthlySpend>) -> QuizResult {
    match tier {
        SeverityTier::High => QuizResult {
            title: "High Likelihood of Benefit",
            message: if spend.is_some_and(MonthlySpend::mentions_200) {
                "Based on your responses, Furlief could provide significant relief while saving you up to 70% on medication costs."
            } else {
                "Your dog's symptoms suggest they could greatly benefit from affordable allergy medication."
            },
            action: "Join our waitlist to be first in line for affordable relief.",
        },
        SeverityTier::Moderate => QuizResult {
            title: "Moderate Likelihood of Benefit",
            message: "Your dog shows some signs of allergies. Furlief could help manage symptoms while being cost-effective.",
            action: "Join our waitlist to learn more about affordable treatment options.",
        },
        SeverityTier::Low => QuizResult {
            title: "Educational Information",
            message: "While your dog's symptoms appear mild, it's good to stay informed about allergy treatment options.",
            action: "Join our waitlist to receive educational content about pet allergies.",
        },
    }
}

/// Classify and pick the result card in one go
pub fn evaluate(answers: &QuizAnswers) -> (SeverityTier, QuizResult) {
    let tier = classify_quiz(answers);
    (tier, result_message(tier, answers.spend))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multiple,
}

/// Question as presented to the respondent
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: u8,
    pub text: &'static str,
    pub kind: QuestionKind,
    pub options: Vec<&'static str>,
}

/// The five questions, in order
pub fn questions() -> Vec<Question> {
    fn labels<T: Copy>(all: &[T], label: fn(T) -> &'static str) -> Vec<&'static str> {
        all.iter().copied().map(label).collect()
    }

    let mut skin_options = labels(SkinSign::ALL, SkinSign::label);
    skin_options.push(NONE_OF_THE_ABOVE);

    vec![
        Question {
            id: 1,
            text: "How often does your dog scratch, lick, or bite their skin?",
            kind: QuestionKind::Single,
            options: labels(ScratchFrequency::ALL, ScratchFrequency::label),
        },
        Question {
            id: 2,
            text: "Has your dog experienced any of these symptoms? (Select all that apply)",
            kind: QuestionKind::Multiple,
            options: skin_options,
        },
        Question {
            id: 3,
            text: "What treatments have you tried for your dog's itching or allergies?",
            kind: QuestionKind::Single,
            options: labels(Treatment::ALL, Treatment::label),
        },
        Question {
            id: 4,
            text: "If you're using prescription allergy medication, approximately how much do you spend monthly?",
            kind: QuestionKind::Single,
            options: labels(MonthlySpend::ALL, MonthlySpend::label),
        },
        Question {
            id: 5,
            text: "When your dog experiences allergy symptoms, how does it affect their quality of life?",
            kind: QuestionKind::Single,
            options: labels(LifeImpact::ALL, LifeImpact::label),
        },
    ]
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Expected an answer to question {expected}, got question {got}")]
    OutOfOrder { expected: usize, got: usize },

    #[error("Quiz already complete")]
    AlreadyComplete,

    #[error("Quiz incomplete: {answered} of 5 questions answered")]
    Incomplete { answered: usize },

    #[error("Unknown severity tier: {0}")]
    UnknownTier(String),
}

/// One answer, tagged with its question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Scratching(ScratchFrequency),
    SkinSigns(SkinSigns),
    Treatment(Treatment),
    Spend(MonthlySpend),
    Impact(LifeImpact),
}

impl Answer {
    /// Zero-based index of the question this answers
    pub fn question_index(&self) -> usize {
        match self {
            Answer::Scratching(_) => 0,
            Answer::SkinSigns(_) => 1,
            Answer::Treatment(_) => 2,
            Answer::Spend(_) => 3,
            Answer::Impact(_) => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Next question to answer (zero-based)
    Next(usize),
    Complete,
}

/// A single pass through the quiz.
///
/// Answers must arrive in question order. Once the last question is answered
/// the attempt is complete and takes no further answers; start a new attempt
/// to retake the quiz.
#[derive(Debug, Clone, Default)]
pub struct QuizAttempt {
    answers: QuizAnswers,
    current: usize,
}

impl QuizAttempt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Question waiting for an answer, `None` once complete
    pub fn current_question(&self) -> Option<usize> {
        (self.current < QUESTION_COUNT).then_some(self.current)
    }

    pub fn is_complete(&self) -> bool {
        self.current >= QUESTION_COUNT
    }

    /// Answers so far, for live evaluation of a partial attempt
    pub fn answers(&self) -> &QuizAnswers {
        &self.answers
    }

    pub fn answer(&mut self, answer: Answer) -> Result<Progress, QuizError> {
        if self.is_complete() {
            return Err(QuizError::AlreadyComplete);
        }

        let index = answer.question_index();
        if index != self.current {
            return Err(QuizError::OutOfOrder {
                expected: self.current,
                got: index,
            });
        }

        match answer {
            Answer::Scratching(value) => self.answers.scratching = Some(value),
            Answer::SkinSigns(value) => self.answers.skin_signs = value,
            Answer::Treatment(value) => self.answers.treatment = Some(value),
            Answer::Spend(value) => self.answers.spend = Some(value),
            Answer::Impact(value) => self.answers.impact = Some(value),
        }

        self.current += 1;
        Ok(match self.current_question() {
            Some(next) => Progress::Next(next),
            None => Progress::Complete,
        })
    }

    /// Finalize the attempt
    pub fn finish(self) -> Result<QuizAnswers, QuizError> {
        if !self.is_complete() {
            return Err(QuizError::Incomplete {
                answered: self.current,
            });
        }
        Ok(self.answers)
    }
}
