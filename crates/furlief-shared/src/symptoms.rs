//! Symptom checker: an eight-item checklist with per-symptom severity weights.
//!
//! Deliberately separate from the quiz classifier. The two questionnaires
//! have different thresholds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Severity weight attached to a catalog symptom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityWeight {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomId {
    Scratching,
    Redness,
    Hairloss,
    Licking,
    Ears,
    Eyes,
    Sneezing,
    Hotspots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Symptom {
    pub id: SymptomId,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: SeverityWeight,
}

pub const CATALOG: [Symptom; 8] = [
    Symptom {
        id: SymptomId::Scratching,
        name: "Excessive Scratching",
        description: "Frequent scratching, especially around ears, face, or paws",
        severity: SeverityWeight::Moderate,
    },
    Symptom {
        id: SymptomId::Redness,
        name: "Red or Irritated Skin",
        description: "Visible inflammation or redness on the skin",
        severity: SeverityWeight::Moderate,
    },
    Symptom {
        id: SymptomId::Hairloss,
        name: "Hair Loss",
        description: "Patches of missing fur or thinning coat",
        severity: SeverityWeight::Severe,
    },
    Symptom {
        id: SymptomId::Licking,
        name: "Excessive Licking",
        description: "Constant licking of paws or other areas",
        severity: SeverityWeight::Moderate,
    },
    Symptom {
        id: SymptomId::Ears,
        name: "Ear Problems",
        description: "Frequent ear infections or scratching at ears",
        severity: SeverityWeight::Severe,
    },
    Symptom {
        id: SymptomId::Eyes,
        name: "Watery Eyes",
        description: "Excessive tearing or eye discharge",
        severity: SeverityWeight::Mild,
    },
    Symptom {
        id: SymptomId::Sneezing,
        name: "Sneezing",
        description: "Frequent sneezing or nasal discharge",
        severity: SeverityWeight::Mild,
    },
    Symptom {
        id: SymptomId::Hotspots,
        name: "Hot Spots",
        description: "Moist, red, irritated patches on the skin",
        severity: SeverityWeight::Severe,
    },
];

impl SymptomId {
    pub fn as_str(self) -> &'static str {
        match self {
            SymptomId::Scratching => "scratching",
            SymptomId::Redness => "redness",
            SymptomId::Hairloss => "hairloss",
            SymptomId::Licking => "licking",
            SymptomId::Ears => "ears",
            SymptomId::Eyes => "eyes",
            SymptomId::Sneezing => "sneezing",
            SymptomId::Hotspots => "hotspots",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        CATALOG.iter().map(|s| s.id).find(|candidate| candidate.as_str() == id)
    }

    pub fn symptom(self) -> &'static Symptom {
        // Catalog order matches declaration order
        &CATALOG[self as usize]
    }

    pub fn weight(self) -> SeverityWeight {
        self.symptom().severity
    }
}

impl fmt::Display for SymptomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collect catalog ids, silently dropping anything not in the catalog
pub fn parse_selection<I, S>(ids: I) -> BTreeSet<SymptomId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .filter_map(|id| SymptomId::from_id(id.as_ref()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomTier {
    Low,
    Moderate,
    High,
}

impl SymptomTier {
    pub fn as_str(self) -> &'static str {
        match self {
            SymptomTier::Low => "low",
            SymptomTier::Moderate => "moderate",
            SymptomTier::High => "high",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            SymptomTier::High => "High likelihood of allergies",
            SymptomTier::Moderate => "Moderate likelihood of allergies",
            SymptomTier::Low => "Low likelihood of allergies",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            SymptomTier::High => "Your dog is showing multiple significant allergy symptoms. We recommend consulting with a veterinarian.",
            SymptomTier::Moderate => "Your dog is showing some allergy symptoms. Monitor their condition and consider veterinary advice.",
            SymptomTier::Low => "Your dog is showing minimal allergy symptoms. Continue monitoring for any changes.",
        }
    }
}

impl fmt::Display for SymptomTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a symptom selection
pub fn classify_symptoms(selected: &BTreeSet<SymptomId>) -> SymptomTier {
    let count_weight = |weight: SeverityWeight| {
        selected.iter().filter(|id| id.weight() == weight).count()
    };
    let severe = count_weight(SeverityWeight::Severe);
    let moderate = count_weight(SeverityWeight::Moderate);
    let total = selected.len();

    if severe >= 1 || total >= 4 {
        SymptomTier::High
    } else if moderate >= 2 || total >= 2 {
        SymptomTier::Moderate
    } else {
        SymptomTier::Low
    }
}

/// Assessment card shown by the symptom checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomAssessment {
    pub tier: SymptomTier,
    pub selected_count: usize,
    pub headline: &'static str,
    pub advice: &'static str,
}

pub fn assess_symptoms(selected: &BTreeSet<SymptomId>) -> SymptomAssessment {
    let tier = classify_symptoms(selected);
    SymptomAssessment {
        tier,
        selected_count: selected.len(),
        headline: tier.headline(),
        advice: tier.advice(),
    }
}
