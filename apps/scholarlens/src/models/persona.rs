use serde::{Deserialize, Serialize};

use super::{check_unit_interval, null_as_default};

/// The fixed trait set a scholarship persona is weighted over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    Academics,
    Leadership,
    Community,
    Innovation,
    FinancialNeed,
    Research,
}

impl Trait {
    pub const ALL: [Trait; 6] = [
        Trait::Academics,
        Trait::Leadership,
        Trait::Community,
        Trait::Innovation,
        Trait::FinancialNeed,
        Trait::Research,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Trait::Academics => "Academics",
            Trait::Leadership => "Leadership",
            Trait::Community => "Community",
            Trait::Innovation => "Innovation",
            Trait::FinancialNeed => "FinancialNeed",
            Trait::Research => "Research",
        }
    }

    pub fn from_name(name: &str) -> Option<Trait> {
        Trait::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Accent colour used for bars and paragraph borders.
    pub fn color(self) -> &'static str {
        match self {
            Trait::Academics => "#3b82f6",
            Trait::Leadership => "#8b5cf6",
            Trait::Community => "#10b981",
            Trait::Innovation => "#f59e0b",
            Trait::FinancialNeed => "#ef4444",
            Trait::Research => "#06b6d4",
        }
    }
}

/// Neutral grey for focus labels outside the trait set.
pub const UNKNOWN_TRAIT_COLOR: &str = "#6b7280";

/// Per-trait weights in `[0, 1]`. They need not sum to 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TraitWeights {
    pub academics: f64,
    pub leadership: f64,
    pub community: f64,
    pub innovation: f64,
    pub financial_need: f64,
    pub research: f64,
}

impl TraitWeights {
    pub fn get(&self, t: Trait) -> f64 {
        match t {
            Trait::Academics => self.academics,
            Trait::Leadership => self.leadership,
            Trait::Community => self.community,
            Trait::Innovation => self.innovation,
            Trait::FinancialNeed => self.financial_need,
            Trait::Research => self.research,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Trait, f64)> + '_ {
        Trait::ALL.into_iter().map(move |t| (t, self.get(t)))
    }

    pub fn validate(&self, field: &str) -> Result<(), String> {
        self.iter().try_for_each(|(t, w)| {
            check_unit_interval(&format!("{field}.{}", t.as_str()), w)
        })
    }
}

/// Server-computed description of what a scholarship rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipPersona {
    #[serde(rename = "persona_name")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tone: String,
    #[serde(default)]
    pub weights: TraitWeights,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rationale: String,
}

impl ScholarshipPersona {
    pub fn validate(&self) -> Result<(), String> {
        self.weights.validate("weights")
    }
}
