use serde::{Deserialize, Serialize};

use super::persona::{Trait, TraitWeights, UNKNOWN_TRAIT_COLOR};
use super::scholarship::{ScholarshipId, StudentId};
use super::{check_unit_interval, null_as_default};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EssayType {
    Adaptive,
    Baseline,
}

/// Body of `POST /demo/generate-essay`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EssayRequest {
    pub scholarship_id: ScholarshipId,
    pub student_id: StudentId,
    pub essay_type: EssayType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssayParagraph {
    #[serde(rename = "paragraph")]
    pub text: String,
    #[serde(rename = "focus")]
    pub focus_trait: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
    pub alignment_score: f64,
}

impl EssayParagraph {
    pub fn color(&self) -> &'static str {
        Trait::from_name(&self.focus_trait)
            .map(Trait::color)
            .unwrap_or(UNKNOWN_TRAIT_COLOR)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedEssay {
    pub persona_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tone_used: String,
    #[serde(rename = "essay")]
    pub paragraphs: Vec<EssayParagraph>,
    pub overall_alignment: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
}

impl GeneratedEssay {
    pub fn validate(&self) -> Result<(), String> {
        check_unit_interval("overall_alignment", self.overall_alignment)?;
        for (i, p) in self.paragraphs.iter().enumerate() {
            check_unit_interval(&format!("essay[{i}].alignment_score"), p.alignment_score)?;
        }
        Ok(())
    }

    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs.iter().map(|p| p.text.clone()).collect()
    }
}

/// Body of `POST /demo/compare-essays`, always sent as paragraph text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareRequest {
    pub scholarship_id: ScholarshipId,
    pub adaptive_essay: Vec<String>,
    pub baseline_essay: Vec<String>,
}

/// Evaluation of an adaptive essay against a generic baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssayComparison {
    #[serde(default)]
    pub trait_alignment: TraitWeights,
    #[serde(default)]
    pub baseline_alignment: TraitWeights,
    // may be negative when the baseline wins
    #[serde(default)]
    pub alignment_gain: f64,
    #[serde(default)]
    pub tone_consistency_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendation: String,
}

impl EssayComparison {
    pub fn validate(&self) -> Result<(), String> {
        self.trait_alignment.validate("trait_alignment")?;
        self.baseline_alignment.validate("baseline_alignment")?;
        check_unit_interval("tone_consistency_score", self.tone_consistency_score)
    }
}
