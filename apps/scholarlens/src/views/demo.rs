use askama::Template;

use crate::demo::workflow::{BusyStatus, DemoState};
use crate::models::essay::{EssayComparison, GeneratedEssay};
use crate::models::persona::{ScholarshipPersona, Trait};

use super::{dollars, percent};

#[derive(Debug, PartialEq)]
pub struct Choice {
    pub id: i64,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, PartialEq)]
pub struct TraitBar {
    pub label: &'static str,
    pub percent: u32,
    pub color: &'static str,
}

pub struct PersonaView {
    pub name: String,
    pub tone: String,
    pub rationale: String,
    pub traits: Vec<TraitBar>,
}

pub struct ParagraphView {
    pub text: String,
    pub focus: String,
    pub color: &'static str,
    pub alignment: u32,
    pub reason: String,
}

pub struct EssayView {
    pub overall: u32,
    pub paragraphs: Vec<ParagraphView>,
    pub summary: String,
}

pub struct ComparisonRow {
    pub label: &'static str,
    pub adaptive: u32,
    pub baseline: u32,
}

pub struct ComparisonView {
    /// Signed, e.g. `+25%` or `-4%`.
    pub gain: String,
    pub tone_consistency: u32,
    pub rows: Vec<ComparisonRow>,
    pub summary: String,
    pub recommendation: String,
}

#[derive(Template)]
#[template(path = "demo.html")]
pub struct DemoPage {
    pub error: Option<String>,
    pub busy: Option<String>,
    pub refresh: bool,
    /// The lists never arrived; offer to load them again.
    pub retry_load: bool,
    pub scholarships: Vec<Choice>,
    pub students: Vec<Choice>,
    pub scholarship_blurb: Option<String>,
    pub student_goals: Option<String>,
    pub persona: Option<PersonaView>,
    pub essay: Option<EssayView>,
    pub comparison: Option<ComparisonView>,
    pub show_intro: bool,
}

impl DemoPage {
    pub fn from_state(state: &DemoState) -> Self {
        let busy = match &state.status {
            BusyStatus::Running(description) => Some(description.clone()),
            BusyStatus::Idle => None,
        };
        // keep polling until the first load has settled
        let refresh = busy.is_some() || (!state.loaded && state.error.is_none());

        let scholarships = state
            .scholarships
            .iter()
            .map(|s| Choice {
                id: s.id.0,
                label: format!("{} ({})", s.name, dollars(s.amount)),
                selected: state.selected_scholarship == Some(s.id),
            })
            .collect();
        let students = state
            .students
            .iter()
            .map(|s| Choice {
                id: s.id.0,
                label: format!("{} (GPA: {})", s.name, s.gpa),
                selected: state.selected_student == Some(s.id),
            })
            .collect();

        Self {
            error: state.error.clone(),
            retry_load: !state.loaded && state.error.is_some() && busy.is_none(),
            show_intro: state.persona.is_none() && state.essay.is_none() && busy.is_none(),
            busy,
            refresh,
            scholarships,
            students,
            scholarship_blurb: state.scholarship().map(|s| s.blurb()),
            student_goals: state.student().map(|s| s.goals.clone()),
            persona: state.persona.as_ref().map(persona_view),
            essay: state.essay.as_ref().map(essay_view),
            comparison: state.comparison.as_ref().map(comparison_view),
        }
    }
}

/// Traits with zero weight are left out.
fn persona_view(persona: &ScholarshipPersona) -> PersonaView {
    PersonaView {
        name: persona.name.clone(),
        tone: persona.tone.clone(),
        rationale: persona.rationale.clone(),
        traits: persona
            .weights
            .iter()
            .filter(|(_, weight)| *weight > 0.0)
            .map(|(t, weight)| TraitBar {
                label: t.as_str(),
                percent: percent(weight),
                color: t.color(),
            })
            .collect(),
    }
}

fn essay_view(essay: &GeneratedEssay) -> EssayView {
    EssayView {
        overall: percent(essay.overall_alignment),
        paragraphs: essay
            .paragraphs
            .iter()
            .map(|p| ParagraphView {
                text: p.text.clone(),
                focus: p.focus_trait.clone(),
                color: p.color(),
                alignment: percent(p.alignment_score),
                reason: p.reason.clone(),
            })
            .collect(),
        summary: essay.summary.clone(),
    }
}

fn comparison_view(comparison: &EssayComparison) -> ComparisonView {
    let gain = (comparison.alignment_gain * 100.0).round() as i64;
    ComparisonView {
        gain: format!("{gain:+}%"),
        tone_consistency: percent(comparison.tone_consistency_score),
        rows: Trait::ALL
            .into_iter()
            .map(|t| ComparisonRow {
                label: t.as_str(),
                adaptive: percent(comparison.trait_alignment.get(t)),
                baseline: percent(comparison.baseline_alignment.get(t)),
            })
            .filter(|row| row.adaptive > 0 || row.baseline > 0)
            .collect(),
        summary: comparison.summary.clone(),
        recommendation: comparison.recommendation.clone(),
    }
}
