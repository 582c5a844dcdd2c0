//! In-memory `ScholarshipApi` with scripted responses, shared by workflow and route tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{watch, Notify};

use crate::api_client::{ApiError, ProgressFn, ScholarshipApi, UploadProgress};
use crate::models::essay::{CompareRequest, EssayComparison, EssayRequest, GeneratedEssay};
use crate::models::persona::ScholarshipPersona;
use crate::models::resume::{ExtractedProfile, ResumeFile};
use crate::models::scholarship::{ScholarshipId, ScholarshipSummary, StudentId, StudentSummary};
use crate::upload::workflow::{UploadPhase, UploadState};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListScholarships,
    ListStudents,
    Analyze(ScholarshipId),
    Generate(EssayRequest),
    Compare(CompareRequest),
    Upload(StudentId),
    Extract(StudentId),
}

/// `Err((status, detail))` becomes `ApiError::Api`.
pub type Scripted<T> = Result<T, (u16, Option<String>)>;

pub struct ScriptedApi {
    pub calls: Mutex<Vec<Call>>,
    pub scholarships: Scripted<Vec<ScholarshipSummary>>,
    pub students: Scripted<Vec<StudentSummary>>,
    /// Number of student list calls that fail with 503 before `students` applies.
    pub students_outage: AtomicUsize,
    pub persona: Scripted<ScholarshipPersona>,
    pub essay: Scripted<GeneratedEssay>,
    pub baseline: Scripted<GeneratedEssay>,
    pub comparison: Scripted<EssayComparison>,
    pub upload: Scripted<()>,
    /// Percentages of the file reported through the progress callback.
    pub upload_steps: Vec<u64>,
    pub extraction: Scripted<ExtractedProfile>,
    /// When set, uploads block until notified.
    pub upload_gate: Option<Arc<Notify>>,
    /// When set, persona analysis blocks until notified.
    pub analyze_gate: Option<Arc<Notify>>,
    pub upload_watch: Mutex<Option<watch::Receiver<UploadState>>>,
    pub observed: Mutex<Vec<(UploadPhase, u8)>>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scholarships: Ok(fixtures::scholarships()),
            students: Ok(fixtures::students()),
            students_outage: AtomicUsize::new(0),
            persona: Ok(fixtures::persona()),
            essay: Ok(fixtures::essay("Adaptive")),
            baseline: Ok(fixtures::essay("Generic Academic")),
            comparison: Ok(fixtures::comparison()),
            upload: Ok(()),
            upload_steps: vec![50, 100],
            extraction: Ok(fixtures::profile()),
            upload_gate: None,
            analyze_gate: None,
            upload_watch: Mutex::new(None),
            observed: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Records `(phase, progress)` of the upload widget at each progress
    /// report and at extraction entry.
    pub fn observe_upload(&self, rx: watch::Receiver<UploadState>) {
        *self.upload_watch.lock().unwrap() = Some(rx);
    }

    pub fn observed(&self) -> Vec<(UploadPhase, u8)> {
        self.observed.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn snapshot_upload(&self) {
        if let Some(rx) = self.upload_watch.lock().unwrap().as_ref() {
            let state = rx.borrow();
            self.observed
                .lock()
                .unwrap()
                .push((state.phase, state.upload_progress));
        }
    }

    fn reply<T: Clone>(scripted: &Scripted<T>) -> Result<T, ApiError> {
        scripted.clone().map_err(|(status, detail)| ApiError::Api { status, detail })
    }
}

#[async_trait]
impl ScholarshipApi for ScriptedApi {
    async fn list_scholarships(&self) -> Result<Vec<ScholarshipSummary>, ApiError> {
        self.record(Call::ListScholarships);
        Self::reply(&self.scholarships)
    }

    async fn list_students(&self) -> Result<Vec<StudentSummary>, ApiError> {
        self.record(Call::ListStudents);
        let outage = self
            .students_outage
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if outage.is_ok() {
            return Err(ApiError::Api {
                status: 503,
                detail: None,
            });
        }
        Self::reply(&self.students)
    }

    async fn analyze_scholarship(
        &self,
        scholarship_id: ScholarshipId,
    ) -> Result<ScholarshipPersona, ApiError> {
        self.record(Call::Analyze(scholarship_id));
        if let Some(gate) = &self.analyze_gate {
            gate.notified().await;
        }
        Self::reply(&self.persona)
    }

    async fn generate_essay(&self, request: &EssayRequest) -> Result<GeneratedEssay, ApiError> {
        self.record(Call::Generate(request.clone()));
        match request.essay_type {
            crate::models::essay::EssayType::Adaptive => Self::reply(&self.essay),
            crate::models::essay::EssayType::Baseline => Self::reply(&self.baseline),
        }
    }

    async fn compare_essays(
        &self,
        request: &CompareRequest,
    ) -> Result<EssayComparison, ApiError> {
        self.record(Call::Compare(request.clone()));
        Self::reply(&self.comparison)
    }

    async fn upload_resume(
        &self,
        student_id: StudentId,
        file: &ResumeFile,
        progress: ProgressFn,
    ) -> Result<(), ApiError> {
        self.record(Call::Upload(student_id));
        if let Some(gate) = &self.upload_gate {
            gate.notified().await;
        }
        for step in &self.upload_steps {
            progress(UploadProgress {
                sent: file.size_bytes * step / 100,
                total: file.size_bytes,
            });
            self.snapshot_upload();
        }
        Self::reply(&self.upload)
    }

    async fn extract_from_resume(
        &self,
        student_id: StudentId,
    ) -> Result<ExtractedProfile, ApiError> {
        self.record(Call::Extract(student_id));
        self.snapshot_upload();
        Self::reply(&self.extraction)
    }
}

pub mod fixtures {
    use crate::models::essay::{EssayComparison, EssayParagraph, GeneratedEssay};
    use crate::models::persona::{ScholarshipPersona, TraitWeights};
    use crate::models::resume::ExtractedProfile;
    use crate::models::scholarship::{ScholarshipId, ScholarshipSummary, StudentId, StudentSummary};

    pub fn scholarships() -> Vec<ScholarshipSummary> {
        [(1, "Future Leaders"), (3, "STEM Innovators")]
            .into_iter()
            .map(|(id, name)| ScholarshipSummary {
                id: ScholarshipId(id),
                name: name.to_string(),
                organization: "ScholarLens Foundation".to_string(),
                description: format!("{name} supports ambitious students."),
                amount: 5000.0,
            })
            .collect()
    }

    pub fn students() -> Vec<StudentSummary> {
        [(1, "Grace"), (5, "Ada")]
            .into_iter()
            .map(|(id, name)| StudentSummary {
                id: StudentId(id),
                name: name.to_string(),
                gpa: 3.8,
                activities: vec!["Robotics club".to_string()],
                achievements: vec!["Regional science fair winner".to_string()],
                goals: "Study computer science".to_string(),
            })
            .collect()
    }

    pub fn persona() -> ScholarshipPersona {
        ScholarshipPersona {
            name: "Ambitious STEM Innovator".to_string(),
            tone: "Confident and forward-looking".to_string(),
            weights: TraitWeights {
                academics: 0.3,
                leadership: 0.2,
                community: 0.1,
                innovation: 0.35,
                financial_need: 0.0,
                research: 0.05,
            },
            rationale: "Rewards builders who lead.".to_string(),
        }
    }

    pub fn essay(tone: &str) -> GeneratedEssay {
        GeneratedEssay {
            persona_name: "Ambitious STEM Innovator".to_string(),
            tone_used: tone.to_string(),
            paragraphs: vec![
                EssayParagraph {
                    text: format!("{tone}: I built a rover with my robotics club."),
                    focus_trait: "Innovation".to_string(),
                    reason: "Shows hands-on invention".to_string(),
                    alignment_score: 0.9,
                },
                EssayParagraph {
                    text: format!("{tone}: I led a team of twelve."),
                    focus_trait: "Leadership".to_string(),
                    reason: "Demonstrates leadership".to_string(),
                    alignment_score: 0.8,
                },
            ],
            overall_alignment: 0.86,
            summary: "Emphasises innovation and leadership.".to_string(),
        }
    }

    pub fn comparison() -> EssayComparison {
        EssayComparison {
            trait_alignment: TraitWeights {
                innovation: 0.9,
                leadership: 0.8,
                ..TraitWeights::default()
            },
            baseline_alignment: TraitWeights {
                innovation: 0.5,
                leadership: 0.6,
                ..TraitWeights::default()
            },
            alignment_gain: 0.25,
            tone_consistency_score: 0.88,
            summary: "The adaptive essay aligns better.".to_string(),
            recommendation: "Use the adaptive essay.".to_string(),
        }
    }

    pub fn profile() -> ExtractedProfile {
        ExtractedProfile {
            name: "Ada".to_string(),
            skills: vec!["Python".to_string()],
            confidence: 0.92,
            ..ExtractedProfile::default()
        }
    }
}
