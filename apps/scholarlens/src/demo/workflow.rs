use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api_client::ScholarshipApi;
use crate::attempt::{Attempt, AttemptSlot};
use crate::models::essay::{CompareRequest, EssayComparison, EssayRequest, EssayType, GeneratedEssay};
use crate::models::persona::ScholarshipPersona;
use crate::models::scholarship::{ScholarshipId, ScholarshipSummary, StudentId, StudentSummary};

const LOADING: &str = "Loading scholarships and students...";
const ANALYZING: &str = "Analyzing scholarship personality...";
const GENERATING: &str = "Generating adaptive essay with AI...";
const COMPARING: &str = "Comparing against a baseline essay...";

const LOAD_FAILED: &str = "Failed to load data. Make sure backend is running!";
const ANALYZE_FALLBACK: &str = "Failed to analyze scholarship";
const GENERATE_FALLBACK: &str = "Failed to generate essay";
const COMPARE_FALLBACK: &str = "Failed to compare essays";

/// The single busy indicator of the demo screen. While `Running`, every
/// action is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "description", rename_all = "snake_case")]
pub enum BusyStatus {
    #[default]
    Idle,
    Running(String),
}

impl BusyStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, BusyStatus::Running(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemoState {
    pub loaded: bool,
    pub scholarships: Vec<ScholarshipSummary>,
    pub students: Vec<StudentSummary>,
    pub selected_scholarship: Option<ScholarshipId>,
    pub selected_student: Option<StudentId>,
    pub persona: Option<ScholarshipPersona>,
    pub essay: Option<GeneratedEssay>,
    pub baseline_essay: Option<GeneratedEssay>,
    pub comparison: Option<EssayComparison>,
    pub status: BusyStatus,
    pub error: Option<String>,
}

impl DemoState {
    pub fn scholarship(&self) -> Option<&ScholarshipSummary> {
        let id = self.selected_scholarship?;
        self.scholarships.iter().find(|s| s.id == id)
    }

    pub fn student(&self) -> Option<&StudentSummary> {
        let id = self.selected_student?;
        self.students.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DemoError {
    #[error("Another request is still running")]
    Busy,

    #[error("The demo screen is no longer active")]
    TornDown,

    #[error("Unknown scholarship {0}")]
    UnknownScholarship(ScholarshipId),

    #[error("Unknown student {0}")]
    UnknownStudent(StudentId),

    #[error("Select a scholarship and a student first")]
    NothingSelected,

    #[error("Generate an adaptive essay before comparing")]
    NoEssayToCompare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// The message now shown as the screen's error.
    Failed(String),
    Cancelled,
}

/// Sequences the persona and essay calls of the demo screen.
///
/// Same shape as `UploadWorkflow`: watch-channel state, guards applied in a
/// single `send_if_modified`, every call raced against the attempt token.
pub struct DemoWorkflow {
    api: Arc<dyn ScholarshipApi>,
    state: watch::Sender<DemoState>,
    attempts: AttemptSlot,
}

impl DemoWorkflow {
    pub fn new(api: Arc<dyn ScholarshipApi>) -> Self {
        let (state, _) = watch::channel(DemoState::default());
        Self {
            api,
            state,
            attempts: AttemptSlot::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DemoState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DemoState {
        self.state.borrow().clone()
    }

    fn ensure_alive(&self) -> Result<(), DemoError> {
        if self.attempts.is_torn_down() {
            Err(DemoError::TornDown)
        } else {
            Ok(())
        }
    }

    /// Captures the action's inputs and marks the screen busy in one step,
    /// or rejects the action if something is already running.
    fn begin<T>(
        &self,
        inputs: impl FnOnce(&DemoState) -> Result<T, DemoError>,
        description: impl FnOnce(&T) -> &'static str,
    ) -> Result<(Attempt, T), DemoError> {
        self.ensure_alive()?;
        let mut outcome = Err(DemoError::Busy);
        self.state.send_if_modified(|state| {
            if state.status.is_busy() {
                return false;
            }
            let captured = match inputs(state) {
                Ok(captured) => captured,
                Err(err) => {
                    outcome = Err(err);
                    return false;
                }
            };
            state.status = BusyStatus::Running(description(&captured).to_string());
            state.error = None;
            outcome = Ok((self.attempts.begin(), captured));
            true
        });
        outcome
    }

    fn apply(&self, attempt: &Attempt, transition: impl FnOnce(&mut DemoState)) -> bool {
        self.state.send_if_modified(|state| {
            if attempt.is_cancelled() {
                return false;
            }
            transition(state);
            true
        })
    }

    fn finish(&self, attempt: &Attempt, transition: impl FnOnce(&mut DemoState)) -> ActionOutcome {
        let applied = self.apply(attempt, |state| {
            transition(state);
            state.status = BusyStatus::Idle;
        });
        if applied {
            ActionOutcome::Completed
        } else {
            self.cancelled(attempt)
        }
    }

    fn fail(&self, attempt: &Attempt, message: String) -> ActionOutcome {
        let applied = self.apply(attempt, |state| {
            state.error = Some(message.clone());
            state.status = BusyStatus::Idle;
        });
        if applied {
            ActionOutcome::Failed(message)
        } else {
            self.cancelled(attempt)
        }
    }

    fn cancelled(&self, attempt: &Attempt) -> ActionOutcome {
        debug!(attempt = %attempt.id, "Demo action cancelled; response ignored");
        ActionOutcome::Cancelled
    }

    /// Fetches both lists concurrently. The first entry of each becomes the
    /// default selection unless the current one is still listed.
    pub async fn load(&self) -> Result<ActionOutcome, DemoError> {
        let (attempt, ()) = self.begin(|_| Ok(()), |_| LOADING)?;

        let fetched = attempt
            .run(async { tokio::join!(self.api.list_scholarships(), self.api.list_students()) })
            .await;
        let (scholarships, students) = match fetched {
            None => return Ok(self.cancelled(&attempt)),
            Some((Ok(scholarships), Ok(students))) => (scholarships, students),
            Some((Err(err), _)) | Some((_, Err(err))) => {
                warn!(attempt = %attempt.id, "Loading demo data failed: {err}");
                return Ok(self.fail(&attempt, LOAD_FAILED.to_string()));
            }
        };

        info!(
            "Loaded {} scholarships and {} students",
            scholarships.len(),
            students.len()
        );
        Ok(self.finish(&attempt, |state| {
            if !state
                .selected_scholarship
                .is_some_and(|id| scholarships.iter().any(|s| s.id == id))
            {
                state.selected_scholarship = scholarships.first().map(|s| s.id);
                state.persona = None;
            }
            if !state
                .selected_student
                .is_some_and(|id| students.iter().any(|s| s.id == id))
            {
                state.selected_student = students.first().map(|s| s.id);
            }
            state.scholarships = scholarships;
            state.students = students;
            state.loaded = true;
        }))
    }

    pub fn select_scholarship(&self, id: ScholarshipId) -> Result<(), DemoError> {
        self.select(Some(id), None)
    }

    pub fn select_student(&self, id: StudentId) -> Result<(), DemoError> {
        self.select(None, Some(id))
    }

    /// Applies both choices in one step. Every given id is checked before
    /// anything changes, so an unknown id leaves the selection as it was.
    ///
    /// Selecting another scholarship drops its persona, since it describes
    /// the previous scholarship. Any change drops the comparison.
    pub fn select(
        &self,
        scholarship: Option<ScholarshipId>,
        student: Option<StudentId>,
    ) -> Result<(), DemoError> {
        self.ensure_alive()?;
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            if state.status.is_busy() {
                outcome = Err(DemoError::Busy);
                return false;
            }
            if let Some(id) = scholarship.filter(|id| !state.scholarships.iter().any(|s| s.id == *id)) {
                outcome = Err(DemoError::UnknownScholarship(id));
                return false;
            }
            if let Some(id) = student.filter(|id| !state.students.iter().any(|s| s.id == *id)) {
                outcome = Err(DemoError::UnknownStudent(id));
                return false;
            }

            let mut changed = false;
            if let Some(id) = scholarship.filter(|id| state.selected_scholarship != Some(*id)) {
                state.selected_scholarship = Some(id);
                state.persona = None;
                changed = true;
            }
            if let Some(id) = student.filter(|id| state.selected_student != Some(*id)) {
                state.selected_student = Some(id);
                changed = true;
            }
            if changed {
                state.baseline_essay = None;
                state.comparison = None;
            }
            changed
        });
        outcome
    }

    pub async fn analyze(&self) -> Result<ActionOutcome, DemoError> {
        let (attempt, scholarship_id) = self.begin(
            |state| state.selected_scholarship.ok_or(DemoError::NothingSelected),
            |_| ANALYZING,
        )?;
        Ok(self.run_analyze(&attempt, scholarship_id, true).await)
    }

    /// Generates the adaptive essay, running the analysis first when no
    /// persona is stored. A failed analysis ends the action before the
    /// essay call is made.
    pub async fn generate(&self) -> Result<ActionOutcome, DemoError> {
        let (attempt, ((scholarship_id, student_id), has_persona)) = self.begin(
            |state| Ok((selected_pair(state)?, state.persona.is_some())),
            |(_, has_persona)| if *has_persona { GENERATING } else { ANALYZING },
        )?;

        if !has_persona {
            match self.run_analyze(&attempt, scholarship_id, false).await {
                ActionOutcome::Completed => {}
                other => return Ok(other),
            }
            if !self.apply(&attempt, |state| {
                state.status = BusyStatus::Running(GENERATING.to_string())
            }) {
                return Ok(self.cancelled(&attempt));
            }
        }

        let request = EssayRequest {
            scholarship_id,
            student_id,
            essay_type: EssayType::Adaptive,
        };
        info!(attempt = %attempt.id, "Generating essay for scholarship {scholarship_id}, student {student_id}");
        match attempt.run(self.api.generate_essay(&request)).await {
            None => Ok(self.cancelled(&attempt)),
            Some(Ok(essay)) => Ok(self.finish(&attempt, |state| {
                state.essay = Some(essay);
                state.baseline_essay = None;
                state.comparison = None;
            })),
            Some(Err(err)) => {
                warn!(attempt = %attempt.id, "Essay generation failed: {err}");
                Ok(self.fail(&attempt, err.user_message(GENERATE_FALLBACK)))
            }
        }
    }

    /// Generates a baseline essay for the same pair and asks the backend to
    /// score the stored adaptive essay against it.
    pub async fn compare(&self) -> Result<ActionOutcome, DemoError> {
        let (attempt, ((scholarship_id, student_id), adaptive)) = self.begin(
            |state| {
                let pair = selected_pair(state)?;
                let essay = state.essay.clone().ok_or(DemoError::NoEssayToCompare)?;
                Ok((pair, essay))
            },
            |_| COMPARING,
        )?;

        let request = EssayRequest {
            scholarship_id,
            student_id,
            essay_type: EssayType::Baseline,
        };
        let baseline = match attempt.run(self.api.generate_essay(&request)).await {
            None => return Ok(self.cancelled(&attempt)),
            Some(Ok(baseline)) => baseline,
            Some(Err(err)) => {
                warn!(attempt = %attempt.id, "Baseline essay failed: {err}");
                return Ok(self.fail(&attempt, err.user_message(COMPARE_FALLBACK)));
            }
        };

        let request = CompareRequest {
            scholarship_id,
            adaptive_essay: adaptive.paragraph_texts(),
            baseline_essay: baseline.paragraph_texts(),
        };
        match attempt.run(self.api.compare_essays(&request)).await {
            None => Ok(self.cancelled(&attempt)),
            Some(Ok(comparison)) => {
                info!(attempt = %attempt.id, "Alignment gain {:.2}", comparison.alignment_gain);
                Ok(self.finish(&attempt, |state| {
                    state.baseline_essay = Some(baseline);
                    state.comparison = Some(comparison);
                }))
            }
            Some(Err(err)) => {
                warn!(attempt = %attempt.id, "Essay comparison failed: {err}");
                Ok(self.fail(&attempt, err.user_message(COMPARE_FALLBACK)))
            }
        }
    }

    /// Runs the persona call under `attempt`. With `last_step` the busy
    /// status is released on success; otherwise the caller continues.
    async fn run_analyze(
        &self,
        attempt: &Attempt,
        scholarship_id: ScholarshipId,
        last_step: bool,
    ) -> ActionOutcome {
        info!(attempt = %attempt.id, "Analyzing scholarship {scholarship_id}");
        match attempt.run(self.api.analyze_scholarship(scholarship_id)).await {
            None => self.cancelled(attempt),
            Some(Ok(persona)) => {
                debug!(attempt = %attempt.id, "Persona: {}", persona.name);
                if last_step {
                    self.finish(attempt, |state| state.persona = Some(persona))
                } else if self.apply(attempt, |state| state.persona = Some(persona)) {
                    ActionOutcome::Completed
                } else {
                    self.cancelled(attempt)
                }
            }
            Some(Err(err)) => {
                warn!(attempt = %attempt.id, "Persona analysis failed: {err}");
                self.fail(attempt, err.user_message(ANALYZE_FALLBACK))
            }
        }
    }

    /// Aborts the action in flight, leaving the results from before it.
    pub fn cancel(&self) {
        self.state.send_if_modified(|state| {
            if !state.status.is_busy() {
                return false;
            }
            self.attempts.cancel_current();
            state.status = BusyStatus::Idle;
            true
        });
    }

    pub fn teardown(&self) {
        self.attempts.teardown();
        debug!("Demo screen torn down");
    }
}

fn selected_pair(state: &DemoState) -> Result<(ScholarshipId, StudentId), DemoError> {
    match (state.selected_scholarship, state.selected_student) {
        (Some(scholarship_id), Some(student_id)) => Ok((scholarship_id, student_id)),
        _ => Err(DemoError::NothingSelected),
    }
}
