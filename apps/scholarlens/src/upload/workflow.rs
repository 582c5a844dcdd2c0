use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api_client::{ProgressFn, ScholarshipApi, UploadProgress};
use crate::attempt::{Attempt, AttemptSlot};
use crate::models::resume::{ExtractedProfile, ResumeFile};
use crate::models::scholarship::StudentId;
use crate::upload::validation::{validate_candidates, CandidateFile, FileRejection};

const UPLOAD_FALLBACK: &str = "Upload failed. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    FileSelected,
    Uploading,
    Extracting,
    Succeeded,
    Failed,
}

impl UploadPhase {
    pub fn is_in_flight(self) -> bool {
        matches!(self, UploadPhase::Uploading | UploadPhase::Extracting)
    }
}

/// Snapshot of the resume widget.
///
/// `upload_progress` is only meaningful while uploading (it stays at 100
/// through extraction). `error_message` is set on `Failed`, or on `Idle`
/// after a rejected selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadState {
    pub selected_file: Option<ResumeFile>,
    pub upload_progress: u8,
    pub phase: UploadPhase,
    pub error_message: Option<String>,
    pub profile: Option<ExtractedProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("A resume upload is already in progress")]
    Busy,

    #[error("The upload widget is no longer active")]
    TornDown,

    #[error(transparent)]
    Rejected(#[from] FileRejection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// No student id or no selected file; nothing happened.
    NotStarted,
    Succeeded(ExtractedProfile),
    Failed(String),
    Cancelled,
}

pub type ExtractedCallback = Box<dyn Fn(&ExtractedProfile) + Send + Sync>;

/// Drives one resume through upload then extraction.
///
/// State lives in a watch channel. Every guard and transition is a single
/// `send_if_modified` call, so no lock is held across a network await and
/// a reset can never interleave with a half-applied transition.
pub struct UploadWorkflow {
    api: Arc<dyn ScholarshipApi>,
    state: Arc<watch::Sender<UploadState>>,
    attempts: AttemptSlot,
    on_extracted: Option<ExtractedCallback>,
}

impl UploadWorkflow {
    pub fn new(api: Arc<dyn ScholarshipApi>) -> Self {
        let (state, _) = watch::channel(UploadState::default());
        Self {
            api,
            state: Arc::new(state),
            attempts: AttemptSlot::default(),
            on_extracted: None,
        }
    }

    /// Called exactly once per successful extraction, after state is updated.
    pub fn on_extracted(mut self, callback: impl Fn(&ExtractedProfile) + Send + Sync + 'static) -> Self {
        self.on_extracted = Some(Box::new(callback));
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> UploadState {
        self.state.borrow().clone()
    }

    fn ensure_alive(&self) -> Result<(), UploadError> {
        if self.attempts.is_torn_down() {
            Err(UploadError::TornDown)
        } else {
            Ok(())
        }
    }

    /// Validates and selects a file. A rejection returns the widget to `Idle`
    /// with the rejection message and never touches the network.
    pub fn select_file(&self, candidates: Vec<CandidateFile>) -> Result<(), UploadError> {
        self.settle_selection(validate_candidates(candidates))
    }

    /// Records a rejection found before the files could be collected, such
    /// as a body cut off at the size ceiling.
    pub fn reject_file(&self, rejection: FileRejection) -> Result<(), UploadError> {
        self.settle_selection(Err(rejection))
    }

    fn settle_selection(&self, validated: Result<ResumeFile, FileRejection>) -> Result<(), UploadError> {
        self.ensure_alive()?;

        let mut busy = false;
        self.state.send_if_modified(|state| {
            if state.phase.is_in_flight() {
                busy = true;
                return false;
            }
            *state = match &validated {
                Ok(file) => UploadState {
                    selected_file: Some(file.clone()),
                    phase: UploadPhase::FileSelected,
                    ..UploadState::default()
                },
                Err(rejection) => UploadState {
                    error_message: Some(rejection.to_string()),
                    ..UploadState::default()
                },
            };
            true
        });
        if busy {
            return Err(UploadError::Busy);
        }

        match validated {
            Ok(file) => {
                debug!("Resume selected: {} ({} bytes)", file.file_name, file.size_bytes);
                Ok(())
            }
            Err(rejection) => {
                debug!("Resume rejected: {rejection}");
                Err(rejection.into())
            }
        }
    }

    /// Uploads the selected file for `student_id`, then asks the server to
    /// extract a profile from it.
    ///
    /// Without a student id this is a no-op. Starting while an attempt is in
    /// flight is rejected with `Busy`. A `Failed` attempt may be restarted
    /// with the same file.
    pub async fn start(&self, student_id: Option<StudentId>) -> Result<UploadOutcome, UploadError> {
        self.ensure_alive()?;
        let Some(student_id) = student_id else {
            debug!("Upload requested without a student id; ignoring");
            return Ok(UploadOutcome::NotStarted);
        };

        let mut busy = false;
        let mut started: Option<(ResumeFile, Attempt)> = None;
        self.state.send_if_modified(|state| {
            if state.phase.is_in_flight() {
                busy = true;
                return false;
            }
            let restartable = matches!(state.phase, UploadPhase::FileSelected | UploadPhase::Failed);
            match (&state.selected_file, restartable) {
                (Some(file), true) => {
                    started = Some((file.clone(), self.attempts.begin()));
                    state.phase = UploadPhase::Uploading;
                    state.upload_progress = 0;
                    state.error_message = None;
                    state.profile = None;
                    true
                }
                _ => false,
            }
        });
        if busy {
            return Err(UploadError::Busy);
        }
        let Some((file, attempt)) = started else {
            debug!("Upload requested without a selected file; ignoring");
            return Ok(UploadOutcome::NotStarted);
        };

        info!(
            attempt = %attempt.id,
            student_id = %student_id,
            "Uploading resume {} ({} bytes)",
            file.file_name,
            file.size_bytes
        );

        let uploaded = attempt
            .run(self.api.upload_resume(student_id, &file, self.progress_sink(&attempt)))
            .await;
        match uploaded {
            None => return Ok(self.cancelled(&attempt)),
            Some(Err(err)) => {
                warn!(attempt = %attempt.id, "Resume upload failed: {err}");
                return Ok(self.fail(&attempt, err.user_message(UPLOAD_FALLBACK)));
            }
            Some(Ok(())) => {}
        }

        let extracting = self.apply(&attempt, |state| {
            state.upload_progress = 100;
            state.phase = UploadPhase::Extracting;
        });
        if !extracting {
            return Ok(self.cancelled(&attempt));
        }
        info!(attempt = %attempt.id, "Resume uploaded; extracting profile");

        let profile = match attempt.run(self.api.extract_from_resume(student_id)).await {
            None => return Ok(self.cancelled(&attempt)),
            Some(Err(err)) => {
                warn!(attempt = %attempt.id, "Profile extraction failed: {err}");
                return Ok(self.fail(&attempt, err.user_message(UPLOAD_FALLBACK)));
            }
            Some(Ok(profile)) => profile,
        };

        let stored = self.apply(&attempt, |state| {
            state.phase = UploadPhase::Succeeded;
            state.profile = Some(profile.clone());
        });
        if !stored {
            return Ok(self.cancelled(&attempt));
        }
        info!(
            attempt = %attempt.id,
            "Profile extracted for {} (confidence {:.2})",
            profile.name,
            profile.confidence
        );
        if let Some(callback) = &self.on_extracted {
            callback(&profile);
        }
        Ok(UploadOutcome::Succeeded(profile))
    }

    /// Aborts the attempt in flight and returns to `FileSelected` with the
    /// same file. No-op when nothing is running.
    pub fn cancel(&self) {
        self.state.send_if_modified(|state| {
            if !state.phase.is_in_flight() {
                return false;
            }
            self.attempts.cancel_current();
            state.phase = UploadPhase::FileSelected;
            state.upload_progress = 0;
            true
        });
    }

    /// Back to `Idle` from any phase, aborting whatever is in flight.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.attempts.cancel_current();
            *state = UploadState::default();
        });
        debug!("Upload widget reset");
    }

    /// The owner is going away: abort in-flight work and refuse new actions.
    pub fn teardown(&self) {
        self.attempts.teardown();
        debug!("Upload widget torn down");
    }

    /// Applies `transition` unless the attempt was cancelled. The check runs
    /// under the channel's write lock, serialised against `reset`/`cancel`.
    fn apply(&self, attempt: &Attempt, transition: impl FnOnce(&mut UploadState)) -> bool {
        self.state.send_if_modified(|state| {
            if attempt.is_cancelled() {
                return false;
            }
            transition(state);
            true
        })
    }

    fn fail(&self, attempt: &Attempt, message: String) -> UploadOutcome {
        let applied = self.apply(attempt, |state| {
            state.phase = UploadPhase::Failed;
            state.error_message = Some(message.clone());
        });
        if applied {
            UploadOutcome::Failed(message)
        } else {
            self.cancelled(attempt)
        }
    }

    fn cancelled(&self, attempt: &Attempt) -> UploadOutcome {
        debug!(attempt = %attempt.id, "Upload attempt cancelled; response ignored");
        UploadOutcome::Cancelled
    }

    /// Progress only moves forward, and only while this attempt is uploading.
    fn progress_sink(&self, attempt: &Attempt) -> ProgressFn {
        let state = Arc::clone(&self.state);
        let attempt = attempt.clone();
        Arc::new(move |progress: UploadProgress| {
            let percent = progress.percent();
            state.send_if_modified(|s| {
                if attempt.is_cancelled()
                    || s.phase != UploadPhase::Uploading
                    || percent <= s.upload_progress
                {
                    return false;
                }
                s.upload_progress = percent;
                true
            });
        })
    }
}
