use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    response::{Html, Redirect},
    Json,
};
use bytes::{Bytes, BytesMut};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::scholarship::StudentId;
use crate::state::AppState;
use crate::upload::validation::{reject_oversized, CandidateFile, FileRejection, MAX_RESUME_BYTES};
use crate::upload::workflow::{UploadError, UploadState};
use crate::views::{profile::ProfilePage, render};

/// GET /profile
pub async fn show(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render(&ProfilePage::from_state(&state.upload.snapshot()))
}

/// GET /profile/resume/status
pub async fn status(State(state): State<AppState>) -> Json<UploadState> {
    Json(state.upload.snapshot())
}

/// POST /profile/resume
///
/// Multipart fields: `file` (repeatable, all files are validated together)
/// and optional `student_id`. A posted file replaces the selection; without
/// one, the current selection is (re)started. Returns before the transfer
/// ends so the page can poll its progress.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut candidates = Vec::new();
    let mut student_id = None;
    let mut oversized = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) if is_too_large(&err) => {
                oversized = Some(FileRejection::TooLarge);
                break;
            }
            Err(err) => return Err(AppError::Validation(err.body_text())),
        };
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let Some(bytes) = read_file_part(field).await? else {
                    // the rest of the form is not read
                    oversized = Some(reject_oversized(&file_name));
                    break;
                };
                // browsers send an empty part when no file was picked
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                candidates.push(CandidateFile { file_name, bytes });
            }
            Some("student_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                student_id = parse_student_id(&raw)?;
            }
            other => debug!("Ignoring multipart field {other:?}"),
        }
    }

    let selected = match oversized {
        Some(rejection) => Some(state.upload.reject_file(rejection)),
        None if !candidates.is_empty() => Some(state.upload.select_file(candidates)),
        None => None,
    };
    match selected {
        None | Some(Ok(())) => {}
        // shown on the page
        Some(Err(UploadError::Rejected(_))) => return Ok(Redirect::to("/profile")),
        Some(Err(err)) => return Err(err.into()),
    }

    if state.upload.snapshot().phase.is_in_flight() {
        return Err(UploadError::Busy.into());
    }
    if student_id.is_some() {
        let mut changes = state.upload.subscribe();
        let upload = Arc::clone(&state.upload);
        let mut attempt = tokio::spawn(async move {
            match upload.start(student_id).await {
                Ok(outcome) => info!("Resume upload finished: {outcome:?}"),
                Err(err) => warn!("Resume upload not started: {err}"),
            }
        });
        // wait until the attempt is visible so the redirect lands on it
        tokio::select! {
            _ = changes.changed() => {}
            _ = &mut attempt => {}
        }
    }
    Ok(Redirect::to("/profile"))
}

/// POST /profile/resume/cancel
pub async fn cancel(State(state): State<AppState>) -> Redirect {
    state.upload.cancel();
    Redirect::to("/profile")
}

/// POST /profile/resume/reset
pub async fn reset(State(state): State<AppState>) -> Redirect {
    state.upload.reset();
    Redirect::to("/profile")
}

/// Buffers a file part, or returns `None` once it passes `MAX_RESUME_BYTES`
/// or the request body limit.
async fn read_file_part(mut field: Field<'_>) -> Result<Option<Bytes>, AppError> {
    let mut buf = BytesMut::new();
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if (buf.len() + chunk.len()) as u64 > MAX_RESUME_BYTES {
                    return Ok(None);
                }
                buf.extend_from_slice(&chunk);
            }
            Ok(None) => return Ok(Some(buf.freeze())),
            Err(err) if is_too_large(&err) => return Ok(None),
            Err(err) => return Err(AppError::Validation(err.body_text())),
        }
    }
}

fn is_too_large(err: &MultipartError) -> bool {
    err.status() == StatusCode::PAYLOAD_TOO_LARGE
}

fn parse_student_id(raw: &str) -> Result<Option<StudentId>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(|id| Some(StudentId(id)))
        .map_err(|_| AppError::Validation(format!("Invalid student id: {raw}")))
}
