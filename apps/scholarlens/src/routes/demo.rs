use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::demo::workflow::{ActionOutcome, DemoError, DemoWorkflow};
use crate::errors::AppError;
use crate::models::scholarship::{ScholarshipId, StudentId};
use crate::state::AppState;
use crate::views::{demo::DemoPage, render};

/// Either field may be left out to keep the current choice.
#[derive(Deserialize)]
pub struct SelectionForm {
    pub scholarship_id: Option<i64>,
    pub student_id: Option<i64>,
}

/// GET /demo
/// Until the lists have arrived, every view (re)starts loading them, so a
/// reload after a backend outage retries. The page polls while loading.
pub async fn show(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let snapshot = state.demo.snapshot();
    if snapshot.loaded || snapshot.status.is_busy() {
        return render(&DemoPage::from_state(&snapshot));
    }

    let mut changes = state.demo.subscribe();
    let demo = Arc::clone(&state.demo);
    let mut load = tokio::spawn(async move {
        if let Err(err) = demo.load().await {
            debug!("Demo load not started: {err}");
        }
    });
    // render the loading status rather than an empty form
    tokio::select! {
        _ = changes.changed() => {}
        _ = &mut load => {}
    }
    render(&DemoPage::from_state(&state.demo.snapshot()))
}

/// POST /demo/select
pub async fn select(
    State(state): State<AppState>,
    Form(form): Form<SelectionForm>,
) -> Result<Redirect, AppError> {
    let scholarship = form.scholarship_id.map(ScholarshipId);
    let student = form.student_id.map(StudentId);
    match (scholarship, student) {
        (Some(id), None) => state.demo.select_scholarship(id)?,
        (None, Some(id)) => state.demo.select_student(id)?,
        (scholarship, student) => state.demo.select(scholarship, student)?,
    }
    Ok(Redirect::to("/demo"))
}

/// POST /demo/cancel
pub async fn cancel(State(state): State<AppState>) -> Redirect {
    state.demo.cancel();
    Redirect::to("/demo")
}

/// POST /demo/analyze
pub async fn analyze(State(state): State<AppState>) -> Result<Redirect, AppError> {
    run_action(&state, "analyze", |demo| async move { demo.analyze().await }).await
}

/// POST /demo/generate
pub async fn generate(State(state): State<AppState>) -> Result<Redirect, AppError> {
    run_action(&state, "generate", |demo| async move { demo.generate().await }).await
}

/// POST /demo/compare
pub async fn compare(State(state): State<AppState>) -> Result<Redirect, AppError> {
    run_action(&state, "compare", |demo| async move { demo.compare().await }).await
}

/// Runs the action on its own task so a dropped request cannot leave the
/// screen stuck in `Running`. Backend failures are shown on the page, so
/// only precondition errors become HTTP errors.
async fn run_action<F, Fut>(state: &AppState, name: &str, action: F) -> Result<Redirect, AppError>
where
    F: FnOnce(Arc<DemoWorkflow>) -> Fut,
    Fut: Future<Output = Result<ActionOutcome, DemoError>> + Send + 'static,
{
    let outcome = tokio::spawn(action(Arc::clone(&state.demo)))
        .await
        .with_context(|| format!("demo {name} task failed"))??;
    info!("Demo {name} finished: {outcome:?}");
    Ok(Redirect::to("/demo"))
}
