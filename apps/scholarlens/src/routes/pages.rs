use axum::response::Html;

use crate::errors::AppError;
use crate::views::{render, LandingPage, PlaceholderPage};

/// GET /
pub async fn landing() -> Result<Html<String>, AppError> {
    render(&LandingPage {})
}

/// GET /workspace
pub async fn workspace() -> Result<Html<String>, AppError> {
    placeholder("Scholarship Workspace")
}

/// GET /draft
pub async fn draft() -> Result<Html<String>, AppError> {
    placeholder("Draft Studio")
}

/// GET /comparison
pub async fn comparison() -> Result<Html<String>, AppError> {
    placeholder("Essay Comparison")
}

/// GET /insights
pub async fn insights() -> Result<Html<String>, AppError> {
    placeholder("Insights Lab")
}

fn placeholder(title: &'static str) -> Result<Html<String>, AppError> {
    render(&PlaceholderPage { title })
}
