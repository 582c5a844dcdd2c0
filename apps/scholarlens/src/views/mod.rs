//! Server-rendered screens. Each page is an askama template fed a flat view
//! model, so templates never branch on workflow types directly.

pub mod demo;
pub mod profile;

use askama::Template;
use axum::response::Html;

use crate::errors::AppError;

#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingPage {}

/// One of the workspace screens that is not built yet.
#[derive(Template)]
#[template(path = "placeholder.html")]
pub struct PlaceholderPage {
    pub title: &'static str,
}

pub fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

/// `0.856` → `86`.
pub(crate) fn percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().max(0.0) as u32
}

/// Whole dollars with thousands separators, e.g. `$12,500`.
pub(crate) fn dollars(amount: f64) -> String {
    let whole = amount.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
