pub mod demo;
pub mod health;
pub mod pages;
pub mod profile;

use axum::{
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::upload::validation::MAX_RESUME_BYTES;

/// Multipart framing on top of the largest accepted resume. The upload
/// handler turns a body cut off at this limit into the size rejection.
const RESUME_BODY_LIMIT: usize = 2 * MAX_RESUME_BYTES as usize;

async fn to_landing() -> Redirect {
    Redirect::to("/")
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Screens
        .route("/", get(pages::landing))
        .route("/workspace", get(pages::workspace))
        .route("/draft", get(pages::draft))
        .route("/comparison", get(pages::comparison))
        .route("/insights", get(pages::insights))
        // Persona/essay demo
        .route("/demo", get(demo::show))
        .route("/demo/select", post(demo::select))
        .route("/demo/analyze", post(demo::analyze))
        .route("/demo/generate", post(demo::generate))
        .route("/demo/compare", post(demo::compare))
        .route("/demo/cancel", post(demo::cancel))
        // Resume upload
        .route("/profile", get(profile::show))
        .route(
            "/profile/resume",
            post(profile::upload).layer(DefaultBodyLimit::max(RESUME_BODY_LIMIT)),
        )
        .route("/profile/resume/reset", post(profile::reset))
        .route("/profile/resume/cancel", post(profile::cancel))
        .route("/profile/resume/status", get(profile::status))
        .fallback(to_landing)
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{body::Body, http::Request, response::Response, Router};
    use tower::ServiceExt;

    use super::build_router;
    use crate::config::Config;
    use crate::state::AppState;
    use crate::testing::ScriptedApi;

    pub fn app_with(api: ScriptedApi) -> (Router, AppState, Arc<ScriptedApi>) {
        let api = Arc::new(api);
        let config = Config {
            api_base_url: "http://backend.test/api/v1".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            http_timeout: Duration::from_secs(5),
        };
        let state = AppState::new(config, api.clone());
        (build_router(state.clone()), state, api)
    }

    pub async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    pub async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    pub fn post_form(uri: &str, form: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }
}
