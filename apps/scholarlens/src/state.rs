use std::sync::Arc;

use tracing::info;

use crate::api_client::ScholarshipApi;
use crate::config::Config;
use crate::demo::workflow::DemoWorkflow;
use crate::upload::workflow::UploadWorkflow;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// One demo session and one upload session: the site serves a single visitor
/// and keeps nothing between restarts.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub demo: Arc<DemoWorkflow>,
    pub upload: Arc<UploadWorkflow>,
}

impl AppState {
    /// `api` is the backend both workflows share. Default: `ApiClient`; tests
    /// pass a scripted double.
    pub fn new(config: Config, api: Arc<dyn ScholarshipApi>) -> Self {
        let upload = UploadWorkflow::new(Arc::clone(&api)).on_extracted(|profile| {
            info!(
                "Profile ready for review: {} ({} skills, {}% confidence)",
                profile.name,
                profile.skills.len(),
                profile.confidence_percent()
            );
        });
        Self {
            config,
            demo: Arc::new(DemoWorkflow::new(api)),
            upload: Arc::new(upload),
        }
    }

    /// Stops both workflows. In-flight backend responses are discarded.
    pub fn teardown(&self) {
        self.demo.teardown();
        self.upload.teardown();
    }
}
