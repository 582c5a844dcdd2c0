//! ScholarLens API client, the single point of entry for calls to the remote backend.
//!
//! ARCHITECTURAL RULE: workflows talk to the backend through `ScholarshipApi` only.
//! `ApiClient` is the reqwest implementation used in production.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::essay::{CompareRequest, EssayComparison, EssayRequest, GeneratedEssay};
use crate::models::persona::ScholarshipPersona;
use crate::models::resume::{ExtractedProfile, ResumeFile, PDF_MIME};
use crate::models::scholarship::{ScholarshipId, ScholarshipSummary, StudentId, StudentSummary};

pub mod progress;

pub use progress::{ProgressFn, UploadProgress};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Request rejected by server: {0}")]
    Rejected(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl ApiError {
    /// Message shown to the user: the server's `detail` verbatim when it sent
    /// one, otherwise the call site's fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Api {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// The remote operations the workflows depend on.
///
/// Both workflows hold it as `Arc<dyn ScholarshipApi>`.
#[async_trait]
pub trait ScholarshipApi: Send + Sync {
    async fn list_scholarships(&self) -> Result<Vec<ScholarshipSummary>, ApiError>;

    async fn list_students(&self) -> Result<Vec<StudentSummary>, ApiError>;

    async fn analyze_scholarship(
        &self,
        scholarship_id: ScholarshipId,
    ) -> Result<ScholarshipPersona, ApiError>;

    async fn generate_essay(&self, request: &EssayRequest) -> Result<GeneratedEssay, ApiError>;

    async fn compare_essays(&self, request: &CompareRequest)
        -> Result<EssayComparison, ApiError>;

    /// Single binary transfer of `file`. `progress` sees bytes sent of this transfer.
    async fn upload_resume(
        &self,
        student_id: StudentId,
        file: &ResumeFile,
        progress: ProgressFn,
    ) -> Result<(), ApiError>;

    async fn extract_from_resume(&self, student_id: StudentId)
        -> Result<ExtractedProfile, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ScholarshipsEnvelope {
    scholarships: Vec<ScholarshipSummary>,
}

#[derive(Debug, Deserialize)]
struct StudentsEnvelope {
    students: Vec<StudentSummary>,
}

#[derive(Debug, Deserialize)]
struct PersonaEnvelope {
    persona: ScholarshipPersona,
}

#[derive(Debug, Deserialize)]
struct EssayEnvelope {
    essay: GeneratedEssay,
}

#[derive(Debug, Deserialize)]
struct EvaluationEnvelope {
    evaluation: EssayComparison,
}

#[derive(Debug, Deserialize)]
struct SuccessEnvelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// reqwest-backed `ScholarshipApi`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the versioned API root, e.g. `http://localhost:8000/api/v1`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn demo_url(&self, path: &str) -> String {
        format!("{}/demo/{path}", self.base_url)
    }

    fn profiles_url(&self, path: &str) -> String {
        format!("{}/profiles/{path}", self.base_url)
    }

    /// `GET /health` on the server root (the base URL minus its `/api/...` suffix).
    pub async fn health(&self) -> Result<String, ApiError> {
        let root = self
            .base_url
            .split("/api/")
            .next()
            .unwrap_or(&self.base_url);
        let body: HealthBody = self
            .send_json(self.client.get(format!("{root}/health")))
            .await?;
        Ok(body.status)
    }

    /// Sends the request and decodes a 2xx body. Anything else becomes
    /// `ApiError::Api`, carrying the FastAPI-style `detail` string when present.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.detail)
                .and_then(|d| d.as_str().map(String::from));
            warn!("API {} returned {}: {}", url, status, body);
            return Err(ApiError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        debug!("API {} returned {} ({} bytes)", url, status, body.len());
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ScholarshipApi for ApiClient {
    async fn list_scholarships(&self) -> Result<Vec<ScholarshipSummary>, ApiError> {
        let envelope: ScholarshipsEnvelope = self
            .send_json(self.client.get(self.demo_url("scholarships")))
            .await?;
        Ok(envelope.scholarships)
    }

    async fn list_students(&self) -> Result<Vec<StudentSummary>, ApiError> {
        let envelope: StudentsEnvelope = self
            .send_json(self.client.get(self.demo_url("students")))
            .await?;
        Ok(envelope.students)
    }

    async fn analyze_scholarship(
        &self,
        scholarship_id: ScholarshipId,
    ) -> Result<ScholarshipPersona, ApiError> {
        let request = self
            .client
            .post(self.demo_url("analyze-scholarship"))
            .query(&[("scholarship_id", scholarship_id.0)]);
        let envelope: PersonaEnvelope = self.send_json(request).await?;
        envelope
            .persona
            .validate()
            .map_err(ApiError::InvalidPayload)?;
        Ok(envelope.persona)
    }

    async fn generate_essay(&self, request: &EssayRequest) -> Result<GeneratedEssay, ApiError> {
        let envelope: EssayEnvelope = self
            .send_json(self.client.post(self.demo_url("generate-essay")).json(request))
            .await?;
        envelope.essay.validate().map_err(ApiError::InvalidPayload)?;
        Ok(envelope.essay)
    }

    async fn compare_essays(
        &self,
        request: &CompareRequest,
    ) -> Result<EssayComparison, ApiError> {
        let envelope: EvaluationEnvelope = self
            .send_json(self.client.post(self.demo_url("compare-essays")).json(request))
            .await?;
        envelope
            .evaluation
            .validate()
            .map_err(ApiError::InvalidPayload)?;
        Ok(envelope.evaluation)
    }

    async fn upload_resume(
        &self,
        student_id: StudentId,
        file: &ResumeFile,
        progress: ProgressFn,
    ) -> Result<(), ApiError> {
        let body = progress::progress_body(file.bytes.clone(), progress);
        let part = Part::stream_with_length(body, file.size_bytes)
            .file_name(file.file_name.clone())
            .mime_str(PDF_MIME)?;
        let request = self
            .client
            .post(self.profiles_url("upload-resume"))
            .query(&[("student_id", student_id.0)])
            .multipart(Form::new().part("file", part));

        let envelope: SuccessEnvelope<serde_json::Value> = self.send_json(request).await?;
        if !envelope.success {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "upload was not accepted".to_string()),
            ));
        }
        Ok(())
    }

    async fn extract_from_resume(
        &self,
        student_id: StudentId,
    ) -> Result<ExtractedProfile, ApiError> {
        let request = self
            .client
            .post(self.profiles_url(&format!("extract-from-resume/{student_id}")));
        let envelope: SuccessEnvelope<ExtractedProfile> = self.send_json(request).await?;
        let profile = match envelope {
            SuccessEnvelope {
                success: true,
                data: Some(profile),
                ..
            } => profile,
            SuccessEnvelope { message, .. } => {
                return Err(ApiError::Rejected(
                    message.unwrap_or_else(|| "extraction returned no profile".to_string()),
                ))
            }
        };
        profile.validate().map_err(ApiError::InvalidPayload)?;
        Ok(profile)
    }
}
