use askama::Template;

use crate::models::resume::ExtractedProfile;
use crate::upload::workflow::{UploadPhase, UploadState};

use super::percent;

const SKILL_PREVIEW: usize = 5;

pub struct SelectedFileView {
    pub name: String,
    pub size: String,
}

pub struct ExtractedView {
    pub confidence: u32,
    pub name: String,
    pub email: String,
    pub gpa: Option<String>,
    pub skills: String,
    pub more_skills: usize,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub file: Option<SelectedFileView>,
    pub error: Option<String>,
    pub uploading: bool,
    pub extracting: bool,
    pub progress: u8,
    pub extracted: Option<ExtractedView>,
    /// Whether the upload button is offered.
    pub can_start: bool,
}

impl ProfilePage {
    pub fn from_state(state: &UploadState) -> Self {
        let extracted = match (state.phase, &state.profile) {
            (UploadPhase::Succeeded, Some(profile)) => Some(extracted_view(profile)),
            _ => None,
        };
        Self {
            file: state.selected_file.as_ref().map(|f| SelectedFileView {
                name: f.file_name.clone(),
                size: f.size_label(),
            }),
            error: state.error_message.clone(),
            uploading: state.phase == UploadPhase::Uploading,
            extracting: state.phase == UploadPhase::Extracting,
            progress: state.upload_progress,
            extracted,
            can_start: matches!(state.phase, UploadPhase::FileSelected | UploadPhase::Failed),
        }
    }

    fn refresh(&self) -> bool {
        self.uploading || self.extracting
    }
}

fn extracted_view(profile: &ExtractedProfile) -> ExtractedView {
    let (skills, more_skills) = profile.skill_preview(SKILL_PREVIEW);
    ExtractedView {
        confidence: percent(profile.confidence),
        name: profile.name.clone(),
        email: profile.email.clone(),
        gpa: profile.gpa.map(|gpa| gpa.to_string()),
        skills: skills.join(", "),
        more_skills,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::models::resume::ResumeFile;
    use crate::testing::fixtures;

    #[test]
    fn test_uploading_shows_progress_and_polls() {
        let state = UploadState {
            selected_file: Some(ResumeFile::new("resume.pdf", Bytes::from(vec![0u8; 2 * 1024 * 1024]))),
            upload_progress: 40,
            phase: UploadPhase::Uploading,
            ..UploadState::default()
        };
        let page = ProfilePage::from_state(&state);
        assert!(page.refresh());
        assert!(!page.can_start);

        let html = page.render().unwrap();
        assert!(html.contains("resume.pdf"));
        assert!(html.contains("2.00 MB"));
        assert!(html.contains("width: 40%"));
        assert!(html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_rejection_message_is_shown_without_file() {
        let state = UploadState {
            error_message: Some("Invalid file type. Only PDF files are allowed".into()),
            ..UploadState::default()
        };
        let html = ProfilePage::from_state(&state).render().unwrap();
        assert!(html.contains("Invalid file type. Only PDF files are allowed"));
        assert!(html.contains("PDF only, max 10MB"));
        assert!(!html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_success_summarises_profile() {
        let mut profile = fixtures::profile();
        profile.skills = ["Python", "Rust", "SQL", "Go", "C", "Docker", "AWS"]
            .map(String::from)
            .to_vec();
        let state = UploadState {
            selected_file: Some(ResumeFile::new("resume.pdf", Bytes::from_static(b"%PDF"))),
            upload_progress: 100,
            phase: UploadPhase::Succeeded,
            profile: Some(profile),
            ..UploadState::default()
        };
        let page = ProfilePage::from_state(&state);
        let extracted = page.extracted.as_ref().unwrap();
        assert_eq!(extracted.confidence, 92);
        assert_eq!(extracted.skills, "Python, Rust, SQL, Go, C");
        assert_eq!(extracted.more_skills, 2);

        let html = page.render().unwrap();
        assert!(html.contains("Resume Extracted Successfully!"));
        assert!(html.contains("+2 more"));
    }
}
