use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_unit_interval, null_as_default};

pub const PDF_MIME: &str = "application/pdf";

/// A resume document that has passed client-side validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeFile {
    pub file_name: String,
    pub size_bytes: u64,
    #[serde(skip)]
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            size_bytes: bytes.len() as u64,
            bytes,
        }
    }

    /// Size formatted the way the drop zone shows it, e.g. `2.00 MB`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Structured profile returned by `POST /profiles/extract-from-resume/{id}`.
///
/// Education and work records are free-form objects whose shape the
/// extraction model decides, so they stay as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gpa: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub work_experience: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub certifications: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub awards: Vec<String>,
    #[serde(rename = "extraction_confidence", default, deserialize_with = "null_as_default")]
    pub confidence: f64,
}

impl ExtractedProfile {
    pub fn validate(&self) -> Result<(), String> {
        check_unit_interval("extraction_confidence", self.confidence)
    }

    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }

    /// The first `limit` skills and how many were left out.
    pub fn skill_preview(&self, limit: usize) -> (&[String], usize) {
        let shown = self.skills.len().min(limit);
        (&self.skills[..shown], self.skills.len() - shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parses_backend_shape_with_nulls() {
        let json = r#"{
            "student_id": 7, "name": "Ada", "email": null, "gpa": null,
            "skills": ["Python"], "education": [{"institution": "MIT"}],
            "work_experience": null, "activities": [], "achievements": [],
            "extraction_confidence": 0.92
        }"#;
        let profile: ExtractedProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.email, "");
        assert_eq!(profile.gpa, None);
        assert!(profile.work_experience.is_empty());
        assert!(profile.languages.is_empty());
        assert_eq!(profile.confidence_percent(), 92);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_profile_rejects_confidence_above_one() {
        let profile = ExtractedProfile {
            confidence: 1.5,
            ..Default::default()
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_skill_preview_counts_hidden_skills() {
        let profile = ExtractedProfile {
            skills: ["Rust", "Python", "SQL", "Go", "C", "Haskell", "Lean"]
                .map(String::from)
                .to_vec(),
            ..Default::default()
        };
        let (shown, hidden) = profile.skill_preview(5);
        assert_eq!(shown.len(), 5);
        assert_eq!(hidden, 2);
    }

    #[test]
    fn test_resume_file_size_label() {
        let file = ResumeFile::new("resume.pdf", Bytes::from(vec![0u8; 2 * 1024 * 1024]));
        assert_eq!(file.size_bytes, 2 * 1024 * 1024);
        assert_eq!(file.size_label(), "2.00 MB");
    }
}
