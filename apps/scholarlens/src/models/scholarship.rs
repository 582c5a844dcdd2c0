use std::fmt;

use serde::{Deserialize, Serialize};

use super::null_as_default;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScholarshipId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub i64);

impl fmt::Display for ScholarshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scholarship as listed by `GET /demo/scholarships`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipSummary {
    pub id: ScholarshipId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organization: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: f64,
}

impl ScholarshipSummary {
    /// First 150 characters of the description, as shown under the selector.
    pub fn blurb(&self) -> String {
        let mut chars = self.description.chars();
        let head: String = chars.by_ref().take(150).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// A sample student profile as listed by `GET /demo/students`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: StudentId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gpa: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub goals: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scholarship_tolerates_null_fields() {
        let json = r#"{"id": 3, "name": "STEM Leaders", "organization": null, "description": "Builds things", "amount": null}"#;
        let s: ScholarshipSummary = serde_json::from_str(json).unwrap();
        assert_eq!(s.id, ScholarshipId(3));
        assert_eq!(s.organization, "");
        assert_eq!(s.amount, 0.0);
    }

    #[test]
    fn test_blurb_truncates_long_descriptions() {
        let s = ScholarshipSummary {
            id: ScholarshipId(1),
            name: "Long".into(),
            organization: String::new(),
            description: "x".repeat(200),
            amount: 0.0,
        };
        let blurb = s.blurb();
        assert!(blurb.ends_with("..."));
        assert_eq!(blurb.chars().count(), 153);
    }

    #[test]
    fn test_blurb_keeps_short_descriptions() {
        let s = ScholarshipSummary {
            id: ScholarshipId(1),
            name: "Short".into(),
            organization: String::new(),
            description: "Supports first-generation students.".into(),
            amount: 5000.0,
        };
        assert_eq!(s.blurb(), "Supports first-generation students.");
    }

    #[test]
    fn test_student_defaults_missing_lists() {
        let s: StudentSummary = serde_json::from_str(r#"{"id": 5, "name": "Ada", "gpa": 3.9}"#).unwrap();
        assert_eq!(s.id, StudentId(5));
        assert!(s.activities.is_empty());
        assert!(s.goals.is_empty());
    }
}
