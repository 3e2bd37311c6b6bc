use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Leading list markers the analysis service emits in front of skill and
/// feedback lines: "-", "•", "*", or an ordinal like "3.".
static LIST_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-•*]|\d+\.)\s*").expect("valid list prefix pattern"));

/// Success body of `POST /analyze-cv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeCvResponse {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    pub analysis: CvAnalysis,
}

/// The analysis payload. `skills` and `feedback` are newline-delimited blobs
/// kept verbatim; use [`CvAnalysis::skill_items`] / [`CvAnalysis::feedback_items`]
/// for cleaned-up lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvAnalysis {
    pub summary: String,
    pub skills: String,
    pub feedback: String,
}

impl CvAnalysis {
    pub fn skill_items(&self) -> Vec<String> {
        list_items(&self.skills)
    }

    pub fn feedback_items(&self) -> Vec<String> {
        list_items(&self.feedback)
    }
}

/// Error body of a non-2xx `POST /analyze-cv` response. The field is optional
/// on the wire; callers fall back to a generic message when it is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Splits a newline-delimited blob into trimmed, non-empty items with their
/// leading list markers removed.
pub fn list_items(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| LIST_PREFIX.replace(line, "").into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_skills_and_strips_bullet_markers() {
        let analysis = CvAnalysis {
            summary: String::new(),
            skills: "- SQL\n• Go\n* Rust\n\n  Kubernetes  \n".to_string(),
            feedback: String::new(),
        };
        assert_eq!(analysis.skill_items(), vec!["SQL", "Go", "Rust", "Kubernetes"]);
    }

    #[test]
    fn strips_ordinal_prefixes_from_feedback() {
        let analysis = CvAnalysis {
            summary: String::new(),
            skills: String::new(),
            feedback: "1. Add metrics\n12. Shorten summary\n- Use action verbs".to_string(),
        };
        assert_eq!(
            analysis.feedback_items(),
            vec!["Add metrics", "Shorten summary", "Use action verbs"]
        );
    }

    #[test]
    fn keeps_interior_punctuation_intact() {
        let analysis = CvAnalysis {
            summary: String::new(),
            skills: "C++ (11 years)\n- .NET".to_string(),
            feedback: String::new(),
        };
        assert_eq!(analysis.skill_items(), vec!["C++ (11 years)", ".NET"]);
    }

    #[test]
    fn decodes_response_without_candidate_name() {
        let raw = r#"{"filename":"cv.pdf","analysis":{"summary":"Good","skills":"- SQL","feedback":"1. Add metrics"}}"#;
        let response: AnalyzeCvResponse = serde_json::from_str(raw).expect("decode");
        assert_eq!(response.filename, "cv.pdf");
        assert_eq!(response.candidate_name, None);
        assert_eq!(response.analysis.summary, "Good");
    }

    #[test]
    fn error_body_tolerates_missing_field() {
        let body: ErrorBody = serde_json::from_str("{}").expect("decode");
        assert_eq!(body.error, None);

        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"Unsupported file"}"#).expect("decode");
        assert_eq!(body.error.as_deref(), Some("Unsupported file"));
    }
}
