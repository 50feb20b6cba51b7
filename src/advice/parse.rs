//! Parsing of generative-model replies into structured advice
//!
//! The model is asked for strict JSON, but real replies often arrive
//! wrapped in markdown code fences, and occasionally are not JSON at
//! all. Fences are stripped before parsing; unparseable replies are
//! surfaced as raw text instead of being dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches markdown code fences at line starts/ends, e.g. ```json ... ```
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```(?:json)?|```$").expect("fence regex"));

/// Structured agronomic advice.
///
/// The numbered JSON keys are the service's wire format; clients read
/// them verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdviceReport {
    #[serde(rename = "1. Explanation", default)]
    pub explanation: String,

    #[serde(rename = "2. Preventive Actions", default)]
    pub preventive_actions: Vec<String>,

    #[serde(rename = "3. Recommended Treatments", default)]
    pub recommended_treatments: Vec<String>,

    #[serde(rename = "4. Environmental and Watering Advice", default)]
    pub environmental_advice: Vec<String>,
}

/// A parsed model reply: structured advice, or the raw text when the
/// reply was not valid JSON after fence stripping
#[derive(Debug, Clone)]
pub enum AdviceReply {
    Structured(AdviceReport),
    Unstructured(String),
}

/// Remove markdown code fencing from a model reply
pub fn strip_code_fences(raw: &str) -> String {
    FENCE_RE.replace_all(raw.trim(), "").trim().to_string()
}

/// Parse a model reply into structured advice, falling back to the raw
/// text when it is not valid JSON
pub fn parse_reply(raw: &str) -> AdviceReply {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<AdviceReport>(&cleaned) {
        Ok(report) => AdviceReply::Structured(report),
        Err(_) => AdviceReply::Unstructured(raw.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "1. Explanation": "A fungal infection is spreading on the leaves.",
        "2. Preventive Actions": ["Remove fallen leaves", "Improve airflow"],
        "3. Recommended Treatments": ["Apply copper fungicide"],
        "4. Environmental and Watering Advice": ["Water at the base only"]
    }"#;

    #[test]
    fn test_strip_fences() {
        let fenced = format!("```json\n{}\n```", SAMPLE);
        let cleaned = strip_code_fences(&fenced);
        assert!(cleaned.starts_with('{'));
        assert!(cleaned.ends_with('}'));
        assert!(!cleaned.contains("```"));
    }

    #[test]
    fn test_strip_fences_without_language_tag() {
        let fenced = format!("```\n{}\n```", SAMPLE);
        let cleaned = strip_code_fences(&fenced);
        assert!(!cleaned.contains("```"));
    }

    #[test]
    fn test_parse_structured() {
        let reply = parse_reply(SAMPLE);
        match reply {
            AdviceReply::Structured(report) => {
                assert!(report.explanation.contains("fungal"));
                assert_eq!(report.preventive_actions.len(), 2);
                assert_eq!(report.recommended_treatments.len(), 1);
            }
            AdviceReply::Unstructured(_) => panic!("expected structured reply"),
        }
    }

    #[test]
    fn test_parse_fenced_structured() {
        let fenced = format!("```json\n{}\n```", SAMPLE);
        assert!(matches!(parse_reply(&fenced), AdviceReply::Structured(_)));
    }

    #[test]
    fn test_parse_partial_json_uses_defaults() {
        let partial = r#"{"1. Explanation": "Looks healthy."}"#;
        match parse_reply(partial) {
            AdviceReply::Structured(report) => {
                assert_eq!(report.explanation, "Looks healthy.");
                assert!(report.preventive_actions.is_empty());
            }
            AdviceReply::Unstructured(_) => panic!("expected structured reply"),
        }
    }

    #[test]
    fn test_parse_non_json_falls_back_to_raw() {
        let reply = parse_reply("I am sorry, I cannot help with that.");
        match reply {
            AdviceReply::Unstructured(text) => assert!(text.contains("sorry")),
            AdviceReply::Structured(_) => panic!("expected unstructured reply"),
        }
    }

    #[test]
    fn test_report_serializes_numbered_keys() {
        let report = AdviceReport {
            explanation: "x".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("1. Explanation").is_some());
        assert!(json.get("4. Environmental and Watering Advice").is_some());
    }
}
