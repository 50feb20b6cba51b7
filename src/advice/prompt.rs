//! Prompt construction for the advice generator

/// Fallback text when the caller reported no symptoms
const NO_SYMPTOMS: &str = "No additional symptoms were reported.";

/// Build the advice prompt for a detected disease and reported symptoms.
///
/// The prompt demands a strict JSON reply whose numbered section keys
/// are part of the service's wire format; see [`crate::advice::parse`].
pub fn build_prompt(disease: &str, symptoms: Option<&str>) -> String {
    let symptoms = match symptoms {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => NO_SYMPTOMS,
    };

    format!(
        r#"You are an agricultural AI assistant.

The detected plant disease is "{disease}".
The observed symptoms are: {symptoms}

Provide your answer strictly in valid JSON format with the following structure:

{{
  "1. Explanation": "A short explanation of what is happening to the plant.",
  "2. Preventive Actions": ["Action 1", "Action 2", "Action 3"],
  "3. Recommended Treatments": ["Treatment 1", "Treatment 2", "Treatment 3"],
  "4. Environmental and Watering Advice": ["Advice 1", "Advice 2", "Advice 3"]
}}

Avoid any text outside JSON.
"#
    )
}
