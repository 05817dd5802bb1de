use serde::de::DeserializeOwned;

use crate::{
    error::GenerationError,
    models::{InteractiveQuery, PrecautionRequest},
};

pub const PRECAUTIONS_PREAMBLE: &str = "You are a careful medical assistant. You help patients prepare for an upcoming doctor consultation. You never diagnose; you suggest sensible precautions.";

pub const ADVISOR_PREAMBLE: &str = "You are MediAgent, a friendly voice assistant that helps patients with the precautions they were given before a doctor consultation.";

const PRECAUTIONS_OUTPUT_FORMAT: &str = r#"Respond with ONLY this JSON object and nothing else:
{
  "dietPrecautions": "dietary precautions to take before the consultation",
  "sleepPrecautions": "sleep-related precautions to take before the consultation",
  "physicalPrecautions": "physical precautions to take before the consultation",
  "mentalPrecautions": "mental precautions to take before the consultation",
  "thingsToAvoid": "things to avoid before the consultation"
}
Every field must be a plain string."#;

const ADVISOR_OUTPUT_FORMAT: &str = r#"Respond with ONLY this JSON object and nothing else:
{
  "responseText": "your answer to the patient"
}"#;

pub fn precautions_prompt(request: &PrecautionRequest) -> String {
    let report_section = if request.report_reference.is_some() {
        "\nThe patient's previous medical report is attached. Consider the information in the report while generating the precautions.\n"
    } else {
        ""
    };

    format!(
        r#"Given the patient's symptoms and the type of doctor they are going to consult, write personalized diet, sleep, physical and mental precautions, as well as the things they should avoid until the consultation.

Symptoms: {symptoms}
Doctor Type: {doctor_type}
{report_section}
Keep the precautions clear and concise.

{PRECAUTIONS_OUTPUT_FORMAT}"#,
        symptoms = request.symptoms,
        doctor_type = request.doctor_type,
    )
}

pub fn follow_up_prompt(query: &InteractiveQuery) -> String {
    format!(
        r#"You already gave the patient these precautions:
{advice}

The patient now asks:
{question}

Answer helpfully, referring back to the precautions where relevant. Keep a conversational tone.

{ADVISOR_OUTPUT_FORMAT}"#,
        advice = query.prior_advice_text,
        question = query.question,
    )
}

/// Slice out the JSON object of a model reply, tolerating code fences or chatter around it.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

/// Decode a model reply against the declared output schema.
pub fn decode_reply<T: DeserializeOwned>(reply: &str) -> Result<T, GenerationError> {
    if reply.trim().is_empty() {
        return Err(GenerationError::EmptyOutput);
    }
    let json = extract_json_object(reply).ok_or_else(|| {
        GenerationError::MalformedOutput("no JSON object in model reply".to_string())
    })?;
    serde_json::from_str(json).map_err(|e| GenerationError::MalformedOutput(e.to_string()))
}
