use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NARRATION_GREETING: &str = "Hello, I am MediAgent. Here are your personalized precautions:";

/// Locator of a previously uploaded report: a `data:` URI or an http(s) URL.
/// The contents are never inspected; only a data URI's declared media type is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportReference(String);

impl ReportReference {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Media type declared by a data URI, e.g. `application/pdf`.
    pub fn media_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let header = rest.split(',').next()?;
        let media_type = header.split(';').next()?;
        if media_type.is_empty() {
            None
        } else {
            Some(media_type)
        }
    }

    pub fn is_pdf(&self) -> bool {
        match self.media_type() {
            Some(media_type) => media_type.eq_ignore_ascii_case("application/pdf"),
            None => self.0.to_ascii_lowercase().ends_with(".pdf"),
        }
    }
}

/// Raw intake form values as submitted, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeForm {
    pub symptoms: String,
    pub doctor_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecautionRequest {
    pub symptoms: String,
    pub doctor_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_reference: Option<ReportReference>,
}

/// The five categorized precautions. Deserializing requires every field, so a
/// backend reply is either complete or rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecautionResult {
    pub diet_precautions: String,
    pub sleep_precautions: String,
    pub physical_precautions: String,
    pub mental_precautions: String,
    pub things_to_avoid: String,
}

impl PrecautionResult {
    /// Labelled fields in display order.
    pub fn sections(&self) -> [(&'static str, &str); 5] {
        [
            ("Dietary Precautions", &self.diet_precautions),
            ("Sleep Precautions", &self.sleep_precautions),
            ("Physical Precautions", &self.physical_precautions),
            ("Mental Precautions", &self.mental_precautions),
            ("Things to Avoid", &self.things_to_avoid),
        ]
    }

    /// The advice as one block of text, one labelled line per field. This is
    /// what follow-up questions are answered against.
    pub fn advice_text(&self) -> String {
        self.sections()
            .iter()
            .map(|(label, text)| format!("{label}: {text}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text handed to a speech synthesizer.
    pub fn narration(&self) -> String {
        format!("{NARRATION_GREETING}\n{}", self.advice_text())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveQuery {
    pub prior_advice_text: String,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveAnswer {
    pub response_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Follow-up conversation for one session. Entries are only ever appended;
/// the whole transcript is reset when new precautions arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatTranscript {
    entries: Vec<ChatEntry>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(ChatEntry {
            speaker,
            text: text.into(),
            at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoctorType {
    pub name: String,
}

impl DoctorType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
