use crate::{
    error::{FieldError, IntakeField, ValidationError},
    models::{IntakeForm, PrecautionRequest, ReportReference},
};

pub const MIN_FIELD_CHARS: usize = 2;

/// Which specialties are acceptable when the symptom text mentions a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keyword: &'static str,
    pub allowed: &'static [&'static str],
}

/// Evaluated in order; only the first keyword found in the symptoms is enforced.
pub const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keyword: "chest pain",
        allowed: &["Cardiologist", "General Physician"],
    },
    KeywordRule {
        keyword: "palpitations",
        allowed: &["Cardiologist", "General Physician"],
    },
    KeywordRule {
        keyword: "headache",
        allowed: &["Neurologist", "General Physician"],
    },
    KeywordRule {
        keyword: "seizure",
        allowed: &["Neurologist"],
    },
    KeywordRule {
        keyword: "stomach pain",
        allowed: &["Gastroenterologist", "General Physician"],
    },
    KeywordRule {
        keyword: "abdominal pain",
        allowed: &["Gastroenterologist", "General Physician"],
    },
    KeywordRule {
        keyword: "rash",
        allowed: &["Dermatologist", "General Physician"],
    },
    KeywordRule {
        keyword: "joint pain",
        allowed: &["Orthopedist", "General Physician"],
    },
];

/// First rule whose keyword occurs in `symptoms`, case-insensitively.
pub fn matching_rule(symptoms: &str) -> Option<&'static KeywordRule> {
    let symptoms = symptoms.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|rule| symptoms.contains(rule.keyword))
}

fn check_keyword_consistency(symptoms: &str, doctor_type: &str) -> Option<FieldError> {
    let rule = matching_rule(symptoms)?;
    if rule.allowed.contains(&doctor_type) {
        return None;
    }
    Some(FieldError::new(
        IntakeField::DoctorType,
        format!(
            "A {} is not suited for symptoms involving \"{}\". Consider: {}.",
            doctor_type,
            rule.keyword,
            rule.allowed.join(", ")
        ),
    ))
}

/// Validate the raw form and turn it into a request for the generator.
pub fn validate_intake(form: &IntakeForm) -> Result<PrecautionRequest, ValidationError> {
    let mut errors = Vec::new();

    if form.symptoms.chars().count() < MIN_FIELD_CHARS {
        errors.push(FieldError::new(
            IntakeField::Symptoms,
            "Symptoms must be at least 2 characters.",
        ));
    }
    if form.doctor_type.chars().count() < MIN_FIELD_CHARS {
        errors.push(FieldError::new(
            IntakeField::DoctorType,
            "Doctor Type must be at least 2 characters.",
        ));
    }

    if errors.is_empty() {
        if let Some(error) = check_keyword_consistency(&form.symptoms, &form.doctor_type) {
            errors.push(error);
        }
    }

    if !errors.is_empty() {
        return Err(ValidationError::new(errors));
    }

    let report_reference = form
        .report_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(ReportReference::new);

    Ok(PrecautionRequest {
        symptoms: form.symptoms.clone(),
        doctor_type: form.doctor_type.clone(),
        report_reference,
    })
}

/// Follow-up questions only need to be non-blank.
pub fn validate_question(question: &str) -> Result<&str, ValidationError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ValidationError::single(
            IntakeField::Question,
            "Question cannot be empty.",
        ));
    }
    Ok(question)
}
