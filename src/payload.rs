//! Submission payload
//!
//! Canonical record sent to the mail backend, built from raw form field
//! values. Normalization guarantees every field is a plain trimmed string,
//! with select-box placeholder values collapsed to empty.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which form produced the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormSource {
    /// Dedicated contact page form (required-field validation applies).
    Contact,
    /// Hero/enquiry form on the index page.
    Index,
}

/// Raw field values as read off a form, before normalization.
///
/// `None` stands for an absent field. `gotcha` is the hidden `_gotcha`
/// honeypot input; humans never fill it in.
#[derive(Debug, Clone, Default)]
pub struct RawFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub gotcha: Option<String>,
}

impl RawFields {
    /// True when the honeypot field carries a non-empty value after
    /// normalization, i.e. an automated spam submission.
    pub fn is_spam(&self) -> bool {
        !normalize_field(self.gotcha.as_deref()).is_empty()
    }

    /// Clear all field values (the `form.reset()` of a successful submit).
    pub fn reset(&mut self) {
        *self = RawFields::default();
    }
}

/// A mail submission to the Vartiss backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub name: String,
    pub email: String,
    /// Optional; empty string when not provided.
    pub phone: String,
    pub message: String,
    pub source: FormSource,
}

impl SubmissionPayload {
    /// Build a payload from raw form fields. The source is derived from form
    /// identity, not from the field values themselves.
    pub fn from_raw(raw: &RawFields, source: FormSource) -> Self {
        SubmissionPayload {
            name: normalize_field(raw.name.as_deref()),
            email: normalize_field(raw.email.as_deref()),
            phone: normalize_field(raw.phone.as_deref()),
            message: normalize_field(raw.message.as_deref()),
            source,
        }
    }

    /// Required-field check for the contact form: name, email, and message
    /// must be non-empty. Phone stays optional.
    pub fn validate_required(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push("Name is required".to_string());
        }
        if self.email.is_empty() {
            errors.push("Email is required".to_string());
        }
        if self.message.is_empty() {
            errors.push("Message is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Select-box values that mean "nothing chosen", compared case-insensitively.
const PLACEHOLDER_TOKENS: [&str; 4] = ["select", "choose", "select an option", "please select"];

/// Coerce a raw field value to a canonical string: trim, treat absent input
/// as empty, and collapse placeholder select values to empty.
pub fn normalize_field(value: Option<&str>) -> String {
    let trimmed = match value {
        Some(v) => v.trim(),
        None => return String::new(),
    };
    if trimmed.is_empty() {
        return String::new();
    }

    let lower = trimmed.to_lowercase();
    if PLACEHOLDER_TOKENS.contains(&lower.as_str()) {
        return String::new();
    }

    trimmed.to_string()
}
