//! Inbound form payload and its validated form.
//!
//! [`SubmissionPayload`] mirrors the JSON the landing page posts. Only a
//! missing name or phone rejects a submission: every field is optional
//! at the serde level, and optional extras of an unexpected shape are
//! dropped instead of failing the whole body.
//! [`FormSubmission`] is only obtainable through
//! [`SubmissionPayload::validate`].

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    #[serde(default, deserialize_with = "text_or_number")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "text_or_number")]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub show_extended: Option<bool>,

    #[serde(default, deserialize_with = "lenient")]
    pub calculator_data: Option<CalculatorResult>,

    #[serde(default, deserialize_with = "text_or_number")]
    pub rooms: Option<String>,

    #[serde(default, deserialize_with = "text_or_number")]
    pub priority: Option<String>,
}

/// Keep the value when it has the expected shape, otherwise treat it as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Strings as-is, numbers in their JSON spelling (`"rooms": 2`), anything else absent.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorResult {
    pub property_price: f64,
    pub down_payment: f64,
    pub monthly_payment: f64,
    pub interest_rate: f64,
    #[serde(default)]
    pub quick_deal_discount: bool,
}

/// A submission that passed validation: name and phone are non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    name: String,
    phone: String,
    show_extended: bool,
    calculator_data: Option<CalculatorResult>,
    rooms: Option<String>,
    priority: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Name,
    Phone,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Phone => f.write_str("phone"),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SubmissionPayload {
    pub fn validate(self) -> Result<FormSubmission, MissingField> {
        let name = non_blank(self.name).ok_or(MissingField::Name)?;
        let phone = non_blank(self.phone).ok_or(MissingField::Phone)?;

        let show_extended = self.show_extended.unwrap_or(false);
        Ok(FormSubmission {
            name,
            phone,
            show_extended,
            // Calculator figures only mean something for the extended form
            calculator_data: self.calculator_data.filter(|_| show_extended),
            rooms: non_blank(self.rooms),
            priority: non_blank(self.priority),
        })
    }
}

impl FormSubmission {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub const fn show_extended(&self) -> bool {
        self.show_extended
    }

    #[must_use]
    pub const fn calculator_data(&self) -> Option<&CalculatorResult> {
        self.calculator_data.as_ref()
    }

    #[must_use]
    pub fn rooms(&self) -> Option<&str> {
        self.rooms.as_deref()
    }

    #[must_use]
    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }
}
