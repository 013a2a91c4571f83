use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::error::CalcError;
use super::types::{FieldValue, InputRecord, RawInput};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

impl ChoiceOption {
    pub const fn new(value: &'static str, label: &'static str) -> Self {
        Self { value, label }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Number { min: f64, max: f64, integer: bool },
    Choice { options: &'static [ChoiceOption] },
    Flag,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub default: Option<FieldValue>,
    pub required: bool,
}

impl FieldSpec {
    pub fn number(key: &'static str, label: &'static str, min: f64, max: f64) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Number {
                min,
                max,
                integer: false,
            },
            default: None,
            required: true,
        }
    }

    pub fn integer(key: &'static str, label: &'static str, min: f64, max: f64) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Number {
                min,
                max,
                integer: true,
            },
            default: None,
            required: true,
        }
    }

    pub fn choice(
        key: &'static str,
        label: &'static str,
        options: &'static [ChoiceOption],
    ) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Choice { options },
            default: None,
            required: true,
        }
    }

    pub fn flag(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Flag,
            default: Some(FieldValue::Flag(false)),
            required: false,
        }
    }

    pub fn date(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Date,
            default: None,
            required: true,
        }
    }

    pub fn default_number(mut self, value: f64) -> Self {
        self.default = Some(FieldValue::Number(value));
        self
    }

    pub fn default_choice(mut self, value: &'static str) -> Self {
        self.default = Some(FieldValue::Choice(value.to_string()));
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn parse(&self, raw: &str) -> Result<FieldValue, CalcError> {
        match &self.kind {
            FieldKind::Number { min, max, integer } => {
                let cleaned: String = raw
                    .trim()
                    .trim_start_matches('$')
                    .trim_end_matches('%')
                    .chars()
                    .filter(|c| *c != ',' && *c != '_')
                    .collect();
                let value = cleaned
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| CalcError::InvalidNumber {
                        key: self.key.to_string(),
                        label: self.label.to_string(),
                        raw: raw.to_string(),
                    })?;
                if *integer && value.fract() != 0.0 {
                    return Err(CalcError::NotInteger {
                        key: self.key.to_string(),
                        label: self.label.to_string(),
                    });
                }
                if value < *min || value > *max {
                    return Err(CalcError::OutOfRange {
                        key: self.key.to_string(),
                        label: self.label.to_string(),
                        min: *min,
                        max: *max,
                    });
                }
                Ok(FieldValue::Number(value))
            }
            FieldKind::Choice { options } => {
                let wanted = raw.trim();
                options
                    .iter()
                    .find(|o| o.value.eq_ignore_ascii_case(wanted))
                    .map(|o| FieldValue::Choice(o.value.to_string()))
                    .ok_or_else(|| CalcError::InvalidChoice {
                        key: self.key.to_string(),
                        label: self.label.to_string(),
                        allowed: options
                            .iter()
                            .map(|o| o.value)
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
            FieldKind::Flag => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(FieldValue::Flag(true)),
                "false" | "no" | "off" | "0" => Ok(FieldValue::Flag(false)),
                _ => Err(CalcError::InvalidFlag {
                    key: self.key.to_string(),
                    label: self.label.to_string(),
                    raw: raw.to_string(),
                }),
            },
            FieldKind::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| CalcError::InvalidDate {
                    key: self.key.to_string(),
                    label: self.label.to_string(),
                    raw: raw.to_string(),
                }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculatorSchema {
    pub slug: &'static str,
    pub name: &'static str,
    pub summary: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl CalculatorSchema {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn validate(&self, raw: &RawInput) -> Result<InputRecord, CalcError> {
        let mut unknown: Vec<&String> = raw.keys().filter(|k| self.field(k).is_none()).collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(CalcError::UnknownField(unknown[0].clone()));
        }

        let mut record = InputRecord::new();
        for field in &self.fields {
            let supplied = raw
                .get(field.key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty());
            match (supplied, &field.default) {
                (Some(text), _) => record.insert(field.key, field.parse(text)?),
                (None, Some(default)) => record.insert(field.key, default.clone()),
                (None, None) if field.required => {
                    return Err(CalcError::MissingField {
                        key: field.key.to_string(),
                        label: field.label.to_string(),
                    });
                }
                (None, None) => {}
            }
        }
        Ok(record)
    }

    pub fn defaults(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|f| {
                let value = f
                    .default
                    .as_ref()
                    .map(FieldValue::to_form_string)
                    .unwrap_or_default();
                (f.key.to_string(), value)
            })
            .collect()
    }
}
