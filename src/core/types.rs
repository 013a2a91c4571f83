use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use super::error::CalcError;
use super::tiers::TierMatch;

/// Form values exactly as submitted, keyed by field.
pub type RawInput = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Choice(String),
    Flag(bool),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn to_form_string(&self) -> String {
        match self {
            FieldValue::Number(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    format!("{}", *v as i64)
                } else {
                    format!("{v}")
                }
            }
            FieldValue::Choice(v) => v.clone(),
            FieldValue::Flag(v) => v.to_string(),
            FieldValue::Date(v) => v.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InputRecord {
    values: BTreeMap<String, FieldValue>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn number(&self, key: &str) -> Result<f64, CalcError> {
        self.optional_number(key).ok_or_else(|| missing(key))
    }

    pub fn optional_number(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(FieldValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn choice(&self, key: &str) -> Result<&str, CalcError> {
        match self.values.get(key) {
            Some(FieldValue::Choice(v)) => Ok(v.as_str()),
            _ => Err(missing(key)),
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(FieldValue::Flag(true)))
    }

    pub fn date(&self, key: &str) -> Result<NaiveDate, CalcError> {
        self.optional_date(key).ok_or_else(|| missing(key))
    }

    pub fn optional_date(&self, key: &str) -> Option<NaiveDate> {
        match self.values.get(key) {
            Some(FieldValue::Date(v)) => Some(*v),
            _ => None,
        }
    }
}

fn missing(key: &str) -> CalcError {
    CalcError::MissingField {
        key: key.to_string(),
        label: key.to_string(),
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Currency,
    Percent,
    Days,
    Miles,
    Months,
    Points,
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub key: &'static str,
    pub label: String,
    pub value: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub key: &'static str,
    pub label: String,
    pub value: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub table: &'static str,
    pub label: &'static str,
    pub value: f64,
    pub input: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub period: u32,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub total_label: String,
    pub unit: Unit,
    pub components: Vec<Component>,
    pub total: f64,
    pub metrics: Vec<Metric>,
    pub classifications: Vec<Classification>,
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schedule: Vec<ScheduleRow>,
}

impl ResultRecord {
    pub fn component(&self, key: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.key == key)
    }

    pub fn metric(&self, key: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.key == key)
    }

    pub fn classification(&self, table: &str) -> Option<&Classification> {
        self.classifications.iter().find(|c| c.table == table)
    }

    pub fn component_sum(&self) -> f64 {
        self.components.iter().map(|c| c.value).sum()
    }
}

/// Collects a result breakdown. The total is always derived from the
/// components in the order they were pushed.
#[derive(Debug)]
pub struct ResultBuilder {
    total_label: String,
    unit: Unit,
    components: Vec<Component>,
    metrics: Vec<Metric>,
    classifications: Vec<Classification>,
    notes: Vec<String>,
    schedule: Vec<ScheduleRow>,
}

impl ResultBuilder {
    pub fn new(total_label: impl Into<String>, unit: Unit) -> Self {
        Self {
            total_label: total_label.into(),
            unit,
            components: Vec::new(),
            metrics: Vec::new(),
            classifications: Vec::new(),
            notes: Vec::new(),
            schedule: Vec::new(),
        }
    }

    pub fn component(
        &mut self,
        key: &'static str,
        label: impl Into<String>,
        value: f64,
    ) -> &mut Self {
        let unit = self.unit;
        self.components.push(Component {
            key,
            label: label.into(),
            value,
            unit,
        });
        self
    }

    pub fn metric(
        &mut self,
        key: &'static str,
        label: impl Into<String>,
        value: f64,
        unit: Unit,
    ) -> &mut Self {
        self.metrics.push(Metric {
            key,
            label: label.into(),
            value,
            unit,
        });
        self
    }

    pub fn classification(
        &mut self,
        table: &'static str,
        input: f64,
        matched: TierMatch,
    ) -> &mut Self {
        self.classifications.push(Classification {
            table,
            label: matched.label,
            value: matched.value,
            input,
        });
        self
    }

    pub fn note(&mut self, note: impl Into<String>) -> &mut Self {
        self.notes.push(note.into());
        self
    }

    pub fn schedule(&mut self, rows: Vec<ScheduleRow>) -> &mut Self {
        self.schedule = rows;
        self
    }

    /// Running sum of the components pushed so far.
    pub fn subtotal(&self) -> f64 {
        self.components.iter().map(|c| c.value).sum()
    }

    pub fn build(self) -> ResultRecord {
        let total = self.components.iter().map(|c| c.value).sum();
        ResultRecord {
            total_label: self.total_label,
            unit: self.unit,
            components: self.components,
            total,
            metrics: self.metrics,
            classifications: self.classifications,
            notes: self.notes,
            schedule: self.schedule,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub slug: &'static str,
    pub inputs: InputRecord,
    pub result: ResultRecord,
}
