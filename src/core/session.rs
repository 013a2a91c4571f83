use std::collections::BTreeMap;

use serde::Serialize;

use super::engine::Calculator;
use super::error::CalcError;
use super::present::Presentation;
use super::types::{RawInput, ResultRecord};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

/// Form state for one calculator view.
pub struct FormSession<'a> {
    calculator: &'a dyn Calculator,
    values: BTreeMap<String, String>,
    result: Option<ResultRecord>,
    error: Option<String>,
    panel: PanelState,
}

impl<'a> FormSession<'a> {
    pub fn new(calculator: &'a dyn Calculator) -> Self {
        Self {
            calculator,
            values: calculator.schema().defaults(),
            result: None,
            error: None,
            panel: PanelState::Closed,
        }
    }

    pub fn slug(&self) -> &'static str {
        self.calculator.slug()
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), CalcError> {
        if self.calculator.schema().field(key).is_none() {
            return Err(CalcError::UnknownField(key.to_string()));
        }
        self.values.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn calculate(&mut self) -> Result<&ResultRecord, CalcError> {
        let raw: RawInput = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        match self.calculator.calculate(&raw) {
            Ok(calculation) => {
                self.error = None;
                self.panel = PanelState::Open;
                Ok(self.result.insert(calculation.result))
            }
            Err(err) => {
                self.error = Some(err.to_string());
                self.result = None;
                self.panel = PanelState::Closed;
                Err(err)
            }
        }
    }

    pub fn reset(&mut self) {
        self.values = self.calculator.schema().defaults();
        self.result = None;
        self.error = None;
        self.panel = PanelState::Closed;
    }

    pub fn close_panel(&mut self) {
        self.panel = PanelState::Closed;
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn result(&self) -> Option<&ResultRecord> {
        self.result.as_ref()
    }

    pub fn presentation(&self) -> Option<Presentation> {
        self.result.as_ref().map(Presentation::from_result)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::CalculatorRegistry;
    use pretty_assertions::assert_eq;

    fn registry() -> CalculatorRegistry {
        CalculatorRegistry::standard().expect("standard registry")
    }

    #[test]
    fn starts_from_schema_defaults_with_panel_closed() {
        let registry = registry();
        let session = FormSession::new(registry.get("pet-boarding-cost").expect("known"));
        assert_eq!(session.value("nightly_rate"), Some("45"));
        assert_eq!(session.value("pet_type"), Some("dog"));
        assert_eq!(session.value("nights"), Some(""));
        assert_eq!(session.panel(), PanelState::Closed);
        assert!(session.result().is_none());
    }

    #[test]
    fn calculate_opens_panel_and_reset_restores_defaults() {
        let registry = registry();
        let mut session = FormSession::new(registry.get("pet-boarding-cost").expect("known"));
        session.set("nights", "7").expect("known field");
        session.set("nightly_rate", "60").expect("known field");

        let total = session.calculate().expect("valid").total;
        assert!(total > 0.0);
        assert_eq!(session.panel(), PanelState::Open);
        assert!(session.presentation().is_some());

        session.reset();
        let defaults = registry.get("pet-boarding-cost").expect("known").schema().defaults();
        assert_eq!(session.values(), &defaults);
        assert_eq!(session.panel(), PanelState::Closed);
        assert!(session.result().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn failed_calculation_records_message_and_clears_result() {
        let registry = registry();
        let mut session = FormSession::new(registry.get("pet-boarding-cost").expect("known"));
        session.set("nights", "3").expect("known field");
        session.calculate().expect("valid");

        session.set("nights", "0").expect("known field");
        let err = session.calculate().expect_err("out of range");
        assert_eq!(session.error(), Some(err.to_string().as_str()));
        assert!(session.result().is_none());
        assert_eq!(session.panel(), PanelState::Closed);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let registry = registry();
        let mut session = FormSession::new(registry.get("tire-life").expect("known"));
        let err = session.set("colour", "red").expect_err("unknown");
        assert_eq!(err, CalcError::UnknownField("colour".to_string()));
    }

    #[test]
    fn close_panel_keeps_result() {
        let registry = registry();
        let mut session = FormSession::new(registry.get("tire-life").expect("known"));
        session.set("current_tread", "6").expect("known field");
        session.calculate().expect("valid");
        session.close_panel();
        assert_eq!(session.panel(), PanelState::Closed);
        assert!(session.result().is_some());
    }
}
