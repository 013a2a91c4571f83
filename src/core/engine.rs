use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::calculators::{
    DaysOnMarket, MortgageAffordability, MortgagePayment, PasserRating, PetBoarding, TireLife,
};
use super::error::CalcError;
use super::schema::CalculatorSchema;
use super::tiers::TierTable;
use super::types::{Calculation, InputRecord, RawInput, ResultRecord};

/// One calculator: a form schema plus the formula that runs over it.
pub trait Calculator: Send + Sync {
    fn schema(&self) -> &CalculatorSchema;

    fn tier_tables(&self) -> Vec<&'static TierTable> {
        Vec::new()
    }

    /// Cross-field checks that the schema alone cannot express.
    fn check(&self, _input: &InputRecord) -> Result<(), CalcError> {
        Ok(())
    }

    fn evaluate(&self, input: &InputRecord) -> Result<ResultRecord, CalcError>;

    fn slug(&self) -> &'static str {
        self.schema().slug
    }

    fn validate(&self, raw: &RawInput) -> Result<InputRecord, CalcError> {
        let input = self.schema().validate(raw)?;
        self.check(&input)?;
        Ok(input)
    }

    fn calculate(&self, raw: &RawInput) -> Result<Calculation, CalcError> {
        let input = self.validate(raw)?;
        let result = self.evaluate(&input)?;
        Ok(Calculation {
            slug: self.slug(),
            inputs: input,
            result,
        })
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    calculators: BTreeMap<&'static str, Arc<dyn Calculator>>,
}

impl RegistryBuilder {
    pub fn register<C>(mut self, calculator: C) -> Result<Self, CalcError>
    where
        C: Calculator + 'static,
    {
        let slug = calculator.slug();
        for table in calculator.tier_tables() {
            table.validate()?;
        }
        if self.calculators.contains_key(slug) {
            return Err(CalcError::DuplicateCalculator(slug.to_string()));
        }
        self.calculators.insert(slug, Arc::new(calculator));
        Ok(self)
    }

    pub fn build(self) -> CalculatorRegistry {
        CalculatorRegistry {
            calculators: self.calculators,
        }
    }
}

#[derive(Clone)]
pub struct CalculatorRegistry {
    calculators: BTreeMap<&'static str, Arc<dyn Calculator>>,
}

impl CalculatorRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn standard() -> Result<Self, CalcError> {
        Ok(Self::builder()
            .register(PetBoarding::new())?
            .register(DaysOnMarket::new())?
            .register(PasserRating::new())?
            .register(TireLife::new())?
            .register(MortgagePayment::new())?
            .register(MortgageAffordability::new())?
            .build())
    }

    pub fn get(&self, slug: &str) -> Result<&dyn Calculator, CalcError> {
        self.calculators
            .get(slug)
            .map(|c| c.as_ref())
            .ok_or_else(|| CalcError::UnknownCalculator(slug.to_string()))
    }

    pub fn schemas(&self) -> impl Iterator<Item = &CalculatorSchema> {
        self.calculators.values().map(|c| c.schema())
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    pub fn calculate(&self, slug: &str, raw: &RawInput) -> Result<Calculation, CalcError> {
        let calculator = self.get(slug)?;
        match calculator.calculate(raw) {
            Ok(calculation) => {
                debug!(
                    calculator = slug,
                    total = calculation.result.total,
                    components = calculation.result.components.len(),
                    "calculation complete"
                );
                Ok(calculation)
            }
            Err(err) => {
                if err.is_input_error() {
                    debug!(calculator = slug, error = %err, "input rejected");
                } else {
                    warn!(calculator = slug, error = %err, "calculation failed");
                }
                Err(err)
            }
        }
    }
}
