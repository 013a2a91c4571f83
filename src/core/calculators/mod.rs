mod days_on_market;
mod mortgage;
mod passer_rating;
mod pet_boarding;
mod tire_life;

pub use days_on_market::DaysOnMarket;
pub use mortgage::{MortgageAffordability, MortgagePayment};
pub use passer_rating::PasserRating;
pub use pet_boarding::PetBoarding;
pub use tire_life::TireLife;

use super::error::CalcError;

/// Looks up the factor for a choice value; the schema has already restricted
/// the value to the option list, so a miss means the table and schema drifted.
fn factor(table: &[(&str, f64)], key: &'static str, value: &str) -> Result<f64, CalcError> {
    table
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, f)| *f)
        .ok_or_else(|| CalcError::InvalidChoice {
            key: key.to_string(),
            label: key.to_string(),
            allowed: table
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::core::types::RawInput;

    pub(crate) const EPS: f64 = 1e-6;

    pub(crate) fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    pub(crate) fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    pub(crate) fn raw(pairs: &[(&str, &str)]) -> RawInput {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tiers::{Band, TierTable};
    use proptest::prelude::{prop_assert_eq, proptest};

    fn builtin_tables() -> [&'static TierTable; 6] {
        [
            &pet_boarding::DURATION_DISCOUNT,
            &days_on_market::MARKET_SPEED,
            &passer_rating::RATING_BAND,
            &tire_life::TREAD_CONDITION,
            &mortgage::PMI_RATE,
            &mortgage::DEBT_LOAD,
        ]
    }

    #[test]
    fn builtin_tables_validate() {
        for table in builtin_tables() {
            assert!(table.validate().is_ok(), "table {} is invalid", table.name);
        }
    }

    proptest! {
        #[test]
        fn prop_builtin_tables_have_exactly_one_band_per_value(x in -1.0e6f64..1.0e6) {
            for table in builtin_tables() {
                let bands = table.bands();
                let hits: Vec<&Band> = bands.iter().filter(|b| b.contains(x)).collect();
                prop_assert_eq!(hits.len(), 1);
                let matched = table.classify(x);
                prop_assert_eq!(hits[0].index, matched.index);
                prop_assert_eq!(hits[0].label, matched.label);
            }
        }
    }
}
