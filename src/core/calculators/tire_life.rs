use crate::core::engine::Calculator;
use crate::core::error::CalcError;
use crate::core::schema::{CalculatorSchema, ChoiceOption, FieldSpec};
use crate::core::tiers::{Tier, TierScan, TierTable};
use crate::core::types::{InputRecord, ResultBuilder, ResultRecord, Unit};

use super::factor;

/// Legal minimum tread depth, in 32nds of an inch.
pub const LEGAL_MIN_TREAD: f64 = 2.0;
/// Rule-of-thumb miles of life per UTQG treadwear point.
pub const MILES_PER_TREADWEAR_POINT: f64 = 120.0;

const DRIVING_STYLES: &[ChoiceOption] = &[
    ChoiceOption::new("gentle", "Gentle"),
    ChoiceOption::new("normal", "Normal"),
    ChoiceOption::new("aggressive", "Aggressive"),
];

const ROAD_TYPES: &[ChoiceOption] = &[
    ChoiceOption::new("highway", "Mostly highway"),
    ChoiceOption::new("mixed", "Mixed"),
    ChoiceOption::new("city", "Mostly city"),
];

const STYLE_FACTORS: &[(&str, f64)] = &[("gentle", 0.85), ("normal", 1.00), ("aggressive", 1.30)];
const ROAD_FACTORS: &[(&str, f64)] = &[("highway", 0.90), ("mixed", 1.00), ("city", 1.15)];

const CONDITION_TIERS: &[Tier] = &[
    Tier::new(2.0, "replace now", 3.0),
    Tier::new(4.0, "replace soon", 2.0),
    Tier::new(6.0, "monitor", 1.0),
];

pub static TREAD_CONDITION: TierTable =
    TierTable::new("tread_condition", TierScan::Below, CONDITION_TIERS, "good", 0.0);

pub struct TireLife {
    schema: CalculatorSchema,
}

impl TireLife {
    pub fn new() -> Self {
        Self {
            schema: CalculatorSchema {
                slug: "tire-life",
                name: "Tire Life Calculator",
                summary: "Project remaining tire mileage from tread depth, wear history and driving habits.",
                fields: vec![
                    FieldSpec::number("original_tread", "Original tread depth (32nds)", 4.0, 32.0)
                        .default_number(10.0),
                    FieldSpec::number("current_tread", "Current tread depth (32nds)", 0.0, 32.0),
                    FieldSpec::number("miles_driven", "Miles driven on these tires", 0.0, 500_000.0)
                        .default_number(0.0),
                    FieldSpec::number("annual_miles", "Miles driven per year", 1.0, 200_000.0)
                        .default_number(12_000.0),
                    FieldSpec::integer("treadwear_rating", "UTQG treadwear rating", 100.0, 1_000.0)
                        .default_number(400.0),
                    FieldSpec::choice("driving_style", "Driving style", DRIVING_STYLES)
                        .default_choice("normal"),
                    FieldSpec::choice("road_type", "Road type", ROAD_TYPES).default_choice("mixed"),
                ],
            },
        }
    }
}

impl Default for TireLife {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for TireLife {
    fn schema(&self) -> &CalculatorSchema {
        &self.schema
    }

    fn tier_tables(&self) -> Vec<&'static TierTable> {
        vec![&TREAD_CONDITION]
    }

    fn check(&self, input: &InputRecord) -> Result<(), CalcError> {
        if input.number("current_tread")? > input.number("original_tread")? {
            return Err(CalcError::inconsistent(
                "Current tread depth cannot exceed the original depth",
            ));
        }
        Ok(())
    }

    fn evaluate(&self, input: &InputRecord) -> Result<ResultRecord, CalcError> {
        let original = input.number("original_tread")?;
        let current = input.number("current_tread")?;
        let miles_driven = input.number("miles_driven")?;
        let annual_miles = input.number("annual_miles")?;
        let treadwear = input.number("treadwear_rating")?;
        let style = factor(STYLE_FACTORS, "driving_style", input.choice("driving_style")?)?;
        let road = factor(ROAD_FACTORS, "road_type", input.choice("road_type")?)?;

        let mut result = ResultBuilder::new("Projected tread life", Unit::Miles);

        let worn = original - current;
        let wear_per_mile = if miles_driven > 0.0 && worn > 0.0 {
            result.note("Wear rate based on your observed tread loss.");
            worn / miles_driven
        } else {
            result.note("Wear rate estimated from the treadwear rating and driving habits.");
            (original - LEGAL_MIN_TREAD) / (treadwear * MILES_PER_TREADWEAR_POINT) * style * road
        };

        let usable_depth = (current - LEGAL_MIN_TREAD).max(0.0);
        let remaining_miles = usable_depth / wear_per_mile;

        result
            .component("miles_driven", "Miles already driven", miles_driven)
            .component("remaining_miles", "Estimated miles remaining", remaining_miles)
            .metric(
                "months_remaining",
                "Months until replacement",
                remaining_miles / (annual_miles / 12.0),
                Unit::Months,
            )
            .metric(
                "usable_tread_pct",
                "Usable tread remaining",
                usable_depth / (original - LEGAL_MIN_TREAD) * 100.0,
                Unit::Percent,
            )
            .classification(TREAD_CONDITION.name, current, TREAD_CONDITION.classify(current));

        if current < LEGAL_MIN_TREAD {
            result.note("Tread is below the legal minimum of 2/32 inch.");
        }

        Ok(result.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculators::testing::{assert_approx, raw};
    use proptest::prelude::{prop_assert, proptest};

    fn run(pairs: &[(&str, &str)]) -> Result<ResultRecord, CalcError> {
        let calc = TireLife::new();
        let input = calc.validate(&raw(pairs))?;
        calc.evaluate(&input)
    }

    #[test]
    fn observed_wear_projects_remaining_miles() {
        let result = run(&[
            ("original_tread", "10"),
            ("current_tread", "6"),
            ("miles_driven", "20000"),
        ])
        .expect("valid");
        assert_approx(result.component("remaining_miles").expect("remaining").value, 20_000.0);
        assert_approx(result.total, 40_000.0);
        assert_approx(result.metric("months_remaining").expect("months").value, 20.0);
        assert_approx(result.metric("usable_tread_pct").expect("pct").value, 50.0);
        assert_eq!(result.classification("tread_condition").map(|c| c.label), Some("good"));
    }

    #[test]
    fn new_tires_use_treadwear_estimate() {
        let normal = run(&[("current_tread", "10")]).expect("valid");
        assert_approx(normal.total, 48_000.0);

        let harsh = run(&[
            ("current_tread", "10"),
            ("driving_style", "aggressive"),
            ("road_type", "city"),
        ])
        .expect("valid");
        assert_approx(harsh.total, 48_000.0 / (1.30 * 1.15));
        assert!(harsh.total < normal.total);
    }

    #[test]
    fn worn_out_tire_has_no_remaining_life() {
        let result = run(&[
            ("current_tread", "1.5"),
            ("miles_driven", "45000"),
        ])
        .expect("valid");
        assert_approx(result.component("remaining_miles").expect("remaining").value, 0.0);
        assert_approx(result.total, 45_000.0);
        assert_eq!(result.classification("tread_condition").map(|c| c.label), Some("replace now"));
        assert!(result.notes.iter().any(|n| n.contains("legal minimum")));
    }

    #[test]
    fn condition_bands_follow_depth() {
        let cases = [
            ("2", "replace soon"),
            ("3.9", "replace soon"),
            ("4", "monitor"),
            ("5", "monitor"),
        ];
        for (depth, label) in cases {
            let result = run(&[("current_tread", depth)]).expect("valid");
            assert_eq!(
                result.classification("tread_condition").map(|c| c.label),
                Some(label),
                "depth {depth}"
            );
        }
    }

    #[test]
    fn current_deeper_than_original_is_rejected() {
        let err = run(&[("original_tread", "8"), ("current_tread", "9")]).expect_err("must reject");
        assert!(matches!(err, CalcError::Inconsistent(_)));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_projection_is_finite_and_sums(
            original in 4u32..=32,
            current_frac in 0.0f64..=1.0,
            miles in 0u32..200_000,
            treadwear in 100u32..=1000,
        ) {
            let current = (original as f64 * current_frac * 10.0).round() / 10.0;
            let result = run(&[
                ("original_tread", &original.to_string()),
                ("current_tread", &current.to_string()),
                ("miles_driven", &miles.to_string()),
                ("treadwear_rating", &treadwear.to_string()),
            ]).expect("generated input is valid");
            prop_assert!(result.total.is_finite());
            prop_assert!(result.total >= miles as f64);
            prop_assert!(result.total == result.component_sum());
        }
    }
}
