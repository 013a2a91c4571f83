use crate::core::engine::Calculator;
use crate::core::error::CalcError;
use crate::core::schema::{CalculatorSchema, FieldSpec};
use crate::core::tiers::{Tier, TierScan, TierTable};
use crate::core::types::{InputRecord, ResultBuilder, ResultRecord, Unit};

const MARKET_SPEED_TIERS: &[Tier] = &[
    Tier::new(15.0, "very hot", 4.0),
    Tier::new(30.0, "hot", 3.0),
    Tier::new(60.0, "balanced", 2.0),
    Tier::new(90.0, "slow", 1.0),
];

pub static MARKET_SPEED: TierTable =
    TierTable::new("market_speed", TierScan::Below, MARKET_SPEED_TIERS, "stale", 0.0);

pub struct DaysOnMarket {
    schema: CalculatorSchema,
}

impl DaysOnMarket {
    pub fn new() -> Self {
        Self {
            schema: CalculatorSchema {
                slug: "days-on-market",
                name: "Real Estate Days on Market Calculator",
                summary: "Count days from listing to contract and closing and rate the market speed.",
                fields: vec![
                    FieldSpec::date("list_date", "Listing date"),
                    FieldSpec::date("contract_date", "Under-contract date"),
                    FieldSpec::date("close_date", "Closing date").optional(),
                    FieldSpec::number("list_price", "List price", 1.0, 1.0e9),
                    FieldSpec::number("sale_price", "Sale price", 1.0, 1.0e9).optional(),
                    FieldSpec::integer(
                        "area_average_days",
                        "Area average days on market",
                        1.0,
                        1_000.0,
                    )
                    .default_number(45.0),
                ],
            },
        }
    }
}

impl Default for DaysOnMarket {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for DaysOnMarket {
    fn schema(&self) -> &CalculatorSchema {
        &self.schema
    }

    fn tier_tables(&self) -> Vec<&'static TierTable> {
        vec![&MARKET_SPEED]
    }

    fn check(&self, input: &InputRecord) -> Result<(), CalcError> {
        let listed = input.date("list_date")?;
        let contract = input.date("contract_date")?;
        if contract < listed {
            return Err(CalcError::inconsistent(
                "Under-contract date cannot be before the listing date",
            ));
        }
        if let Some(close) = input.optional_date("close_date") {
            if close < contract {
                return Err(CalcError::inconsistent(
                    "Closing date cannot be before the under-contract date",
                ));
            }
        }
        Ok(())
    }

    fn evaluate(&self, input: &InputRecord) -> Result<ResultRecord, CalcError> {
        let listed = input.date("list_date")?;
        let contract = input.date("contract_date")?;
        let list_price = input.number("list_price")?;
        let area_average = input.number("area_average_days")?;

        let days_to_contract = (contract - listed).num_days() as f64;

        let mut result = ResultBuilder::new("Days from listing to close", Unit::Days);
        result.component("days_to_contract", "Days on market", days_to_contract);
        match input.optional_date("close_date") {
            Some(close) => {
                let days_to_close = (close - contract).num_days() as f64;
                result.component("days_to_close", "Contract to closing", days_to_close);
            }
            None => {
                result.note("No closing date given; total covers listing to contract only.");
            }
        }

        let speed = MARKET_SPEED.classify(days_to_contract);
        result
            .classification(MARKET_SPEED.name, days_to_contract, speed)
            .metric(
                "vs_area_average",
                "Difference from area average",
                days_to_contract - area_average,
                Unit::Days,
            );

        if let Some(sale_price) = input.optional_number("sale_price") {
            result
                .metric(
                    "sale_to_list_ratio",
                    "Sale-to-list ratio",
                    sale_price / list_price * 100.0,
                    Unit::Percent,
                )
                .metric(
                    "price_change",
                    "Change from list price",
                    sale_price - list_price,
                    Unit::Currency,
                );
        }

        Ok(result.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculators::testing::{assert_approx, raw};

    fn run(pairs: &[(&str, &str)]) -> Result<ResultRecord, CalcError> {
        let calc = DaysOnMarket::new();
        let input = calc.validate(&raw(pairs))?;
        calc.evaluate(&input)
    }

    #[test]
    fn counts_days_and_classifies_market_speed() {
        let result = run(&[
            ("list_date", "2024-03-01"),
            ("contract_date", "2024-03-22"),
            ("close_date", "2024-04-21"),
            ("list_price", "400000"),
            ("sale_price", "410000"),
        ])
        .expect("valid");
        assert_approx(result.component("days_to_contract").expect("dom").value, 21.0);
        assert_approx(result.component("days_to_close").expect("escrow").value, 30.0);
        assert_approx(result.total, 51.0);
        assert_eq!(result.classification("market_speed").map(|c| c.label), Some("hot"));
        assert_approx(result.metric("vs_area_average").expect("avg").value, -24.0);
        assert_approx(result.metric("sale_to_list_ratio").expect("ratio").value, 102.5);
        assert_approx(result.metric("price_change").expect("change").value, 10_000.0);
    }

    #[test]
    fn missing_close_date_totals_to_contract_only() {
        let result = run(&[
            ("list_date", "2024-01-01"),
            ("contract_date", "2024-04-15"),
            ("list_price", "250000"),
        ])
        .expect("valid");
        assert_approx(result.total, 105.0);
        assert!(result.component("days_to_close").is_none());
        assert!(result.metric("sale_to_list_ratio").is_none());
        assert_eq!(result.classification("market_speed").map(|c| c.label), Some("stale"));
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn same_day_contract_is_very_hot() {
        let result = run(&[
            ("list_date", "2024-05-01"),
            ("contract_date", "2024-05-01"),
            ("list_price", "300000"),
        ])
        .expect("valid");
        assert_approx(result.total, 0.0);
        assert_eq!(result.classification("market_speed").map(|c| c.label), Some("very hot"));
    }

    #[test]
    fn boundary_days_fall_into_slower_band() {
        let result = run(&[
            ("list_date", "2024-01-01"),
            ("contract_date", "2024-01-31"),
            ("list_price", "300000"),
        ])
        .expect("valid");
        assert_approx(result.total, 30.0);
        assert_eq!(result.classification("market_speed").map(|c| c.label), Some("balanced"));
    }

    #[test]
    fn rejects_dates_out_of_order() {
        let err = run(&[
            ("list_date", "2024-03-10"),
            ("contract_date", "2024-03-01"),
            ("list_price", "300000"),
        ])
        .expect_err("must reject");
        assert!(matches!(err, CalcError::Inconsistent(_)));

        let err = run(&[
            ("list_date", "2024-03-01"),
            ("contract_date", "2024-03-10"),
            ("close_date", "2024-03-05"),
            ("list_price", "300000"),
        ])
        .expect_err("must reject");
        assert!(err.to_string().contains("Closing date"));
    }
}
