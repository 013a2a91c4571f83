use crate::core::engine::Calculator;
use crate::core::error::CalcError;
use crate::core::schema::{CalculatorSchema, ChoiceOption, FieldSpec};
use crate::core::solver::{SolveConfig, solve_max_feasible};
use crate::core::tiers::{Tier, TierScan, TierTable};
use crate::core::types::{InputRecord, ResultBuilder, ResultRecord, ScheduleRow, Unit};

const TERMS: &[ChoiceOption] = &[
    ChoiceOption::new("10", "10 years"),
    ChoiceOption::new("15", "15 years"),
    ChoiceOption::new("20", "20 years"),
    ChoiceOption::new("30", "30 years"),
];

/// Annual PMI rate (percent of the loan) keyed on down payment percent.
const PMI_TIERS: &[Tier] = &[
    Tier::new(5.0, "under 5% down", 1.00),
    Tier::new(10.0, "5-10% down", 0.75),
    Tier::new(15.0, "10-15% down", 0.50),
    Tier::new(20.0, "15-20% down", 0.30),
];

pub static PMI_RATE: TierTable =
    TierTable::new("pmi_rate", TierScan::Below, PMI_TIERS, "no PMI", 0.0);

const DEBT_LOAD_TIERS: &[Tier] = &[
    Tier::new(15.0, "low", 0.0),
    Tier::new(25.0, "moderate", 1.0),
    Tier::new(36.0, "elevated", 2.0),
];

pub static DEBT_LOAD: TierTable =
    TierTable::new("debt_load", TierScan::Below, DEBT_LOAD_TIERS, "high", 3.0);

const MAX_LOAN: f64 = 1.0e9;
const PRICE_TOLERANCE: f64 = 0.5;

fn housing_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::number("interest_rate", "Interest rate (%)", 0.0, 25.0),
        FieldSpec::choice("term_years", "Loan term", TERMS).default_choice("30"),
        FieldSpec::number("property_tax_rate", "Property tax rate (%)", 0.0, 10.0)
            .default_number(1.1),
        FieldSpec::number("annual_insurance", "Homeowners insurance per year", 0.0, 1.0e6)
            .default_number(1_500.0),
        FieldSpec::number("monthly_hoa", "HOA dues per month", 0.0, 1.0e5).default_number(0.0),
    ]
}

/// Fixed-rate monthly principal and interest.
pub fn monthly_principal_and_interest(loan: f64, annual_rate_pct: f64, years: u32) -> f64 {
    let n = (years * 12) as f64;
    if loan <= 0.0 || n <= 0.0 {
        return 0.0;
    }
    let r = annual_rate_pct / 100.0 / 12.0;
    if r == 0.0 {
        return loan / n;
    }
    loan * r / (1.0 - (1.0 + r).powf(-n))
}

/// Yearly roll-up of a fixed-rate amortization.
pub fn amortization_schedule(loan: f64, annual_rate_pct: f64, years: u32) -> Vec<ScheduleRow> {
    let payment = monthly_principal_and_interest(loan, annual_rate_pct, years);
    let r = annual_rate_pct / 100.0 / 12.0;
    let mut balance = loan.max(0.0);
    let mut rows = Vec::with_capacity(years as usize);

    for year in 1..=years {
        let mut principal_paid = 0.0;
        let mut interest_paid = 0.0;
        for month in 1..=12 {
            let interest = balance * r;
            let last = year == years && month == 12;
            let principal = if last { balance } else { (payment - interest).min(balance) };
            balance -= principal;
            principal_paid += principal;
            interest_paid += interest;
        }
        rows.push(ScheduleRow {
            period: year,
            principal: principal_paid,
            interest: interest_paid,
            balance: balance.max(0.0),
        });
    }
    rows
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HousingTerms {
    interest_rate: f64,
    years: u32,
    property_tax_rate: f64,
    annual_insurance: f64,
    monthly_hoa: f64,
}

impl HousingTerms {
    fn from_input(input: &InputRecord) -> Result<Self, CalcError> {
        let years = input
            .choice("term_years")?
            .parse::<u32>()
            .map_err(|_| CalcError::inconsistent("Loan term must be a whole number of years"))?;
        Ok(Self {
            interest_rate: input.number("interest_rate")?,
            years,
            property_tax_rate: input.number("property_tax_rate")?,
            annual_insurance: input.number("annual_insurance")?,
            monthly_hoa: input.number("monthly_hoa")?,
        })
    }

    fn payment(&self, price: f64, down_payment: f64) -> MonthlyPayment {
        let loan = (price - down_payment).max(0.0);
        let down_pct = if price > 0.0 { down_payment / price * 100.0 } else { 100.0 };
        let pmi_tier = PMI_RATE.classify(down_pct);
        MonthlyPayment {
            loan,
            down_pct,
            principal_and_interest: monthly_principal_and_interest(
                loan,
                self.interest_rate,
                self.years,
            ),
            property_tax: price * self.property_tax_rate / 100.0 / 12.0,
            insurance: self.annual_insurance / 12.0,
            pmi: loan * pmi_tier.value / 100.0 / 12.0,
            hoa: self.monthly_hoa,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MonthlyPayment {
    loan: f64,
    down_pct: f64,
    principal_and_interest: f64,
    property_tax: f64,
    insurance: f64,
    pmi: f64,
    hoa: f64,
}

impl MonthlyPayment {
    fn total(self) -> f64 {
        self.principal_and_interest + self.property_tax + self.insurance + self.pmi + self.hoa
    }
}

pub struct MortgagePayment {
    schema: CalculatorSchema,
}

impl MortgagePayment {
    pub fn new() -> Self {
        let mut fields = vec![
            FieldSpec::number("home_price", "Home price", 1.0, 1.0e9),
            FieldSpec::number("down_payment", "Down payment", 0.0, 1.0e9),
        ];
        fields.extend(housing_fields());
        Self {
            schema: CalculatorSchema {
                slug: "mortgage-payment",
                name: "Mortgage Payment Calculator",
                summary: "Monthly payment with taxes, insurance, PMI and HOA plus a yearly amortization schedule.",
                fields,
            },
        }
    }
}

impl Default for MortgagePayment {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for MortgagePayment {
    fn schema(&self) -> &CalculatorSchema {
        &self.schema
    }

    fn tier_tables(&self) -> Vec<&'static TierTable> {
        vec![&PMI_RATE]
    }

    fn check(&self, input: &InputRecord) -> Result<(), CalcError> {
        if input.number("down_payment")? >= input.number("home_price")? {
            return Err(CalcError::inconsistent(
                "Down payment must be less than the home price",
            ));
        }
        Ok(())
    }

    fn evaluate(&self, input: &InputRecord) -> Result<ResultRecord, CalcError> {
        let price = input.number("home_price")?;
        let down_payment = input.number("down_payment")?;
        let terms = HousingTerms::from_input(input)?;
        let payment = terms.payment(price, down_payment);
        let months = (terms.years * 12) as f64;

        let mut result = ResultBuilder::new("Monthly payment", Unit::Currency);
        result
            .component(
                "principal_and_interest",
                "Principal and interest",
                payment.principal_and_interest,
            )
            .component("property_tax", "Property tax", payment.property_tax)
            .component("insurance", "Homeowners insurance", payment.insurance)
            .component("pmi", "Private mortgage insurance", payment.pmi)
            .component("hoa", "HOA dues", payment.hoa)
            .classification(PMI_RATE.name, payment.down_pct, PMI_RATE.classify(payment.down_pct));

        let total_pi = payment.principal_and_interest * months;
        result
            .metric("loan_amount", "Loan amount", payment.loan, Unit::Currency)
            .metric("down_payment_pct", "Down payment", payment.down_pct, Unit::Percent)
            .metric(
                "total_interest",
                "Total interest paid",
                total_pi - payment.loan,
                Unit::Currency,
            )
            .metric(
                "total_of_payments",
                "Total of principal and interest payments",
                total_pi,
                Unit::Currency,
            )
            .schedule(amortization_schedule(payment.loan, terms.interest_rate, terms.years));

        if payment.pmi > 0.0 {
            result.note("PMI applies until the loan reaches 80% of the home value.");
        }

        Ok(result.build())
    }
}

pub struct MortgageAffordability {
    schema: CalculatorSchema,
}

impl MortgageAffordability {
    pub fn new() -> Self {
        let mut fields = vec![
            FieldSpec::number("annual_income", "Gross annual income", 1.0, 1.0e8),
            FieldSpec::number("monthly_debts", "Monthly debt payments", 0.0, 1.0e7)
                .default_number(0.0),
            FieldSpec::number("down_payment", "Down payment", 0.0, 1.0e9).default_number(0.0),
        ];
        fields.extend(housing_fields());
        fields.push(
            FieldSpec::number("front_end_ratio", "Front-end ratio limit (%)", 10.0, 50.0)
                .default_number(28.0),
        );
        fields.push(
            FieldSpec::number("back_end_ratio", "Back-end ratio limit (%)", 10.0, 60.0)
                .default_number(36.0),
        );
        Self {
            schema: CalculatorSchema {
                slug: "mortgage-affordability",
                name: "Mortgage Affordability Calculator",
                summary: "Largest home price whose full monthly payment fits debt-to-income limits.",
                fields,
            },
        }
    }
}

impl Default for MortgageAffordability {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for MortgageAffordability {
    fn schema(&self) -> &CalculatorSchema {
        &self.schema
    }

    fn tier_tables(&self) -> Vec<&'static TierTable> {
        vec![&PMI_RATE, &DEBT_LOAD]
    }

    fn check(&self, input: &InputRecord) -> Result<(), CalcError> {
        if input.number("back_end_ratio")? < input.number("front_end_ratio")? {
            return Err(CalcError::inconsistent(
                "Back-end ratio limit must be at least the front-end limit",
            ));
        }
        Ok(())
    }

    fn evaluate(&self, input: &InputRecord) -> Result<ResultRecord, CalcError> {
        let income = input.number("annual_income")?;
        let debts = input.number("monthly_debts")?;
        let down_payment = input.number("down_payment")?;
        let front = input.number("front_end_ratio")?;
        let back = input.number("back_end_ratio")?;
        let terms = HousingTerms::from_input(input)?;

        let gross_monthly = income / 12.0;
        let budget = (gross_monthly * front / 100.0).min(gross_monthly * back / 100.0 - debts);
        if budget <= 0.0 {
            return Err(CalcError::inconsistent(
                "Monthly debts already use up the back-end ratio limit",
            ));
        }

        let config = SolveConfig {
            search_min: down_payment,
            search_max: down_payment + MAX_LOAN,
            tolerance: PRICE_TOLERANCE,
            max_iterations: 128,
        };
        let outcome = solve_max_feasible(config, |price| {
            terms.payment(price, down_payment).total() <= budget
        })?;
        let max_price = match outcome.solved_value {
            Some(price) if outcome.feasible => price,
            _ => {
                return Err(CalcError::inconsistent(
                    "Budget does not cover property tax, insurance and HOA dues",
                ));
            }
        };

        let payment = terms.payment(max_price, down_payment);
        let debt_load = debts / gross_monthly * 100.0;

        let mut result = ResultBuilder::new("Maximum home price", Unit::Currency);
        result
            .component("down_payment", "Down payment", down_payment)
            .component("max_loan", "Maximum loan", payment.loan)
            .metric("monthly_budget", "Monthly housing budget", budget, Unit::Currency)
            .metric(
                "monthly_payment",
                "Monthly payment at this price",
                payment.total(),
                Unit::Currency,
            )
            .metric(
                "front_end_ratio",
                "Front-end ratio",
                payment.total() / gross_monthly * 100.0,
                Unit::Percent,
            )
            .metric(
                "back_end_ratio",
                "Back-end ratio",
                (payment.total() + debts) / gross_monthly * 100.0,
                Unit::Percent,
            )
            .metric(
                "search_steps",
                "Price search steps",
                outcome.iterations.len() as f64,
                Unit::Count,
            )
            .classification(DEBT_LOAD.name, debt_load, DEBT_LOAD.classify(debt_load))
            .classification(PMI_RATE.name, payment.down_pct, PMI_RATE.classify(payment.down_pct));

        if !outcome.converged {
            match outcome.iterations.last() {
                Some(last) => result.note(format!(
                    "{} Last price bracket: {:.2} to {:.2}.",
                    outcome.message, last.lower_bound, last.upper_bound
                )),
                None => result.note(outcome.message),
            };
        }

        Ok(result.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculators::testing::{assert_approx, assert_approx_tol, raw};
    use proptest::prelude::{prop_assert, proptest};

    fn payment(pairs: &[(&str, &str)]) -> Result<ResultRecord, CalcError> {
        let calc = MortgagePayment::new();
        let input = calc.validate(&raw(pairs))?;
        calc.evaluate(&input)
    }

    fn afford(pairs: &[(&str, &str)]) -> Result<ResultRecord, CalcError> {
        let calc = MortgageAffordability::new();
        let input = calc.validate(&raw(pairs))?;
        calc.evaluate(&input)
    }

    #[test]
    fn annuity_formula_matches_hand_calculation() {
        // 200k at 6% for 30 years is the textbook 1199.10
        assert_approx_tol(monthly_principal_and_interest(200_000.0, 6.0, 30), 1_199.10, 0.01);
        assert_approx(monthly_principal_and_interest(120_000.0, 0.0, 10), 1_000.0);
        assert_approx(monthly_principal_and_interest(0.0, 6.0, 30), 0.0);
    }

    #[test]
    fn schedule_pays_off_loan() {
        let rows = amortization_schedule(200_000.0, 6.0, 30);
        assert_eq!(rows.len(), 30);
        let last = rows.last().expect("rows");
        assert_approx(last.balance, 0.0);
        let principal: f64 = rows.iter().map(|r| r.principal).sum();
        assert_approx_tol(principal, 200_000.0, 1e-6);
        assert!(rows[0].interest > rows[29].interest);
        for pair in rows.windows(2) {
            assert!(pair[1].balance <= pair[0].balance);
        }
    }

    #[test]
    fn monthly_payment_breakdown_sums_to_total() {
        let result = payment(&[
            ("home_price", "300000"),
            ("down_payment", "60000"),
            ("interest_rate", "6"),
            ("property_tax_rate", "1.2"),
            ("annual_insurance", "1200"),
            ("monthly_hoa", "50"),
        ])
        .expect("valid");
        let pi = monthly_principal_and_interest(240_000.0, 6.0, 30);
        assert_approx(result.component("principal_and_interest").expect("pi").value, pi);
        assert_approx(result.component("property_tax").expect("tax").value, 300.0);
        assert_approx(result.component("insurance").expect("ins").value, 100.0);
        assert_approx(result.component("pmi").expect("pmi").value, 0.0);
        assert_approx(result.component("hoa").expect("hoa").value, 50.0);
        assert_approx(result.total, pi + 450.0);
        assert_eq!(result.total, result.component_sum());
        assert_eq!(result.classification("pmi_rate").map(|c| c.label), Some("no PMI"));
        assert_eq!(result.schedule.len(), 30);
        assert_approx(result.metric("loan_amount").expect("loan").value, 240_000.0);
    }

    #[test]
    fn small_down_payment_adds_pmi_tier() {
        let result = payment(&[
            ("home_price", "400000"),
            ("down_payment", "20000"),
            ("interest_rate", "7"),
        ])
        .expect("valid");
        assert_eq!(result.classification("pmi_rate").map(|c| c.label), Some("5-10% down"));
        assert_approx(result.component("pmi").expect("pmi").value, 380_000.0 * 0.0075 / 12.0);
        assert!(!result.notes.is_empty());
    }

    #[test]
    fn down_payment_equal_to_price_is_rejected() {
        let err = payment(&[
            ("home_price", "300000"),
            ("down_payment", "300000"),
            ("interest_rate", "6"),
        ])
        .expect_err("must reject");
        assert!(matches!(err, CalcError::Inconsistent(_)));
    }

    #[test]
    fn implausible_interest_rate_is_rejected() {
        let err = payment(&[
            ("home_price", "300000"),
            ("down_payment", "10000"),
            ("interest_rate", "40"),
        ])
        .expect_err("must reject");
        assert_eq!(err.field(), Some("interest_rate"));
    }

    #[test]
    fn affordability_fits_budget_at_solved_price() {
        let result = afford(&[
            ("annual_income", "120000"),
            ("monthly_debts", "500"),
            ("down_payment", "60000"),
            ("interest_rate", "6.5"),
        ])
        .expect("valid");
        let budget = result.metric("monthly_budget").expect("budget").value;
        assert_approx(budget, 2_800.0);
        let paid = result.metric("monthly_payment").expect("payment").value;
        assert!(paid <= budget + 1e-9);

        let terms = HousingTerms {
            interest_rate: 6.5,
            years: 30,
            property_tax_rate: 1.1,
            annual_insurance: 1_500.0,
            monthly_hoa: 0.0,
        };
        let over = terms.payment(result.total + 2.0 * PRICE_TOLERANCE, 60_000.0).total();
        assert!(over > budget);
        assert_approx(result.component("down_payment").expect("down").value, 60_000.0);
        assert_eq!(result.total, result.component_sum());
        assert_eq!(result.classification("debt_load").map(|c| c.label), Some("low"));
    }

    #[test]
    fn affordability_reports_search_steps() {
        let result = afford(&[("annual_income", "90000"), ("interest_rate", "5")]).expect("valid");
        let steps = result.metric("search_steps").expect("steps").value;
        // a $1e9 bracket narrowed to $0.50 takes about 31 halvings
        assert!((25.0..=40.0).contains(&steps), "steps = {steps}");
        assert!(result.notes.is_empty());
    }

    #[test]
    fn back_end_limit_binds_with_heavy_debts() {
        let result = afford(&[
            ("annual_income", "60000"),
            ("monthly_debts", "1200"),
            ("interest_rate", "6"),
        ])
        .expect("valid");
        // 5000 * 36% - 1200 = 600 < 5000 * 28% = 1400
        assert_approx(result.metric("monthly_budget").expect("budget").value, 600.0);
        assert_eq!(result.classification("debt_load").map(|c| c.label), Some("moderate"));
    }

    #[test]
    fn debts_beyond_limit_are_rejected() {
        let err = afford(&[
            ("annual_income", "36000"),
            ("monthly_debts", "1200"),
            ("interest_rate", "6"),
        ])
        .expect_err("must reject");
        assert!(err.to_string().contains("back-end"));
    }

    #[test]
    fn fixed_costs_above_budget_are_rejected() {
        let err = afford(&[
            ("annual_income", "12000"),
            ("interest_rate", "6"),
            ("monthly_hoa", "500"),
        ])
        .expect_err("must reject");
        assert!(err.to_string().contains("Budget"));
    }

    #[test]
    fn back_end_below_front_end_is_rejected() {
        let err = afford(&[
            ("annual_income", "90000"),
            ("interest_rate", "6"),
            ("front_end_ratio", "40"),
            ("back_end_ratio", "30"),
        ])
        .expect_err("must reject");
        assert!(matches!(err, CalcError::Inconsistent(_)));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_higher_income_never_lowers_max_price(
            income in 30_000u32..400_000,
            raise in 0u32..100_000,
            rate_bp in 0u32..1200,
            down in 0u32..200_000,
        ) {
            let rate = format!("{:.2}", rate_bp as f64 / 100.0);
            let low = afford(&[
                ("annual_income", &income.to_string()),
                ("down_payment", &down.to_string()),
                ("interest_rate", &rate),
            ]).expect("valid");
            let high = afford(&[
                ("annual_income", &(income + raise).to_string()),
                ("down_payment", &down.to_string()),
                ("interest_rate", &rate),
            ]).expect("valid");
            prop_assert!(high.total + 2.0 * PRICE_TOLERANCE >= low.total);
            prop_assert!(low.total >= down as f64);
        }
    }
}
