use crate::core::engine::Calculator;
use crate::core::error::CalcError;
use crate::core::schema::{CalculatorSchema, FieldSpec};
use crate::core::tiers::{Tier, TierScan, TierTable};
use crate::core::types::{InputRecord, ResultBuilder, ResultRecord, Unit};

/// Ceiling for each of the four sub-scores.
pub const COMPONENT_MAX: f64 = 2.375;
const SCALE: f64 = 100.0 / 6.0;

pub const PERFECT_RATING: f64 = 4.0 * COMPONENT_MAX * SCALE;

const RATING_TIERS: &[Tier] = &[
    Tier::new(158.3, "perfect", 5.0),
    Tier::new(100.0, "excellent", 4.0),
    Tier::new(90.0, "good", 3.0),
    Tier::new(80.0, "average", 2.0),
    Tier::new(70.0, "below average", 1.0),
];

pub static RATING_BAND: TierTable =
    TierTable::new("rating_band", TierScan::AtLeast, RATING_TIERS, "poor", 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub completion: f64,
    pub yards: f64,
    pub touchdown: f64,
    pub interception: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassingLine {
    pub attempts: f64,
    pub completions: f64,
    pub yards: f64,
    pub touchdowns: f64,
    pub interceptions: f64,
}

impl PassingLine {
    /// Unclamped sub-scores. `attempts` must be positive.
    pub fn raw_scores(&self) -> SubScores {
        let att = self.attempts;
        SubScores {
            completion: (self.completions / att - 0.3) * 5.0,
            yards: (self.yards / att - 3.0) * 0.25,
            touchdown: self.touchdowns / att * 20.0,
            interception: COMPONENT_MAX - self.interceptions / att * 25.0,
        }
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, COMPONENT_MAX)
}

pub struct PasserRating {
    schema: CalculatorSchema,
}

impl PasserRating {
    pub fn new() -> Self {
        Self {
            schema: CalculatorSchema {
                slug: "nfl-passer-rating",
                name: "NFL Passer Rating Calculator",
                summary: "Compute the NFL passer rating from a passing stat line.",
                fields: vec![
                    FieldSpec::integer("attempts", "Pass attempts", 1.0, 10_000.0),
                    FieldSpec::integer("completions", "Completions", 0.0, 10_000.0),
                    FieldSpec::integer("yards", "Passing yards", -10_000.0, 100_000.0),
                    FieldSpec::integer("touchdowns", "Touchdown passes", 0.0, 10_000.0),
                    FieldSpec::integer("interceptions", "Interceptions", 0.0, 10_000.0),
                ],
            },
        }
    }

    fn line(input: &InputRecord) -> Result<PassingLine, CalcError> {
        Ok(PassingLine {
            attempts: input.number("attempts")?,
            completions: input.number("completions")?,
            yards: input.number("yards")?,
            touchdowns: input.number("touchdowns")?,
            interceptions: input.number("interceptions")?,
        })
    }
}

impl Default for PasserRating {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for PasserRating {
    fn schema(&self) -> &CalculatorSchema {
        &self.schema
    }

    fn tier_tables(&self) -> Vec<&'static TierTable> {
        vec![&RATING_BAND]
    }

    fn check(&self, input: &InputRecord) -> Result<(), CalcError> {
        let line = Self::line(input)?;
        if line.attempts <= 0.0 {
            return Err(CalcError::inconsistent("Pass attempts must be greater than zero"));
        }
        if line.completions > line.attempts {
            return Err(CalcError::inconsistent("Completions cannot exceed attempts"));
        }
        if line.touchdowns > line.completions {
            return Err(CalcError::inconsistent("Touchdown passes cannot exceed completions"));
        }
        if line.interceptions > line.attempts - line.completions {
            return Err(CalcError::inconsistent(
                "Interceptions cannot exceed incomplete passes",
            ));
        }
        Ok(())
    }

    fn evaluate(&self, input: &InputRecord) -> Result<ResultRecord, CalcError> {
        let line = Self::line(input)?;
        if line.attempts <= 0.0 {
            return Err(CalcError::inconsistent("Pass attempts must be greater than zero"));
        }
        let raw = line.raw_scores();

        let mut result = ResultBuilder::new("Passer rating", Unit::Points);
        let parts = [
            ("completion_score", "Completion percentage", raw.completion),
            ("yards_score", "Yards per attempt", raw.yards),
            ("touchdown_score", "Touchdown rate", raw.touchdown),
            ("interception_score", "Interception rate", raw.interception),
        ];
        for (key, label, score) in parts {
            let clamped = clamp_score(score);
            if clamped != score {
                result.note(format!(
                    "{label} sub-score {score:.3} clamped to {clamped:.3}"
                ));
            }
            result.component(key, label, clamped * SCALE);
        }

        let rating = result.subtotal();
        result
            .classification(RATING_BAND.name, rating, RATING_BAND.classify(rating))
            .metric(
                "completion_pct",
                "Completion percentage",
                line.completions / line.attempts * 100.0,
                Unit::Percent,
            )
            .metric(
                "yards_per_attempt",
                "Yards per attempt",
                line.yards / line.attempts,
                Unit::Points,
            );

        Ok(result.build())
    }
}
