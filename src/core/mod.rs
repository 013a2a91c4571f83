mod engine;
mod error;
mod present;
mod schema;
mod session;
mod solver;
mod tiers;
mod types;

pub mod calculators;

pub use engine::{Calculator, CalculatorRegistry, RegistryBuilder};
pub use error::CalcError;
pub use present::{Line, Presentation, format_value};
pub use schema::{CalculatorSchema, ChoiceOption, FieldKind, FieldSpec};
pub use session::{FormSession, PanelState};
pub use solver::{SolveConfig, SolveError, SolveIteration, SolveOutcome, solve_max_feasible};
pub use tiers::{Band, Fallback, Tier, TierMatch, TierScan, TierTable};
pub use types::{
    Calculation, Classification, Component, FieldValue, InputRecord, Metric, RawInput,
    ResultBuilder, ResultRecord, ScheduleRow, Unit,
};
