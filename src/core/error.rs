use thiserror::Error;

use super::solver::SolveError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("unknown calculator `{0}`")]
    UnknownCalculator(String),
    #[error("`{0}` is not a field of this calculator")]
    UnknownField(String),
    #[error("{label} is required")]
    MissingField { key: String, label: String },
    #[error("{label} must be a number, got `{raw}`")]
    InvalidNumber {
        key: String,
        label: String,
        raw: String,
    },
    #[error("{label} must be between {min} and {max}")]
    OutOfRange {
        key: String,
        label: String,
        min: f64,
        max: f64,
    },
    #[error("{label} must be a whole number")]
    NotInteger { key: String, label: String },
    #[error("{label} must be one of: {allowed}")]
    InvalidChoice {
        key: String,
        label: String,
        allowed: String,
    },
    #[error("{label} must be yes or no, got `{raw}`")]
    InvalidFlag {
        key: String,
        label: String,
        raw: String,
    },
    #[error("{label} must be a date in YYYY-MM-DD form, got `{raw}`")]
    InvalidDate {
        key: String,
        label: String,
        raw: String,
    },
    #[error("{0}")]
    Inconsistent(String),
    #[error("tier table `{table}` is invalid: {reason}")]
    InvalidTierTable { table: String, reason: String },
    #[error("calculator `{0}` is registered twice")]
    DuplicateCalculator(String),
    #[error(transparent)]
    Solver(#[from] SolveError),
}

impl CalcError {
    pub(crate) fn inconsistent(msg: impl Into<String>) -> Self {
        Self::Inconsistent(msg.into())
    }

    /// The form field the error points at, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            CalcError::UnknownField(key) => Some(key),
            CalcError::MissingField { key, .. }
            | CalcError::InvalidNumber { key, .. }
            | CalcError::OutOfRange { key, .. }
            | CalcError::NotInteger { key, .. }
            | CalcError::InvalidChoice { key, .. }
            | CalcError::InvalidFlag { key, .. }
            | CalcError::InvalidDate { key, .. } => Some(key),
            _ => None,
        }
    }

    /// True when the caller supplied bad input, as opposed to a broken
    /// calculator definition.
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            CalcError::InvalidTierTable { .. }
                | CalcError::DuplicateCalculator(_)
                | CalcError::UnknownCalculator(_)
                | CalcError::Solver(_)
        )
    }
}
