use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveConfig {
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub feasible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveOutcome {
    pub solved_value: Option<f64>,
    pub iterations: Vec<SolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("search bounds must be finite")]
    NonFiniteBounds,
    #[error("search_max must be greater than search_min")]
    EmptyRange,
    #[error("tolerance must be > 0")]
    InvalidTolerance,
    #[error("max_iterations must be > 0")]
    NoIterations,
}

/// Finds the largest value in `[search_min, search_max]` for which
/// `feasible` holds. `feasible` must be true up to some point and false after.
pub fn solve_max_feasible<F>(
    config: SolveConfig,
    mut feasible: F,
) -> Result<SolveOutcome, SolveError>
where
    F: FnMut(f64) -> bool,
{
    validate_config(config)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);

    if !feasible(config.search_min) {
        return Ok(SolveOutcome {
            solved_value: None,
            iterations,
            converged: false,
            feasible: false,
            message: "No feasible value found within the search bounds.".to_string(),
        });
    }
    if feasible(config.search_max) {
        return Ok(SolveOutcome {
            solved_value: Some(config.search_max),
            iterations,
            converged: true,
            feasible: true,
            message: "Upper search bound is still feasible.".to_string(),
        });
    }

    let mut lo = config.search_min;
    let mut hi = config.search_max;
    let mut converged = false;
    let mut it = 0;
    while it < config.max_iterations {
        it += 1;
        let mid = (lo + hi) * 0.5;
        let ok = feasible(mid);
        iterations.push(SolveIteration {
            iteration: it,
            lower_bound: lo,
            upper_bound: hi,
            candidate_value: mid,
            feasible: ok,
        });

        if ok {
            lo = mid;
        } else {
            hi = mid;
        }

        if (hi - lo).abs() <= config.tolerance {
            converged = true;
            break;
        }
    }

    let message = if converged {
        "Solved maximum feasible value.".to_string()
    } else {
        "Reached max iterations before tolerance was met; returning best estimate.".to_string()
    };

    Ok(SolveOutcome {
        solved_value: Some(lo),
        iterations,
        converged,
        feasible: true,
        message,
    })
}

fn validate_config(config: SolveConfig) -> Result<(), SolveError> {
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(SolveError::NonFiniteBounds);
    }
    if config.search_max <= config.search_min {
        return Err(SolveError::EmptyRange);
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::InvalidTolerance);
    }
    if config.max_iterations == 0 {
        return Err(SolveError::NoIterations);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn config(min: f64, max: f64) -> SolveConfig {
        SolveConfig {
            search_min: min,
            search_max: max,
            tolerance: 0.01,
            max_iterations: 64,
        }
    }

    #[test]
    fn finds_threshold_of_step_predicate() {
        let outcome = solve_max_feasible(config(0.0, 1_000.0), |x| x <= 321.5).expect("must solve");
        assert!(outcome.feasible);
        assert!(outcome.converged);
        let value = outcome.solved_value.expect("value expected");
        assert!(value <= 321.5);
        assert_close(value, 321.5, 0.01);
        assert!(!outcome.iterations.is_empty());
    }

    #[test]
    fn reports_infeasible_when_lower_bound_fails() {
        let outcome = solve_max_feasible(config(10.0, 20.0), |x| x < 5.0).expect("must return");
        assert!(!outcome.feasible);
        assert!(outcome.solved_value.is_none());
        assert!(outcome.iterations.is_empty());
    }

    #[test]
    fn returns_upper_bound_when_everything_is_feasible() {
        let outcome = solve_max_feasible(config(0.0, 50.0), |_| true).expect("must return");
        assert_eq!(outcome.solved_value, Some(50.0));
        assert!(outcome.converged);
    }

    #[test]
    fn stops_at_iteration_cap() {
        let cfg = SolveConfig {
            search_min: 0.0,
            search_max: 1.0e9,
            tolerance: 1.0e-9,
            max_iterations: 3,
        };
        let outcome = solve_max_feasible(cfg, |x| x <= 12_345.0).expect("must return");
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations.len(), 3);
        assert!(outcome.solved_value.expect("estimate expected") <= 12_345.0);
    }

    #[test]
    fn rejects_bad_config() {
        assert_eq!(
            solve_max_feasible(config(5.0, 5.0), |_| true),
            Err(SolveError::EmptyRange)
        );
        assert_eq!(
            solve_max_feasible(config(f64::NAN, 5.0), |_| true),
            Err(SolveError::NonFiniteBounds)
        );
        let mut cfg = config(0.0, 1.0);
        cfg.tolerance = 0.0;
        assert_eq!(
            solve_max_feasible(cfg, |_| true),
            Err(SolveError::InvalidTolerance)
        );
        cfg.tolerance = 0.1;
        cfg.max_iterations = 0;
        assert_eq!(
            solve_max_feasible(cfg, |_| true),
            Err(SolveError::NoIterations)
        );
    }
}
