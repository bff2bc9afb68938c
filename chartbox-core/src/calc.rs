use thiserror::Error;

use crate::{Expr, ExprError, Scope};

/// The outcome of evaluating calculator input.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub value: f64,
    /// The result as shown in the calculator display.
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error("Result is not a finite number")]
    NonFinite,
}

/// Evaluates free-text calculator input.
///
/// The calculator has no `x`, so expressions are evaluated against an empty
/// scope. Non-finite results (division by zero, log of a negative) are
/// errors here rather than discarded, since there is no curve to fall back on.
pub fn calculate(input: &str) -> Result<Calculation, CalcError> {
    let value = Expr::parse(input)?.eval(&Scope::new())?;

    if !value.is_finite() {
        return Err(CalcError::NonFinite);
    }

    Ok(Calculation {
        value,
        formatted: format_result(value),
    })
}

/// Rounds away float noise and renders integers without a decimal point.
fn format_result(value: f64) -> String {
    let rounded = (value * 1e10).round() / 1e10;

    if rounded.fract() == 0. && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(calculate("2 + 2").unwrap().formatted, "4");
        assert_eq!(calculate("10 / 4").unwrap().formatted, "2.5");
        assert_eq!(calculate("7!").unwrap().formatted, "5040");
    }

    #[test]
    fn test_rounds_float_noise() {
        assert_eq!(calculate("0.1 + 0.2").unwrap().formatted, "0.3");
    }

    #[test]
    fn test_scientific_functions() {
        assert_eq!(calculate("sqrt(2) ^ 2").unwrap().formatted, "2");
        assert_eq!(calculate("log(1000)").unwrap().formatted, "3");
        assert_eq!(calculate("cos(0)").unwrap().formatted, "1");
    }

    #[test]
    fn test_non_finite_results_are_errors() {
        assert_eq!(calculate("1 / 0"), Err(CalcError::NonFinite));
        assert_eq!(calculate("ln(0 - 1)"), Err(CalcError::NonFinite));
    }

    #[test]
    fn test_syntax_errors_propagate() {
        assert!(matches!(
            calculate("2 +"),
            Err(CalcError::Expr(ExprError::UnexpectedEnd))
        ));
    }
}
