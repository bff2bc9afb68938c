use thiserror::Error;

use crate::{Expr, ExprError, Scope};

/// The amount of points an expression is evaluated at when plotted.
pub const CURVE_SAMPLES: usize = 100;

/// A single plottable point of a sampled expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("Invalid range: min {0} must be less than max {1}")]
    InvalidRange(f64, f64),
    #[error("Expression produced no plottable points")]
    NoPoints,
    #[error(transparent)]
    Expr(#[from] ExprError),
}

/// Evaluates `expr` at [CURVE_SAMPLES] uniform steps across the inclusive
/// range, binding `x` at every step. Points that evaluate to a non-finite
/// value are discarded, and a curve with no surviving points is an error.
pub fn sample_curve(
    expr: &Expr,
    scope: &Scope,
    x_min: f64,
    x_max: f64,
) -> Result<Vec<SampledPoint>, SampleError> {
    if !(x_min.is_finite() && x_max.is_finite() && x_min < x_max) {
        return Err(SampleError::InvalidRange(x_min, x_max));
    }

    let step = (x_max - x_min) / (CURVE_SAMPLES - 1) as f64;
    let mut points = Vec::with_capacity(CURVE_SAMPLES);

    for i in 0..CURVE_SAMPLES {
        let x = x_min + step * i as f64;

        let mut scope = scope.clone();
        scope.set("x", x);

        let y = match expr.eval(&scope) {
            Ok(y) => y,
            // Point-local domain errors skip the point, like non-finite values
            Err(ExprError::InvalidFactorial) => continue,
            Err(e) => return Err(e.into()),
        };

        if y.is_finite() {
            points.push(SampledPoint { x, y });
        }
    }

    if points.is_empty() {
        return Err(SampleError::NoPoints);
    }

    Ok(points)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_samples_uniformly() {
        let expr = Expr::parse("x * 2").unwrap();
        let points = sample_curve(&expr, &Scope::new(), 0., 99.).unwrap();

        assert_eq!(points.len(), CURVE_SAMPLES);
        assert_eq!(points[0].x, 0.);
        assert_eq!(points[0].y, 0.);
        assert_eq!(points[1].x, 1.);
        assert_eq!(points[CURVE_SAMPLES - 1].x, 99.);
        assert_eq!(points[CURVE_SAMPLES - 1].y, 198.);
    }

    #[test]
    fn test_discards_non_finite_points() {
        let expr = Expr::parse("1 / x").unwrap();
        let points = sample_curve(&expr, &Scope::new(), 0., 1.).unwrap();

        // x = 0 is the first step and divides to infinity
        assert_eq!(points.len(), CURVE_SAMPLES - 1);
        assert!(points.iter().all(|p| p.y.is_finite()));
    }

    #[test]
    fn test_uses_scope_variables() {
        let expr = Expr::parse("a * x").unwrap();
        let scope = Scope::parse("a = 3").unwrap();

        let points = sample_curve(&expr, &scope, 0., 1.).unwrap();
        assert!((points[CURVE_SAMPLES - 1].y - 3.).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_range() {
        let expr = Expr::parse("x").unwrap();

        assert_eq!(
            sample_curve(&expr, &Scope::new(), 1., 1.),
            Err(SampleError::InvalidRange(1., 1.))
        );
    }

    #[test]
    fn test_all_points_unplottable() {
        let expr = Expr::parse("sqrt(0 - 1 - x * 0)").unwrap();

        assert_eq!(
            sample_curve(&expr, &Scope::new(), 0., 1.),
            Err(SampleError::NoPoints)
        );
    }

    #[test]
    fn test_unknown_variable_is_an_error() {
        let expr = Expr::parse("x + oops").unwrap();

        assert_eq!(
            sample_curve(&expr, &Scope::new(), 0., 1.),
            Err(SampleError::Expr(ExprError::UnknownVariable(
                "oops".to_string()
            )))
        );
    }
}
