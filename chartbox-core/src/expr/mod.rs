use std::collections::HashMap;
use std::f64::consts;

use thiserror::Error;

mod lexer;
pub use lexer::*;

mod parser;
pub use parser::*;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("Malformed number at position {0}")]
    MalformedNumber(usize),
    #[error("Expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("Unexpected {0}")]
    UnexpectedToken(String),
    #[error("'{0}' is not a known function")]
    UnknownFunction(String),
    #[error("'{name}' expects {expected} argument(s), got {got}")]
    WrongArity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("'{0}' is not defined")]
    UnknownVariable(String),
    #[error("Factorial is only defined for non-negative integers")]
    InvalidFactorial,
    #[error("Malformed variable definition '{0}'")]
    MalformedVariable(String),
}

/// A parsed mathematical expression, ready to be evaluated against a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    ast: Ast,
}

impl Expr {
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        Ok(Self {
            ast: Parser::parse(input)?,
        })
    }

    pub fn eval(&self, scope: &Scope) -> Result<f64, ExprError> {
        eval_ast(&self.ast, scope)
    }
}

/// Named values an expression can refer to.
///
/// User variables shadow the built-in constants `pi` and `e`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: HashMap<String, f64>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied().or(match name {
            "pi" => Some(consts::PI),
            "e" => Some(consts::E),
            _ => None,
        })
    }

    /// Builds a scope from free-text `name = value` lines, one per line.
    /// Blank lines are skipped, anything else malformed is an error.
    pub fn parse(text: &str) -> Result<Self, ExprError> {
        let mut scope = Self::new();

        for line in text.lines() {
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            let malformed = || ExprError::MalformedVariable(line.to_string());

            let (name, value) = line.split_once('=').ok_or_else(malformed)?;
            let name = name.trim();

            let starts_valid = name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

            if !starts_valid || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(malformed());
            }

            let value: f64 = value.trim().parse().map_err(|_| malformed())?;
            scope.set(name, value);
        }

        Ok(scope)
    }
}

fn eval_ast(ast: &Ast, scope: &Scope) -> Result<f64, ExprError> {
    match ast {
        Ast::Number(value) => Ok(*value),
        Ast::Variable(name) => scope
            .get(name)
            .ok_or_else(|| ExprError::UnknownVariable(name.clone())),
        Ast::Unary(op, inner) => {
            let inner = eval_ast(inner, scope)?;

            match op {
                UnaryOp::Negate => Ok(-inner),
                UnaryOp::Percent => Ok(inner / 100.),
                UnaryOp::Factorial => factorial(inner),
            }
        }
        Ast::Binary(op, lhs, rhs) => {
            let lhs = eval_ast(lhs, scope)?;
            let rhs = eval_ast(rhs, scope)?;

            let value = match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Subtract => lhs - rhs,
                BinaryOp::Multiply => lhs * rhs,
                BinaryOp::Divide => lhs / rhs,
                BinaryOp::Power => lhs.powf(rhs),
            };

            Ok(value)
        }
        Ast::Call(function, args) => {
            let args: Vec<f64> = args
                .iter()
                .map(|arg| eval_ast(arg, scope))
                .collect::<Result<_, _>>()?;

            let value = match function {
                Function::Sin => args[0].sin(),
                Function::Cos => args[0].cos(),
                Function::Tan => args[0].tan(),
                Function::Asin => args[0].asin(),
                Function::Acos => args[0].acos(),
                Function::Atan => args[0].atan(),
                Function::Sqrt => args[0].sqrt(),
                Function::Abs => args[0].abs(),
                Function::Ln => args[0].ln(),
                Function::Log => args[0].log10(),
                Function::Exp => args[0].exp(),
                Function::Floor => args[0].floor(),
                Function::Ceil => args[0].ceil(),
                Function::Round => args[0].round(),
                Function::Min => args[0].min(args[1]),
                Function::Max => args[0].max(args[1]),
                Function::Pow => args[0].powf(args[1]),
            };

            Ok(value)
        }
    }
}

fn factorial(value: f64) -> Result<f64, ExprError> {
    if value < 0. || value.fract() != 0. {
        return Err(ExprError::InvalidFactorial);
    }

    let mut result = 1_f64;

    for n in 2..=(value as u64) {
        result *= n as f64;
    }

    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;

    fn eval(input: &str) -> Result<f64, ExprError> {
        Expr::parse(input)?.eval(&Scope::new())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Ok(7.));
        assert_eq!(eval("(1 + 2) * 3"), Ok(9.));
        assert_eq!(eval("2 ^ 3 ^ 2"), Ok(512.));
        assert_eq!(eval("10 / 4"), Ok(2.5));
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        assert_eq!(eval("-2 ^ 2"), Ok(-4.));
        assert_eq!(eval("2 ^ -1"), Ok(0.5));
    }

    #[test]
    fn test_postfix_operators() {
        assert_eq!(eval("5!"), Ok(120.));
        assert_eq!(eval("0!"), Ok(1.));
        assert_eq!(eval("50%"), Ok(0.5));
        assert_eq!(eval("3! + 1"), Ok(7.));
        assert_eq!(eval("(-1)!"), Err(ExprError::InvalidFactorial));
        assert_eq!(eval("2.5!"), Err(ExprError::InvalidFactorial));
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(eval("sqrt(16)"), Ok(4.));
        assert_eq!(eval("min(3, 2) + max(3, 2)"), Ok(5.));
        assert_eq!(eval("pow(2, 10)"), Ok(1024.));
        assert!((eval("sin(pi)").unwrap()).abs() < 1e-12);
        assert!((eval("ln(e)").unwrap() - 1.).abs() < 1e-12);
    }

    #[test]
    fn test_division_by_zero_is_non_finite() {
        assert_eq!(eval("1 / 0"), Ok(f64::INFINITY));
        assert!(eval("0 / 0").unwrap().is_nan());
    }

    #[test]
    fn test_variables() {
        let mut scope = Scope::new();
        scope.set("a", 2.);
        scope.set("x", 10.);

        let expr = Expr::parse("a * x + 1").unwrap();
        assert_eq!(expr.eval(&scope), Ok(21.));

        assert_eq!(
            eval("missing + 1"),
            Err(ExprError::UnknownVariable("missing".to_string()))
        );
    }

    #[test]
    fn test_variables_shadow_constants() {
        let mut scope = Scope::new();
        scope.set("pi", 3.);

        let expr = Expr::parse("pi").unwrap();
        assert_eq!(expr.eval(&scope), Ok(3.));
    }

    #[test]
    fn test_scope_parsing() {
        let scope = Scope::parse("a = 1.5\n\n  b=2\n").unwrap();

        assert_eq!(scope.get("a"), Some(1.5));
        assert_eq!(scope.get("b"), Some(2.));

        assert_eq!(
            Scope::parse("not a definition"),
            Err(ExprError::MalformedVariable("not a definition".to_string()))
        );
        assert_eq!(
            Scope::parse("2x = 4"),
            Err(ExprError::MalformedVariable("2x = 4".to_string()))
        );
    }
}
