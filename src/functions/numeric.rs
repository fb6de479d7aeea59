use crate::ast::Evaluator;
use crate::error::CalcError;
use std::f64::consts::{E, PI};
use unicalc_macros::builtin_fn;

/// Largest n for which n! is representable as a finite f64.
pub const MAX_FACTORIAL: f64 = 170.0;

pub fn register(evaluator: &mut Evaluator) {
    evaluator.register_function("log", log);
    evaluator.register_function("ln", ln);
    evaluator.register_function("sqrt", sqrt);
    evaluator.register_function("abs", abs);

    evaluator.register_constant("pi", PI);
    evaluator.register_constant("e", E);
}

/// Base-10 logarithm.
#[builtin_fn]
pub fn log(x: f64) -> Result<f64, CalcError> {
    Ok(x.log10())
}

#[builtin_fn]
pub fn ln(x: f64) -> Result<f64, CalcError> {
    Ok(x.ln())
}

#[builtin_fn]
pub fn sqrt(x: f64) -> Result<f64, CalcError> {
    Ok(x.sqrt())
}

#[builtin_fn]
pub fn abs(x: f64) -> Result<f64, CalcError> {
    Ok(x.abs())
}

/// Factorial of a non-negative integer. Not reachable by name from an
/// expression; the postfix `!` operator evaluates through it.
#[builtin_fn]
pub fn fact(n: f64) -> Result<f64, CalcError> {
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
        return Err(CalcError::FactorialDomain);
    }
    if n > MAX_FACTORIAL {
        return Err(CalcError::FactorialOverflow);
    }

    let mut output = 1.0;
    let mut i = 2.0;
    while i <= n {
        output *= i;
        i += 1.0;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logarithms() {
        assert_eq!(log(&[1000.0]).unwrap(), 3.0);
        assert_eq!(ln(&[1.0]).unwrap(), 0.0);
        assert!((ln(&[E]).unwrap() - 1.0).abs() < 1e-12);
        assert!(log(&[0.0]).unwrap().is_infinite());
    }

    #[test]
    fn test_sqrt_and_abs() {
        assert_eq!(sqrt(&[81.0]).unwrap(), 9.0);
        assert!(sqrt(&[-1.0]).unwrap().is_nan());
        assert_eq!(abs(&[-2.5]).unwrap(), 2.5);
    }

    #[test]
    fn test_factorial() {
        assert_eq!(fact(&[0.0]).unwrap(), 1.0);
        assert_eq!(fact(&[1.0]).unwrap(), 1.0);
        assert_eq!(fact(&[5.0]).unwrap(), 120.0);
        assert!(fact(&[170.0]).unwrap().is_finite());
    }

    #[test]
    fn test_factorial_domain() {
        assert_eq!(fact(&[-1.0]), Err(CalcError::FactorialDomain));
        assert_eq!(fact(&[2.5]), Err(CalcError::FactorialDomain));
        assert_eq!(fact(&[f64::NAN]), Err(CalcError::FactorialDomain));
        assert_eq!(fact(&[f64::INFINITY]), Err(CalcError::FactorialDomain));
        assert_eq!(fact(&[171.0]), Err(CalcError::FactorialOverflow));
    }

    #[test]
    fn test_register() {
        let mut evaluator = Evaluator::new(Default::default());
        register(&mut evaluator);
        assert_eq!(evaluator.evaluate_expression("log(100) + sqrt(9)").unwrap(), 5.0);
        assert_eq!(evaluator.evaluate_expression("abs(-pi) - pi").unwrap(), 0.0);
    }
}
