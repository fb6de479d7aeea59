mod history;
mod input;

use crate::ast::{ASTNode, AngleMode, Evaluator};
use crate::error::CalcError;
use log::debug;
use lru::LruCache;
use rayon::prelude::*;
use std::num::NonZeroUsize;

pub use history::{History, HistoryEntry, MAX_HISTORY};
pub use input::{normalize, ALLOWED_TOKENS};

/// Decimal places kept when displaying a result.
const DISPLAY_SCALE: f64 = 1e10;

/// Beyond this magnitude the scaled value has no fractional digits left.
const MAX_SAFE_SCALED: f64 = 9_007_199_254_740_992.0;

/// Evaluates a calculator expression.
///
/// # Arguments
///
/// * `expression` - Raw user input, e.g. `"sin(90) + 3!"`.
/// * `angle_mode` - Whether `sin`, `cos` and `tan` take degrees or radians.
///
/// # Returns
///
/// * `Ok(f64)` with a finite value.
/// * `Err(CalcError)` describing why the input was rejected.
pub fn evaluate(expression: &str, angle_mode: AngleMode) -> Result<f64, CalcError> {
    let evaluator = Evaluator::with_builtins(angle_mode);
    evaluate_with(&evaluator, expression)
}

fn evaluate_with(evaluator: &Evaluator, expression: &str) -> Result<f64, CalcError> {
    let normalized = normalize(expression)?;
    let ast = evaluator.parse_expression(&normalized)?;
    evaluator.evaluate_finite(&ast)
}

/// Evaluates independent expressions in parallel. Results keep input order.
pub fn evaluate_batch<S>(expressions: &[S], angle_mode: AngleMode) -> Vec<Result<f64, CalcError>>
where
    S: AsRef<str> + Sync,
{
    let evaluator = Evaluator::with_builtins(angle_mode);
    debug!("Evaluating batch of {} expressions", expressions.len());
    expressions
        .par_iter()
        .map(|expression| evaluate_with(&evaluator, expression.as_ref()))
        .collect()
}

/// Renders a result for display, rounded to 10 decimal places. Magnitudes
/// below 1e-6 or from 1e21 up print in exponent form.
pub fn format_number(value: f64) -> Result<String, CalcError> {
    if !value.is_finite() {
        return Err(CalcError::NonFiniteResult);
    }

    let scaled = (value + f64::EPSILON) * DISPLAY_SCALE;
    let rounded = if scaled.abs() < MAX_SAFE_SCALED {
        // Half rounds toward +inf.
        (scaled + 0.5).floor() / DISPLAY_SCALE
    } else {
        value
    };

    if rounded == 0.0 {
        return Ok("0".to_string());
    }

    if rounded.abs() >= 1e21 || rounded.abs() < 1e-6 {
        let text = format!("{:e}", rounded);
        return Ok(match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => text,
        });
    }

    Ok(rounded.to_string())
}

/// Stateful front end: angle mode, parse cache and result history.
pub struct Calculator {
    evaluator: Evaluator,
    cache: Option<LruCache<String, ASTNode>>,
    history: History,
}

impl Calculator {
    /// `cache_size` bounds the number of parsed expressions kept; zero
    /// disables caching.
    pub fn new(cache_size: usize) -> Self {
        Self {
            evaluator: Evaluator::with_builtins(AngleMode::default()),
            cache: NonZeroUsize::new(cache_size).map(LruCache::new),
            history: History::new(),
        }
    }

    pub fn with_mode(mut self, angle_mode: AngleMode) -> Self {
        self.set_mode(angle_mode);
        self
    }

    pub fn mode(&self) -> AngleMode {
        self.evaluator.angle_mode()
    }

    pub fn set_mode(&mut self, angle_mode: AngleMode) {
        debug!("Angle mode set to {}", angle_mode);
        self.evaluator.set_angle_mode(angle_mode);
    }

    /// Evaluates without touching the history.
    pub fn evaluate(&mut self, expression: &str) -> Result<f64, CalcError> {
        let normalized = normalize(expression)?;
        let ast = self.parse_cached(&normalized)?;
        self.evaluator.evaluate_finite(&ast)
    }

    /// Evaluates, formats, and records a successful result in the history.
    pub fn calculate(&mut self, expression: &str) -> Result<String, CalcError> {
        let value = self.evaluate(expression)?;
        let formatted = format_number(value)?;
        self.history.push(expression, &formatted);
        Ok(formatted)
    }

    fn parse_cached(&mut self, normalized: &str) -> Result<ASTNode, CalcError> {
        if let Some(cache) = self.cache.as_mut() {
            if let Some(ast) = cache.get(normalized) {
                debug!("Parse cache hit for '{}'", normalized);
                return Ok(ast.clone());
            }
        }

        let ast = self.evaluator.parse_expression(normalized)?;
        if let Some(cache) = self.cache.as_mut() {
            cache.put(normalized.to_string(), ast.clone());
        }
        Ok(ast)
    }

    pub fn cached_expressions(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Replaces the history, e.g. with one loaded from a store.
    pub fn restore_history(&mut self, history: History) {
        self.history = history;
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(evaluate("2+2", AngleMode::Deg).unwrap(), 4.0);
        assert_eq!(evaluate("2+3*4", AngleMode::Deg).unwrap(), 14.0);
        assert_eq!(evaluate("(2+3)*4", AngleMode::Deg).unwrap(), 20.0);
        assert_eq!(evaluate("2^10", AngleMode::Deg).unwrap(), 1024.0);
        assert_eq!(evaluate("-2^2", AngleMode::Deg).unwrap(), -4.0);
        assert_eq!(evaluate("7/2", AngleMode::Deg).unwrap(), 3.5);
    }

    #[test]
    fn test_trig_modes() {
        assert_close(evaluate("sin(90)", AngleMode::Deg).unwrap(), 1.0);
        assert_close(evaluate("cos(180)", AngleMode::Deg).unwrap(), -1.0);
        assert_close(evaluate("sin(pi/2)", AngleMode::Rad).unwrap(), 1.0);
        assert_close(evaluate("sin(π/2)", AngleMode::Rad).unwrap(), 1.0);
        assert_close(evaluate("tan(45)", AngleMode::Deg).unwrap(), 1.0);
    }

    #[test]
    fn test_logs_and_constants() {
        assert_close(evaluate("log(1000)", AngleMode::Deg).unwrap(), 3.0);
        assert_close(evaluate("ln(e)", AngleMode::Deg).unwrap(), 1.0);
        assert_close(evaluate("sqrt(2)^2", AngleMode::Deg).unwrap(), 2.0);
        assert_close(evaluate("abs(-3.5)", AngleMode::Deg).unwrap(), 3.5);
    }

    #[test]
    fn test_factorial_and_percent() {
        assert_eq!(evaluate("3!", AngleMode::Deg).unwrap(), 6.0);
        assert_eq!(evaluate("(2+2)!", AngleMode::Deg).unwrap(), 24.0);
        assert_eq!(evaluate("-3!", AngleMode::Deg).unwrap(), -6.0);
        assert_eq!(evaluate("2^3!", AngleMode::Deg).unwrap(), 64.0);
        assert_eq!(evaluate("5%", AngleMode::Deg).unwrap(), 0.05);
        assert_eq!(evaluate("200*5%", AngleMode::Deg).unwrap(), 10.0);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(evaluate("", AngleMode::Deg), Err(CalcError::EmptyExpression));
        assert_eq!(
            evaluate("foo(1)", AngleMode::Deg),
            Err(CalcError::UnknownToken("foo".to_string()))
        );
        assert_eq!(evaluate("171!", AngleMode::Deg), Err(CalcError::FactorialOverflow));
        assert_eq!(evaluate("2.5!", AngleMode::Deg), Err(CalcError::FactorialDomain));
        assert_eq!(evaluate("pi!", AngleMode::Deg), Err(CalcError::UnsupportedFactorial));
        assert_eq!(evaluate("1/0", AngleMode::Deg), Err(CalcError::InvalidResult));
        assert_eq!(evaluate("sqrt(-1)", AngleMode::Deg), Err(CalcError::InvalidResult));
        assert_eq!(evaluate("log(0)", AngleMode::Deg), Err(CalcError::InvalidResult));
        assert_eq!(evaluate("1 $ 2", AngleMode::Deg), Err(CalcError::UnsupportedCharacters));
        assert!(matches!(evaluate("sqrt(1,2)", AngleMode::Deg), Err(CalcError::Arity { .. })));
        assert!(matches!(evaluate("(1+2", AngleMode::Deg), Err(CalcError::Syntax(_))));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0).unwrap(), "4");
        assert_eq!(format_number(0.1 + 0.2).unwrap(), "0.3");
        assert_eq!(format_number(1.0 / 3.0).unwrap(), "0.3333333333");
        assert_eq!(format_number(-2.5).unwrap(), "-2.5");
        assert_eq!(format_number(1e-12).unwrap(), "0");
        assert_eq!(format_number(-1e-12).unwrap(), "0");
        assert_eq!(format_number(1e21).unwrap(), "1e+21");
        assert_eq!(format_number(f64::NAN), Err(CalcError::NonFiniteResult));
        assert_eq!(format_number(f64::INFINITY), Err(CalcError::NonFiniteResult));
    }

    #[test]
    fn test_format_small_magnitudes() {
        assert_eq!(format_number(1.5e-7).unwrap(), "1.5e-7");
        assert_eq!(format_number(-2e-10).unwrap(), "-2e-10");
        assert_eq!(format_number(1e-6).unwrap(), "0.000001");
        assert_eq!(format_number(0.00012).unwrap(), "0.00012");
    }

    #[test]
    fn test_sin_180_formats_as_zero() {
        let value = evaluate("sin(180)", AngleMode::Deg).unwrap();
        assert_eq!(format_number(value).unwrap(), "0");
    }

    #[test]
    fn test_calculator_history() {
        let mut calculator = Calculator::new(10);
        assert_eq!(calculator.calculate("1 + 1").unwrap(), "2");
        assert!(calculator.calculate("1 +").is_err());
        assert_eq!(calculator.calculate("10 / 4").unwrap(), "2.5");

        let entries = calculator.history().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].expression, "10 / 4");
        assert_eq!(entries[0].result, "2.5");

        calculator.clear_history();
        assert!(calculator.history().is_empty());
    }

    #[test]
    fn test_calculator_mode() {
        let mut calculator = Calculator::default().with_mode(AngleMode::Rad);
        assert_eq!(calculator.mode(), AngleMode::Rad);
        assert_eq!(calculator.calculate("cos(0)").unwrap(), "1");
        assert_eq!(calculator.calculate("sin(pi)").unwrap(), "0");

        calculator.set_mode(AngleMode::Deg);
        assert_eq!(calculator.calculate("sin(30)").unwrap(), "0.5");
    }

    #[test]
    fn test_parse_cache() {
        let mut calculator = Calculator::new(2);
        calculator.evaluate("1+1").unwrap();
        calculator.evaluate(" 1 + 1 ").unwrap();
        assert_eq!(calculator.cached_expressions(), 1);
        calculator.evaluate("2+2").unwrap();
        calculator.evaluate("3+3").unwrap();
        assert_eq!(calculator.cached_expressions(), 2);

        let mut uncached = Calculator::new(0);
        assert_eq!(uncached.evaluate("2*3").unwrap(), 6.0);
        assert_eq!(uncached.cached_expressions(), 0);
    }

    #[test]
    fn test_evaluate_batch_keeps_order() {
        let expressions = ["1+1", "foo", "3!", "sin(90)"];
        let results = evaluate_batch(&expressions, AngleMode::Deg);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0], Ok(2.0));
        assert!(results[1].is_err());
        assert_eq!(results[2], Ok(6.0));
        assert_close(*results[3].as_ref().unwrap(), 1.0);
    }
}
