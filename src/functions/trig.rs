use crate::ast::Evaluator;
use crate::error::CalcError;
use unicalc_macros::builtin_fn;

pub fn register(evaluator: &mut Evaluator) {
    evaluator.register_angular_function("sin", sin);
    evaluator.register_angular_function("cos", cos);
    evaluator.register_angular_function("tan", tan);
}

#[builtin_fn]
pub fn sin(x: f64) -> Result<f64, CalcError> {
    Ok(x.sin())
}

#[builtin_fn]
pub fn cos(x: f64) -> Result<f64, CalcError> {
    Ok(x.cos())
}

#[builtin_fn]
pub fn tan(x: f64) -> Result<f64, CalcError> {
    Ok(x.tan())
}
