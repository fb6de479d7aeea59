pub mod numeric;
pub mod trig;

use crate::ast::Evaluator;

pub use numeric::fact;

/// Registers every function and constant the scientific calculator accepts.
pub fn register_functions(evaluator: &mut Evaluator) {
    numeric::register(evaluator);
    trig::register(evaluator);
}
