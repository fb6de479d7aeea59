use crate::ast::{ASTNode, AngleMode, Parser};
use crate::error::CalcError;
use crate::functions;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;

pub type Function = Arc<dyn Fn(&[f64]) -> Result<f64, CalcError> + Send + Sync>;

#[derive(Clone)]
struct Builtin {
    function: Function,
    /// Arguments are angles and get converted according to the angle mode.
    angular: bool,
}

/// Tree-walking evaluator over a closed set of functions and constants.
///
/// Nothing outside the registry is reachable from an expression.
#[derive(Clone)]
pub struct Evaluator {
    functions: HashMap<String, Builtin>,
    constants: HashMap<String, f64>,
    angle_mode: AngleMode,
}

impl Evaluator {
    /// Creates an evaluator with an empty registry.
    pub fn new(angle_mode: AngleMode) -> Self {
        Self {
            functions: HashMap::new(),
            constants: HashMap::new(),
            angle_mode,
        }
    }

    /// Creates an evaluator with the calculator's functions and constants.
    pub fn with_builtins(angle_mode: AngleMode) -> Self {
        let mut evaluator = Self::new(angle_mode);
        functions::register_functions(&mut evaluator);
        evaluator
    }

    pub fn angle_mode(&self) -> AngleMode {
        self.angle_mode
    }

    pub fn set_angle_mode(&mut self, angle_mode: AngleMode) {
        self.angle_mode = angle_mode;
    }

    /// Parse an expression string into an AST.
    pub fn parse_expression(&self, expression: &str) -> Result<ASTNode, CalcError> {
        Parser::parse_expression(expression)
    }

    /// Parses and evaluates `expression` in one step.
    ///
    /// No input normalisation happens here; see [`crate::scientific::evaluate`]
    /// for the user-facing entry point.
    pub fn evaluate_expression(&self, expression: &str) -> Result<f64, CalcError> {
        let ast = self.parse_expression(expression)?;
        self.evaluate(&ast)
    }

    /// Registers a function with the evaluator.
    pub fn register_function<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[f64]) -> Result<f64, CalcError> + Send + Sync + 'static,
    {
        self.insert_function(name, Arc::new(function), false);
    }

    /// Registers a function whose arguments are angles in the current mode.
    /// The function itself always receives radians.
    pub fn register_angular_function<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[f64]) -> Result<f64, CalcError> + Send + Sync + 'static,
    {
        self.insert_function(name, Arc::new(function), true);
    }

    fn insert_function(&mut self, name: &str, function: Function, angular: bool) {
        self.functions
            .insert(name.to_string(), Builtin { function, angular });
    }

    pub fn register_constant(&mut self, name: &str, value: f64) {
        self.constants.insert(name.to_string(), value);
    }

    /// Whether `name` is a registered function or constant.
    pub fn is_known(&self, name: &str) -> bool {
        self.functions.contains_key(name) || self.constants.contains_key(name)
    }

    /// Evaluates an `ASTNode`.
    pub fn evaluate(&self, ast: &ASTNode) -> Result<f64, CalcError> {
        let result = match ast {
            ASTNode::Number(n) => *n,

            ASTNode::Constant(name) => self
                .constants
                .get(name)
                .copied()
                .ok_or_else(|| CalcError::UnknownToken(name.clone()))?,

            ASTNode::UnaryOperation { operator, operand } => {
                operator.apply(self.evaluate(operand)?)
            }

            ASTNode::BinaryOperation {
                left,
                operator,
                right,
            } => {
                let left_value = self.evaluate(left)?;
                let right_value = self.evaluate(right)?;
                operator.apply(left_value, right_value)
            }

            ASTNode::Factorial(inner) => functions::fact(&[self.evaluate(inner)?])?,

            ASTNode::Percent(inner) => self.evaluate(inner)? / 100.0,

            ASTNode::Group(inner) => self.evaluate(inner)?,

            ASTNode::FunctionCall { name, args } => {
                let builtin = self
                    .functions
                    .get(name)
                    .ok_or_else(|| CalcError::UnknownToken(name.clone()))?;

                let mut values = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                if builtin.angular {
                    for value in values.iter_mut() {
                        *value = self.angle_mode.to_radians(*value);
                    }
                }

                let value = (builtin.function)(&values)?;
                trace!("{}({:?}) = {}", name, values, value);
                value
            }
        };

        Ok(result)
    }

    /// Evaluates a tree and rejects NaN and infinities.
    pub fn evaluate_finite(&self, ast: &ASTNode) -> Result<f64, CalcError> {
        let value = self.evaluate(ast)?;
        if !value.is_finite() {
            debug!("Rejecting non-finite result {}", value);
            return Err(CalcError::InvalidResult);
        }
        Ok(value)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::with_builtins(AngleMode::default())
    }
}
