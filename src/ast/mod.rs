use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod evaluator;
mod parser;

pub use evaluator::{Evaluator, Function};
pub use parser::ExpressionParser as Parser;

#[derive(Debug, Clone, PartialEq)]
pub enum ASTNode {
    Number(f64),
    /// A named constant such as `pi`, resolved by the evaluator.
    Constant(String),
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<ASTNode>,
    },
    BinaryOperation {
        left: Box<ASTNode>,
        operator: Operator,
        right: Box<ASTNode>,
    },
    Factorial(Box<ASTNode>),
    Percent(Box<ASTNode>),
    Group(Box<ASTNode>),
    FunctionCall {
        name: String,
        args: Vec<ASTNode>,
    },
}

impl ASTNode {
    /// Number of nodes in the tree, used for debug logging.
    pub fn size(&self) -> usize {
        match self {
            ASTNode::Number(_) | ASTNode::Constant(_) => 1,
            ASTNode::UnaryOperation { operand, .. } => 1 + operand.size(),
            ASTNode::BinaryOperation { left, right, .. } => 1 + left.size() + right.size(),
            ASTNode::Factorial(inner) | ASTNode::Percent(inner) | ASTNode::Group(inner) => {
                1 + inner.size()
            }
            ASTNode::FunctionCall { args, .. } => 1 + args.iter().map(ASTNode::size).sum::<usize>(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl Operator {
    /// IEEE semantics throughout: division by zero yields an infinity and is
    /// rejected only if it survives to the final result.
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => left / right,
            Operator::Power => left.powf(right),
        }
    }
}

impl TryFrom<&str> for Operator {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            "^" => Ok(Operator::Power),
            _ => Err(format!("Unknown operator: {}", value)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Negate,
}

impl UnaryOperator {
    pub fn apply(&self, operand: f64) -> f64 {
        match self {
            UnaryOperator::Plus => operand,
            UnaryOperator::Negate => -operand,
        }
    }
}

/// How trigonometric functions interpret their argument.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AngleMode {
    #[default]
    #[serde(rename = "DEG")]
    Deg,
    #[serde(rename = "RAD")]
    Rad,
}

impl AngleMode {
    pub fn to_radians(&self, angle: f64) -> f64 {
        match self {
            AngleMode::Deg => angle.to_radians(),
            AngleMode::Rad => angle,
        }
    }
}

impl fmt::Display for AngleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AngleMode::Deg => write!(f, "DEG"),
            AngleMode::Rad => write!(f, "RAD"),
        }
    }
}

impl FromStr for AngleMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEG" => Ok(AngleMode::Deg),
            "RAD" => Ok(AngleMode::Rad),
            _ => Err(format!("Unknown angle mode: {} (expected DEG or RAD)", value)),
        }
    }
}
