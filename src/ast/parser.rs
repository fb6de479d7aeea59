use crate::ast::{ASTNode, Operator, UnaryOperator};
use crate::error::CalcError;
use log::{debug, trace};
use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "ast/expression.pest"]
pub struct ExpressionParser;

/// Upper bound on the nodes of one expression tree. Evaluation and drop both
/// recurse over the tree, so its size is capped before it is built.
pub const MAX_TREE_NODES: usize = 1000;

/// Deepest combination of open groups and `^` chains accepted. The grammar
/// recurses once per level, so this is checked before pest sees the input.
pub const MAX_NESTING_DEPTH: usize = 64;

impl ExpressionParser {
    pub fn parse_expression(input: &str) -> Result<ASTNode, CalcError> {
        debug!("Parsing expression: {}", input);
        if nesting_depth(input) > MAX_NESTING_DEPTH {
            return Err(CalcError::Syntax("Expression is nested too deeply".to_string()));
        }
        let parse_result = ExpressionParser::parse(Rule::expression, input)
            .map_err(|e| syntax_error(input, e))?
            .next()
            .ok_or_else(|| CalcError::Syntax("Failed to parse expression".to_string()))?;

        trace!("Parse result: {:#?}", parse_result);
        let mut pairs = parse_result.into_inner();
        let mut builder = TreeBuilder::new(MAX_TREE_NODES);
        let ast = builder.build_sum(next_pair(&mut pairs, "an expression")?)?;
        debug!("Built expression tree with {} nodes", ast.size());
        Ok(ast)
    }
}

fn nesting_depth(input: &str) -> usize {
    let mut open = 0usize;
    let mut deepest = 0usize;
    let mut carets = 0usize;
    for c in input.chars() {
        match c {
            '(' => {
                open += 1;
                deepest = deepest.max(open);
            }
            ')' => open = open.saturating_sub(1),
            '^' => carets += 1,
            _ => {}
        }
    }
    deepest + carets
}

/// Turns pest pairs into an `ASTNode`, spending one unit of budget per node.
struct TreeBuilder {
    remaining: usize,
}

impl TreeBuilder {
    fn new(max_nodes: usize) -> Self {
        Self {
            remaining: max_nodes,
        }
    }

    fn node(&mut self, node: ASTNode) -> Result<ASTNode, CalcError> {
        if self.remaining == 0 {
            return Err(CalcError::Syntax("Expression is too long".to_string()));
        }
        self.remaining -= 1;
        Ok(node)
    }

    fn build_sum(&mut self, pair: Pair<Rule>) -> Result<ASTNode, CalcError> {
        let mut pairs = pair.into_inner();
        let mut node = self.build_product(next_pair(&mut pairs, "a term")?)?;

        while let Some(operator_pair) = pairs.next() {
            let operator = Operator::try_from(operator_pair.as_str()).map_err(CalcError::Syntax)?;
            let right = self.build_product(next_pair(&mut pairs, "a right operand")?)?;
            node = self.node(ASTNode::BinaryOperation {
                left: Box::new(node),
                operator,
                right: Box::new(right),
            })?;
        }

        Ok(node)
    }

    fn build_product(&mut self, pair: Pair<Rule>) -> Result<ASTNode, CalcError> {
        let mut pairs = pair.into_inner();
        let mut node = self.build_unary(next_pair(&mut pairs, "a factor")?)?;

        while let Some(operator_pair) = pairs.next() {
            let operator = Operator::try_from(operator_pair.as_str()).map_err(CalcError::Syntax)?;
            let right = self.build_unary(next_pair(&mut pairs, "a right operand")?)?;
            node = self.node(ASTNode::BinaryOperation {
                left: Box::new(node),
                operator,
                right: Box::new(right),
            })?;
        }

        Ok(node)
    }

    /// A run of signs collapses to its net effect: at most one negation.
    fn build_unary(&mut self, pair: Pair<Rule>) -> Result<ASTNode, CalcError> {
        let mut negated = false;
        let mut operand = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::PLUS => {}
                Rule::MINUS => negated = !negated,
                Rule::power => operand = Some(self.build_power(inner)?),
                rule => return Err(unexpected_rule(rule, "unary expression")),
            }
        }

        let node = operand.ok_or_else(|| CalcError::Syntax("Expected an operand".to_string()))?;
        if !negated {
            return Ok(node);
        }
        self.node(ASTNode::UnaryOperation {
            operator: UnaryOperator::Negate,
            operand: Box::new(node),
        })
    }

    fn build_power(&mut self, pair: Pair<Rule>) -> Result<ASTNode, CalcError> {
        let mut pairs = pair.into_inner();
        let base = self.build_postfix(next_pair(&mut pairs, "a base")?)?;

        match pairs.next() {
            None => Ok(base),
            Some(caret) if caret.as_rule() == Rule::CARET => {
                let exponent = self.build_unary(next_pair(&mut pairs, "an exponent")?)?;
                self.node(ASTNode::BinaryOperation {
                    left: Box::new(base),
                    operator: Operator::Power,
                    right: Box::new(exponent),
                })
            }
            Some(other) => Err(unexpected_rule(other.as_rule(), "power expression")),
        }
    }

    fn build_postfix(&mut self, pair: Pair<Rule>) -> Result<ASTNode, CalcError> {
        let mut pairs = pair.into_inner();
        let mut node = self.build_primary(next_pair(&mut pairs, "an operand")?)?;

        for operator_pair in pairs {
            node = match operator_pair.as_rule() {
                Rule::BANG => match node {
                    ASTNode::Number(_) | ASTNode::Group(_) => {
                        self.node(ASTNode::Factorial(Box::new(node)))?
                    }
                    _ => return Err(CalcError::UnsupportedFactorial),
                },
                Rule::PERCENT => match node {
                    ASTNode::Number(_) => self.node(ASTNode::Percent(Box::new(node)))?,
                    _ => return Err(CalcError::UnsupportedPercent),
                },
                rule => return Err(unexpected_rule(rule, "postfix expression")),
            };
        }

        Ok(node)
    }

    fn build_primary(&mut self, pair: Pair<Rule>) -> Result<ASTNode, CalcError> {
        trace!("Building primary expression: {:?}", pair);
        match pair.as_rule() {
            Rule::number => {
                let text = pair.as_str();
                let value = text
                    .parse::<f64>()
                    .map_err(|e| CalcError::Syntax(format!("Invalid number '{}': {}", text, e)))?;
                self.node(ASTNode::Number(value))
            }
            Rule::identifier => self.node(ASTNode::Constant(pair.as_str().to_string())),
            Rule::group => {
                let inner = next_pair(&mut pair.into_inner(), "a grouped expression")?;
                let sum = self.build_sum(inner)?;
                self.node(ASTNode::Group(Box::new(sum)))
            }
            Rule::function_call => self.build_function_call(pair),
            rule => Err(unexpected_rule(rule, "primary expression")),
        }
    }

    fn build_function_call(&mut self, pair: Pair<Rule>) -> Result<ASTNode, CalcError> {
        let mut inner = pair.into_inner();
        let name = next_pair(&mut inner, "a function name")?.as_str().to_string();
        let args = next_pair(&mut inner, "function arguments")?
            .into_inner()
            .map(|arg| self.build_sum(arg))
            .collect::<Result<Vec<_>, _>>()?;
        self.node(ASTNode::FunctionCall { name, args })
    }
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, expected: &str) -> Result<Pair<'i, Rule>, CalcError> {
    pairs
        .next()
        .ok_or_else(|| CalcError::Syntax(format!("Expected {}", expected)))
}

fn unexpected_rule(rule: Rule, context: &str) -> CalcError {
    CalcError::Syntax(format!("Unexpected {:?} in {}", rule, context))
}

/// A stray `!` or `%` is reported as a placement problem rather than a
/// generic syntax error.
fn syntax_error(input: &str, error: pest::error::Error<Rule>) -> CalcError {
    let position = match error.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };

    match input.get(position..).and_then(|rest| rest.chars().next()) {
        Some('!') => CalcError::UnsupportedFactorial,
        Some('%') => CalcError::UnsupportedPercent,
        _ => CalcError::Syntax(error.variant.message().to_string()),
    }
}
